//! Receive-descriptor codecs for Marvell TOPDOG (mwl8k) wireless chipsets.
//!
//! A receive descriptor is a small fixed-size record in DMA-shared memory
//! describing one packet buffer: where it is, how long it is, and who may
//! currently touch it. The host allocates a ring of these records, chains
//! them through their `next` pointer fields once at construction, and then
//! trades each one back and forth with the device through an in-band
//! ownership byte. There is no lock; the ownership byte *is* the
//! synchronization primitive.
//!
//! The protocol per descriptor is:
//!
//! 1. [`RxDescriptor::init`] — at ring construction, write the `next`
//!    pointer and mark the descriptor host-owned.
//! 2. [`RxDescriptor::refill`] — write the packet buffer's address and
//!    length, then hand the descriptor to the device. A release fence
//!    orders the field writes before the ownership transfer.
//! 3. The device DMAs a received packet into the buffer, fills in the
//!    status fields, and hands the descriptor back by restoring the
//!    host-owned marking.
//! 4. [`RxDescriptor::process`] — observe the ownership byte. While the
//!    descriptor is device-owned, return [`NotReady`] without reading
//!    anything else; the device may still be writing. Once it is
//!    host-owned again, an acquire fence orders the ownership observation
//!    before the field reads, and the codec decodes the chipset-specific
//!    status fields into a chipset-independent [`RxStatus`].
//!
//! `process` deliberately does not reset ownership: the ring manager
//! re-queues the descriptor with `refill` after it has copied the packet
//! out of the buffer.
//!
//! The two supported chipset families use the same protocol but different
//! byte layouts; [`Mwl8366RxDescriptor`] and [`Mwl8687RxDescriptor`] each
//! implement the [`RxDescriptor`] trait, so the ring manager is generic
//! over the layout and contains no per-chipset branching.

#![no_std]

mod rxd_8366;
mod rxd_8687;

pub use rxd_8366::Mwl8366RxDescriptor;
pub use rxd_8687::Mwl8687RxDescriptor;

use core::fmt;
use ieee80211::RxStatus;

/// Returned by [`RxDescriptor::process`] while the descriptor is still
/// owned by the device.
///
/// This is the expected result of polling an empty ring slot, not a
/// failure: it simply means "nothing to harvest here yet, try again
/// later". Callers decide the retry cadence; the codec never retries
/// internally and never logs this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotReady;

impl fmt::Display for NotReady {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("descriptor is still owned by the device")
    }
}

/// The operations every TOPDOG receive-descriptor layout supports.
///
/// The ring manager invokes these on descriptors living in DMA-shared
/// memory. Calls for a given descriptor are serialized by the ownership
/// protocol itself: the host only writes to a host-owned descriptor, and
/// only the flag transition transfers that right to or from the device.
pub trait RxDescriptor {
    /// Writes the physical address of the next descriptor in the ring
    /// and marks this descriptor host-owned.
    ///
    /// Called exactly once per descriptor at ring construction; the
    /// `next` field is never touched again afterwards. The packet length
    /// and buffer address fields are left undefined until [`refill`].
    ///
    /// [`refill`]: RxDescriptor::refill
    fn init(&mut self, next_rxd_phys_addr: u32);

    /// Attaches a packet buffer to this descriptor and hands it to the
    /// device.
    ///
    /// The buffer address and length are written first, then a release
    /// fence guarantees the device cannot observe the ownership transfer
    /// before those fields. After this call returns, the device may DMA
    /// into the buffer at any time.
    ///
    /// The caller must only refill a descriptor it currently owns; the
    /// codec does not check.
    fn refill(&mut self, buffer_phys_addr: u32, buffer_len: u16);

    /// Harvests a completed receive, if the device has handed this
    /// descriptor back.
    ///
    /// Returns [`NotReady`] without touching any other field while the
    /// descriptor is device-owned. Otherwise decodes the status fields
    /// into an [`RxStatus`] and returns it along with the packet length
    /// the device recorded. Ownership is left as-is; the ring manager
    /// re-queues the descriptor via [`refill`] once it has consumed the
    /// packet.
    ///
    /// [`refill`]: RxDescriptor::refill
    fn process(&self) -> Result<(RxStatus, u16), NotReady>;
}
