//! Receive descriptor layout of the 88w8687 chipset family.

use core::fmt;
use core::mem::size_of;
use core::sync::atomic::{fence, Ordering};

use ieee80211::{channel_to_frequency, RxFlags, RxStatus};
use static_assertions::const_assert_eq;
use volatile::{ReadOnly, Volatile};

use crate::{NotReady, RxDescriptor};

/// Bit of `rx_ctrl` that is set while the host owns the descriptor.
/// Cleared by `refill` on hand-off; restored by the device on completion.
const RX_CTRL_OWNED_BY_HOST: u8 = 0x02;

// Layout of the 16-bit `rate_info` status field: antenna select in the
// low two bits, the rate index in bits 9:4, modulation flags above that.
// Bits 3:2 and 14:13 are reserved.
const RATE_INFO_SHORTPRE: u16 = 0x8000;
const RATE_INFO_40MHZ: u16 = 0x1000;
const RATE_INFO_SHORTGI: u16 = 0x0800;
const RATE_INFO_MCS_FORMAT: u16 = 0x0400;

fn rate_info_rate_id(rate_info: u16) -> u8 {
    ((rate_info >> 4) & 0x3f) as u8
}

fn rate_info_antenna(rate_info: u16) -> u8 {
    (rate_info & 0x3) as u8
}

/// The 40-byte receive descriptor of 88w8687-based devices.
///
/// Field order, widths, and little-endian byte order are fixed by the
/// hardware; this struct must match it byte for byte. The host writes
/// `pkt_len`, `pkt_phys_addr`, `next_rxd_phys_addr`, and `rx_ctrl`; every
/// other field is filled in by the device while it owns the descriptor.
///
/// Unlike the 8366 layout, this one reports link quality and carries all
/// rate, antenna, and modulation information in the single `rate_info`
/// word rather than in a standalone rate byte.
#[repr(C)]
pub struct Mwl8687RxDescriptor {
    /// Buffer length when queued by the host; actual packet length once
    /// the device completes the descriptor.
    pub pkt_len: Volatile<u16>,
    /// Link quality metric; reported as-is in `RxStatus::link_quality`.
    pub link_quality: ReadOnly<u8>,
    /// Noise magnitude; decoded sign-inverted into `RxStatus::noise`.
    pub noise_level: ReadOnly<u8>,
    /// Physical address of the packet buffer.
    pub pkt_phys_addr: Volatile<u32>,
    /// Physical address of the next descriptor in the ring.
    /// Written once at ring construction and never mutated afterwards.
    pub next_rxd_phys_addr: Volatile<u32>,
    /// QoS control field of the received frame, unused by the decode.
    pub qos_control: ReadOnly<u16>,
    /// Rate, antenna, and modulation information; see the `RATE_INFO_*`
    /// constants.
    pub rate_info: ReadOnly<u16>,
    pub pad0: [u32; 4],
    /// Signal strength magnitude; decoded sign-inverted into `RxStatus::signal`.
    pub rssi: ReadOnly<u8>,
    /// 2.4 GHz channel number the frame was received on.
    pub channel: ReadOnly<u8>,
    pub pad1: u16,
    /// Ownership and control byte; see [`RX_CTRL_OWNED_BY_HOST`].
    pub rx_ctrl: Volatile<u8>,
    pub rx_status: ReadOnly<u8>,
    pub pad2: [u8; 2],
}

const_assert_eq!(size_of::<Mwl8687RxDescriptor>(), 40);

impl RxDescriptor for Mwl8687RxDescriptor {
    fn init(&mut self, next_rxd_phys_addr: u32) {
        self.next_rxd_phys_addr.write(next_rxd_phys_addr.to_le());
        self.rx_ctrl.write(RX_CTRL_OWNED_BY_HOST);
    }

    fn refill(&mut self, buffer_phys_addr: u32, buffer_len: u16) {
        self.pkt_len.write(buffer_len.to_le());
        self.pkt_phys_addr.write(buffer_phys_addr.to_le());
        // The device must not observe the ownership transfer below
        // before the address and length writes above.
        fence(Ordering::Release);
        self.rx_ctrl.write(0);
    }

    fn process(&self) -> Result<(RxStatus, u16), NotReady> {
        if self.rx_ctrl.read() & RX_CTRL_OWNED_BY_HOST == 0 {
            return Err(NotReady);
        }
        // No status-field read may move before the ownership check above.
        fence(Ordering::Acquire);

        let rate_info = u16::from_le(self.rate_info.read());

        let mut flags = RxFlags::empty();
        if rate_info & RATE_INFO_SHORTPRE != 0 {
            flags |= RxFlags::SHORT_PREAMBLE;
        }
        if rate_info & RATE_INFO_40MHZ != 0 {
            flags |= RxFlags::FORTY_MHZ;
        }
        if rate_info & RATE_INFO_SHORTGI != 0 {
            flags |= RxFlags::SHORT_GI;
        }
        if rate_info & RATE_INFO_MCS_FORMAT != 0 {
            flags |= RxFlags::HT;
        }

        let status = RxStatus {
            signal: -(self.rssi.read() as i16),
            noise: -(self.noise_level.read() as i16),
            link_quality: Some(self.link_quality.read()),
            antenna: Some(rate_info_antenna(rate_info)),
            rate_index: rate_info_rate_id(rate_info),
            flags,
            frequency: channel_to_frequency(self.channel.read()).unwrap_or(0),
            ..RxStatus::default()
        };

        Ok((status, u16::from_le(self.pkt_len.read())))
    }
}

impl fmt::Debug for Mwl8687RxDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{len: {}, buf: {:#X}, next: {:#X}, rate_info: {:#X}, channel: {}, rx_ctrl: {:#X}}}",
            u16::from_le(self.pkt_len.read()),
            u32::from_le(self.pkt_phys_addr.read()),
            u32::from_le(self.next_rxd_phys_addr.read()),
            u16::from_le(self.rate_info.read()),
            self.channel.read(),
            self.rx_ctrl.read(),
        )
    }
}
