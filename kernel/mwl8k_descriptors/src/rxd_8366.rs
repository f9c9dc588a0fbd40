//! Receive descriptor layout of the 88w8366 chipset family.

use core::fmt;
use core::mem::size_of;
use core::sync::atomic::{fence, Ordering};

use ieee80211::{channel_to_frequency, rate_index, RxFlags, RxStatus};
use static_assertions::const_assert_eq;
use volatile::{ReadOnly, Volatile};

use crate::{NotReady, RxDescriptor};

/// Bit of `rx_ctrl` that is set while the host owns the descriptor.
/// Cleared by `refill` on hand-off; restored by the device on completion.
const RX_CTRL_OWNED_BY_HOST: u8 = 0x80;

/// Top bit of the `rate` byte. When set, the frame was HT modulated and
/// the low seven bits carry the MCS index directly; when clear, the byte
/// is a legacy hardware rate code to be looked up in the rate table.
const RATE_HT_FORMAT: u8 = 0x80;

/// The 32-byte receive descriptor of 88w8366-based devices.
///
/// Field order, widths, and little-endian byte order are fixed by the
/// hardware; this struct must match it byte for byte. The host writes
/// `pkt_len`, `pkt_phys_addr`, `next_rxd_phys_addr`, and `rx_ctrl`; every
/// other field is filled in by the device while it owns the descriptor.
#[repr(C)]
pub struct Mwl8366RxDescriptor {
    /// Buffer length when queued by the host; actual packet length once
    /// the device completes the descriptor.
    pub pkt_len: Volatile<u16>,
    /// Secondary signal-quality metric, unused by the decode.
    pub sq2: ReadOnly<u8>,
    /// Rate byte; see [`RATE_HT_FORMAT`].
    pub rate: ReadOnly<u8>,
    /// Physical address of the packet buffer.
    pub pkt_phys_addr: Volatile<u32>,
    /// Physical address of the next descriptor in the ring.
    /// Written once at ring construction and never mutated afterwards.
    pub next_rxd_phys_addr: Volatile<u32>,
    /// QoS control field of the received frame, unused by the decode.
    pub qos_control: ReadOnly<u16>,
    /// HT-SIG2 bits of the received frame, unused by the decode.
    pub htsig2: ReadOnly<u16>,
    /// Raw per-chain RSSI information, unused by the decode.
    pub hw_rssi_info: ReadOnly<u32>,
    /// Raw per-chain noise-floor information, unused by the decode.
    pub hw_noise_floor_info: ReadOnly<u32>,
    /// Noise floor magnitude; decoded sign-inverted into `RxStatus::noise`.
    pub noise_floor: ReadOnly<u8>,
    pub pad0: [u8; 3],
    /// Signal strength magnitude; decoded sign-inverted into `RxStatus::signal`.
    pub rssi: ReadOnly<u8>,
    pub rx_status: ReadOnly<u8>,
    /// 2.4 GHz channel number the frame was received on.
    pub channel: ReadOnly<u8>,
    /// Ownership and control byte; see [`RX_CTRL_OWNED_BY_HOST`].
    pub rx_ctrl: Volatile<u8>,
}

const_assert_eq!(size_of::<Mwl8366RxDescriptor>(), 32);

impl RxDescriptor for Mwl8366RxDescriptor {
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

        let rate = self.rate.read();
        let (rate_idx, flags) = if rate & RATE_HT_FORMAT != 0 {
            (rate & 0x7f, RxFlags::HT)
        } else {
            // Unknown legacy rate codes degrade to index 0 rather than
            // failing the decode.
            let index = rate_index(rate).unwrap_or(0);
            (index as u8, RxFlags::empty())
        };

        let status = RxStatus {
            signal: -(self.rssi.read() as i16),
            noise: -(self.noise_floor.read() as i16),
            rate_index: rate_idx,
            flags,
            frequency: channel_to_frequency(self.channel.read()).unwrap_or(0),
            ..RxStatus::default()
        };

        Ok((status, u16::from_le(self.pkt_len.read())))
    }
}

impl fmt::Debug for Mwl8366RxDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{len: {}, buf: {:#X}, next: {:#X}, rate: {:#X}, channel: {}, rx_ctrl: {:#X}}}",
            u16::from_le(self.pkt_len.read()),
            u32::from_le(self.pkt_phys_addr.read()),
            u32::from_le(self.next_rxd_phys_addr.read()),
            self.rate.read(),
            self.channel.read(),
            self.rx_ctrl.read(),
        )
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use core::ptr::addr_of;

    #[repr(C, align(4))]
    struct DescriptorMemory([u8; 32]);

    impl DescriptorMemory {
        fn zeroed() -> DescriptorMemory {
            DescriptorMemory([0; 32])
        }

        fn rxd(&mut self) -> &mut Mwl8366RxDescriptor {
            unsafe { &mut *(self.0.as_mut_ptr() as *mut Mwl8366RxDescriptor) }
        }
    }

    #[test]
    fn field_offsets_match_the_hardware_layout() {
        let mem = DescriptorMemory::zeroed();
        let rxd = unsafe { &*(mem.0.as_ptr() as *const Mwl8366RxDescriptor) };
        let base = rxd as *const _ as usize;

        assert_eq!(addr_of!(rxd.pkt_len) as usize - base, 0);
        assert_eq!(addr_of!(rxd.sq2) as usize - base, 2);
        assert_eq!(addr_of!(rxd.rate) as usize - base, 3);
        assert_eq!(addr_of!(rxd.pkt_phys_addr) as usize - base, 4);
        assert_eq!(addr_of!(rxd.next_rxd_phys_addr) as usize - base, 8);
        assert_eq!(addr_of!(rxd.qos_control) as usize - base, 12);
        assert_eq!(addr_of!(rxd.htsig2) as usize - base, 14);
        assert_eq!(addr_of!(rxd.hw_rssi_info) as usize - base, 16);
        assert_eq!(addr_of!(rxd.hw_noise_floor_info) as usize - base, 20);
        assert_eq!(addr_of!(rxd.noise_floor) as usize - base, 24);
        assert_eq!(addr_of!(rxd.rssi) as usize - base, 28);
        assert_eq!(addr_of!(rxd.rx_status) as usize - base, 29);
        assert_eq!(addr_of!(rxd.channel) as usize - base, 30);
        assert_eq!(addr_of!(rxd.rx_ctrl) as usize - base, 31);
    }

    #[test]
    fn init_writes_next_pointer_and_takes_host_ownership() {
        let mut mem = DescriptorMemory::zeroed();
        mem.rxd().init(0x1234_5678);

        assert_eq!(mem.0[8..12], [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(mem.0[31], 0x80);
        // Nothing else was touched.
        assert_eq!(mem.0[0..8], [0; 8]);
        assert_eq!(mem.0[12..31], [0; 19]);
    }

    #[test]
    fn refill_writes_buffer_fields_then_releases_ownership() {
        let mut mem = DescriptorMemory::zeroed();
        mem.rxd().init(0x1000);
        mem.rxd().refill(0xdead_bee0, 1500);

        assert_eq!(mem.0[0..2], [0xdc, 0x05]);
        assert_eq!(mem.0[4..8], [0xe0, 0xbe, 0xad, 0xde]);
        assert_eq!(mem.0[31], 0);
    }

    #[test]
    fn process_is_not_ready_while_device_owned_and_mutates_nothing() {
        let mut mem = DescriptorMemory::zeroed();
        mem.rxd().init(0x1000);
        mem.rxd().refill(0x2000, 2048);

        let snapshot = mem.0;
        for _ in 0..3 {
            assert_eq!(mem.rxd().process(), Err(NotReady));
            assert_eq!(mem.0, snapshot);
        }
    }

    #[test]
    fn ownership_round_trip_decodes_the_completed_receive() {
        let mut mem = DescriptorMemory::zeroed();
        mem.rxd().init(0x1000);
        mem.rxd().refill(0x0004_2000, 2048);

        // Device completes the receive: 98 bytes at 11 Mbit/s on channel 6.
        mem.0[0..2].copy_from_slice(&98u16.to_le_bytes());
        mem.0[3] = 11;
        mem.0[24] = 0x60; // noise floor magnitude
        mem.0[28] = 0x2c; // rssi magnitude
        mem.0[30] = 6;
        mem.0[31] = 0x80;

        let (status, len) = mem.rxd().process().unwrap();
        assert_eq!(len, 98);
        assert_eq!(status.signal, -0x2c);
        assert_eq!(status.noise, -0x60);
        assert_eq!(status.rate_index, 2);
        assert!(status.flags.is_empty());
        assert_eq!(status.frequency, 2437);
        assert_eq!(status.link_quality, None);
        assert_eq!(status.antenna, None);

        // The buffer address survived the round trip untouched.
        assert_eq!(mem.0[4..8], [0x00, 0x20, 0x04, 0x00]);
        // Ownership is left for the ring manager to reset via refill.
        assert_eq!(mem.0[31], 0x80);
    }

    #[test]
    fn ht_rate_byte_uses_low_seven_bits_directly() {
        let mut mem = DescriptorMemory::zeroed();
        mem.rxd().init(0x1000);
        mem.rxd().refill(0x2000, 2048);
        mem.0[3] = RATE_HT_FORMAT | 5;
        mem.0[31] = 0x80;

        let (status, _len) = mem.rxd().process().unwrap();
        assert_eq!(status.rate_index, 5);
        assert_eq!(status.flags, RxFlags::HT);
    }

    #[test]
    fn every_legacy_rate_code_selects_its_table_index() {
        for (i, rate) in ieee80211::RATES.iter().enumerate() {
            let mut mem = DescriptorMemory::zeroed();
            mem.rxd().init(0x1000);
            mem.rxd().refill(0x2000, 2048);
            mem.0[3] = rate.hw_value;
            mem.0[31] = 0x80;

            let (status, _len) = mem.rxd().process().unwrap();
            assert_eq!(status.rate_index, i as u8);
            assert!(status.flags.is_empty());
        }
    }

    #[test]
    fn unmatched_rate_code_degrades_to_index_zero() {
        let mut mem = DescriptorMemory::zeroed();
        mem.rxd().init(0x1000);
        mem.rxd().refill(0x2000, 2048);
        mem.0[3] = 3; // no such legacy rate code
        mem.0[31] = 0x80;

        let (status, _len) = mem.rxd().process().unwrap();
        assert_eq!(status.rate_index, 0);
        assert!(status.flags.is_empty());
    }

    #[test]
    fn sign_inversion_is_exact_for_the_full_byte_range() {
        for raw in [0u8, 1, 0x7f, 0x80, 0xff] {
            let mut mem = DescriptorMemory::zeroed();
            mem.rxd().init(0x1000);
            mem.rxd().refill(0x2000, 2048);
            mem.0[24] = raw;
            mem.0[28] = raw;
            mem.0[31] = 0x80;

            let (status, _len) = mem.rxd().process().unwrap();
            assert_eq!(status.signal, -(raw as i16));
            assert_eq!(status.noise, -(raw as i16));
        }
    }
}
