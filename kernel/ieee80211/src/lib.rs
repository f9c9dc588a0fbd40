//! Chipset-independent 802.11 definitions shared by wireless NIC drivers.
//!
//! This crate holds the pieces of the receive path that do not depend on any
//! particular chipset's descriptor layout: the legacy rate table, the 2.4 GHz
//! channel-to-frequency mapping, and [`RxStatus`], the decoded per-packet
//! receive status that descriptor codecs produce for higher layers.

#![no_std]

use bitflags::bitflags;

/// Radio bands a frame can be received on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    /// The 2.4 GHz ISM band, channels 1 through 14.
    TwoGhz,
}

/// One entry in the legacy (non-HT) rate table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rate {
    /// Bitrate in units of 100 kbit/s.
    pub bitrate: u16,
    /// The rate code the hardware uses to report this rate.
    pub hw_value: u8,
}

/// The legacy rates supported by this hardware family, in table order:
/// the four CCK rates (plus 22 Mbit/s PBCC) followed by the eight OFDM rates.
///
/// [`RxStatus::rate_index`] indexes into this table for non-HT frames.
/// Hardware rate codes are unique across the table; see the uniqueness test.
pub static RATES: [Rate; 13] = [
    Rate { bitrate: 10,  hw_value: 2 },
    Rate { bitrate: 20,  hw_value: 4 },
    Rate { bitrate: 55,  hw_value: 11 },
    Rate { bitrate: 110, hw_value: 22 },
    Rate { bitrate: 220, hw_value: 44 },
    Rate { bitrate: 60,  hw_value: 12 },
    Rate { bitrate: 90,  hw_value: 18 },
    Rate { bitrate: 120, hw_value: 24 },
    Rate { bitrate: 180, hw_value: 36 },
    Rate { bitrate: 240, hw_value: 48 },
    Rate { bitrate: 360, hw_value: 72 },
    Rate { bitrate: 480, hw_value: 96 },
    Rate { bitrate: 540, hw_value: 108 },
];

/// Returns the index into [`RATES`] of the entry with the given hardware
/// rate code, or `None` if no entry matches.
///
/// Rate codes are unique per entry, so the first match is the only match.
pub fn rate_index(hw_value: u8) -> Option<usize> {
    RATES.iter().position(|rate| rate.hw_value == hw_value)
}

/// Converts a 2.4 GHz channel number into its center frequency in MHz.
///
/// Channels 1 through 13 are spaced 5 MHz apart starting at 2412 MHz;
/// channel 14 sits apart at 2484 MHz. Returns `None` for any other
/// channel number.
pub fn channel_to_frequency(channel: u8) -> Option<u16> {
    match channel {
        1..=13 => Some(2407 + 5 * channel as u16),
        14 => Some(2484),
        _ => None,
    }
}

bitflags! {
    /// Modulation, bandwidth, and preamble properties of a received frame.
    pub struct RxFlags: u16 {
        /// The frame was sent with a short preamble.
        const SHORT_PREAMBLE = 1 << 0;
        /// The frame was received on a 40 MHz wide channel.
        const FORTY_MHZ      = 1 << 1;
        /// The frame used a short guard interval.
        const SHORT_GI       = 1 << 2;
        /// The frame was HT (802.11n) modulated; `rate_index` is then
        /// an MCS index rather than an index into [`RATES`].
        const HT             = 1 << 3;
    }
}

bitflags! {
    /// Interface operating modes a chipset's firmware can run.
    /// Bit positions match the nl80211 interface type numbering.
    pub struct InterfaceMode: u16 {
        const AD_HOC  = 1 << 1;
        const STATION = 1 << 2;
        const AP      = 1 << 3;
        const MONITOR = 1 << 6;
    }
}

/// Chipset-independent description of one completed receive.
///
/// A descriptor codec fills this in from the raw descriptor fields once the
/// device has handed the descriptor back to the host. The record is built
/// fresh per decode, is owned by the caller, and never aliases descriptor
/// memory. Fields the chipset does not report keep their `Default` values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RxStatus {
    /// Received signal strength in dBm (sign-inverted raw RSSI byte).
    pub signal: i16,
    /// Noise floor in dBm (sign-inverted raw noise byte).
    pub noise: i16,
    /// Link quality metric, if the chipset reports one.
    pub link_quality: Option<u8>,
    /// Receive antenna index, if the chipset reports one.
    pub antenna: Option<u8>,
    /// For HT frames, the MCS index; otherwise an index into [`RATES`].
    pub rate_index: u8,
    /// Modulation, bandwidth, and guard-interval flags.
    pub flags: RxFlags,
    /// The band the frame was received on.
    pub band: Band,
    /// Center frequency in MHz of the receive channel,
    /// or 0 if the hardware reported an out-of-range channel number.
    pub frequency: u16,
}

impl Default for RxStatus {
    fn default() -> RxStatus {
        RxStatus {
            signal: 0,
            noise: 0,
            link_quality: None,
            antenna: None,
            rate_index: 0,
            flags: RxFlags::empty(),
            band: Band::TwoGhz,
            frequency: 0,
        }
    }
}
