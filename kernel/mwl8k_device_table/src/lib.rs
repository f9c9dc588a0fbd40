//! Static capability table for Marvell TOPDOG (mwl8k) wireless devices.
//!
//! Device bring-up looks its PCI identity up here once, before firmware
//! load, and learns everything chipset-specific it needs: which
//! receive-descriptor layout the ring manager must instantiate and how
//! large one descriptor record is, which two firmware blobs the firmware
//! loader must fetch, and which interface modes the part supports.
//!
//! All entries are built at compile time and are immutable for the
//! process lifetime. Lookups are exact vendor/device matches; a PCI
//! identity appearing in more than one entry is a configuration error,
//! which the tests assert against.

#![no_std]

use core::fmt;
use core::mem::size_of;

use ieee80211::InterfaceMode;
use log::debug;
use mwl8k_descriptors::{Mwl8366RxDescriptor, Mwl8687RxDescriptor};

/// Marvell's PCI vendor identifier.
pub const PCI_VENDOR_ID_MARVELL: u16 = 0x11ab;

/// A PCI vendor/device identity pair, as read from config space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PciId {
    pub vendor: u16,
    pub device: u16,
}

impl PciId {
    pub const fn new(vendor: u16, device: u16) -> PciId {
        PciId { vendor, device }
    }
}

impl fmt::Display for PciId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor, self.device)
    }
}

/// The receive-descriptor layout a chipset uses.
///
/// This is resolved exactly once, at capability lookup; the ring manager
/// then instantiates its descriptor array with the matching codec type
/// and never branches on the chipset again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RxDescriptorType {
    /// [`Mwl8366RxDescriptor`]
    Mwl8366,
    /// [`Mwl8687RxDescriptor`]
    Mwl8687,
}

impl RxDescriptorType {
    /// Size in bytes of one on-bus descriptor record of this layout,
    /// used by the ring manager to size its DMA allocation.
    pub fn descriptor_size(&self) -> usize {
        match self {
            RxDescriptorType::Mwl8366 => size_of::<Mwl8366RxDescriptor>(),
            RxDescriptorType::Mwl8687 => size_of::<Mwl8687RxDescriptor>(),
        }
    }
}

/// Everything chipset-specific that device bring-up needs to know,
/// static for the process lifetime.
#[derive(Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Marketing name of the chipset.
    pub part_name: &'static str,
    /// Firmware blob holding the helper image, loaded first.
    pub helper_image: &'static str,
    /// Firmware blob holding the main firmware image.
    pub fw_image: &'static str,
    /// The receive-descriptor layout this chipset uses.
    pub rxd_type: RxDescriptorType,
    /// Interface modes the firmware supports.
    pub modes: InterfaceMode,
    /// The PCI identities this entry matches.
    pub pci_ids: &'static [PciId],
}

/// Errors returned by capability-table lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The given identity does not match any supported chipset.
    /// Fatal to device attach.
    UnsupportedDevice,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Error::UnsupportedDevice => "unsupported device",
        })
    }
}

static DEVICES: [DeviceInfo; 2] = [
    DeviceInfo {
        part_name: "88w8687",
        helper_image: "mwl8k/helper_8687.fw",
        fw_image: "mwl8k/fmimage_8687.fw",
        rxd_type: RxDescriptorType::Mwl8687,
        modes: InterfaceMode::STATION,
        pci_ids: &[
            PciId::new(PCI_VENDOR_ID_MARVELL, 0x2a2b),
            PciId::new(PCI_VENDOR_ID_MARVELL, 0x2a30),
        ],
    },
    DeviceInfo {
        // Station operation is not yet supported by the 8366 firmware,
        // so its mode mask is empty.
        part_name: "88w8366",
        helper_image: "mwl8k/helper_8366.fw",
        fw_image: "mwl8k/fmimage_8366.fw",
        rxd_type: RxDescriptorType::Mwl8366,
        modes: InterfaceMode::empty(),
        pci_ids: &[PciId::new(PCI_VENDOR_ID_MARVELL, 0x2a40)],
    },
];

/// Returns the capability entry matching the given PCI identity,
/// or [`Error::UnsupportedDevice`] if no entry matches it exactly.
pub fn device_info(id: PciId) -> Result<&'static DeviceInfo, Error> {
    for info in &DEVICES {
        if info.pci_ids.contains(&id) {
            debug!("PCI {} is a {}", id, info.part_name);
            return Ok(info);
        }
    }
    debug!("no capability entry for PCI {}", id);
    Err(Error::UnsupportedDevice)
}


#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn known_identities_resolve_to_their_parts() {
        for device in [0x2a2b, 0x2a30] {
            let info = device_info(PciId::new(PCI_VENDOR_ID_MARVELL, device)).unwrap();
            assert_eq!(info.part_name, "88w8687");
            assert_eq!(info.rxd_type, RxDescriptorType::Mwl8687);
            assert!(info.modes.contains(InterfaceMode::STATION));
        }

        let info = device_info(PciId::new(PCI_VENDOR_ID_MARVELL, 0x2a40)).unwrap();
        assert_eq!(info.part_name, "88w8366");
        assert_eq!(info.rxd_type, RxDescriptorType::Mwl8366);
        assert!(info.modes.is_empty());
    }

    #[test]
    fn unknown_identities_are_unsupported() {
        assert_eq!(
            device_info(PciId::new(PCI_VENDOR_ID_MARVELL, 0x2a41)),
            Err(Error::UnsupportedDevice)
        );
        // Same device code under the wrong vendor must not match.
        assert_eq!(
            device_info(PciId::new(0x8086, 0x2a2b)),
            Err(Error::UnsupportedDevice)
        );
    }

    #[test]
    fn descriptor_sizes_match_the_wire_formats() {
        assert_eq!(RxDescriptorType::Mwl8366.descriptor_size(), 32);
        assert_eq!(RxDescriptorType::Mwl8687.descriptor_size(), 40);
    }

    #[test]
    fn pci_identities_are_unique_across_entries() {
        let mut all = Vec::new();
        for info in &DEVICES {
            all.extend_from_slice(info.pci_ids);
        }
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn every_entry_names_both_firmware_blobs() {
        for info in &DEVICES {
            assert!(info.helper_image.starts_with("mwl8k/"));
            assert!(info.fw_image.starts_with("mwl8k/"));
        }
    }
}
