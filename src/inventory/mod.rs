//! Virtual Hardware Inventory
//!
//! Pure classification over the flat device list the virtualization platform
//! returns for one virtual machine. Nothing here performs I/O: callers hand in
//! an already-fetched [`DeviceSnapshot`] and get sorted, typed views back.
//!
//! # Architecture
//!
//! ```text
//!                       ┌──────────────────┐
//!   DeviceSnapshot ───▶ │   DeviceIndex    │
//!                       └────────┬─────────┘
//!            ┌───────────────────┼────────────────────┐
//!            ▼                   ▼                    ▼
//!   ┌─────────────────┐ ┌─────────────────┐ ┌──────────────────┐
//!   │   Controller    │ │  Disk attribute │ │ Network adapter  │
//!   │   classifier    │ │     reader      │ │     reader       │
//!   └─────────────────┘ └─────────────────┘ └──────────────────┘
//! ```
//!
//! # Bus numbering
//!
//! Controllers carry no explicit bus number in the snapshot. Within each
//! [`ControllerKind`], controllers are sorted by device key and the Nth one is
//! bus N. Only buses below the caller's [`ScanDepth`] are examined for
//! classification and disk enumeration. Network adapters are never bounded
//! by scan depth.
//!
//! # Example
//!
//! ```
//! use vminventory::inventory::{classify, read_disks, Device, DeviceSnapshot};
//!
//! # fn example(devices: Vec<Device>) -> vminventory::Result<()> {
//! let snapshot = DeviceSnapshot::new("vm-1001", devices);
//! let classification = classify(&snapshot, 1)?;
//! let disks = read_disks(&snapshot, 1)?;
//!
//! println!("scsi_type={} disks={}", classification.bus_type, disks.len());
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod disk;
pub mod index;
pub mod network;

#[cfg(test)]
mod proptest;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use controller::{
    classify, classify_controllers, classify_kind, BusClassification, BusSharing, BusType,
    Classification, ControllerKind, ScsiSubType,
};
pub use disk::{disk_attributes, read_disks, read_disks_kind, DiskBacking, DiskRecord};
pub use index::{ControllerSlot, DeviceIndex};
pub use network::{
    network_adapters, read_network_adapter_types, read_network_adapters, AdapterType,
    NetworkAdapterInfo, NetworkAdapterRecord, NetworkBacking,
};

// =============================================================================
// Scan Depth
// =============================================================================

/// Number of controller buses examined per controller kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanDepth(usize);

impl ScanDepth {
    /// Validate a caller-supplied depth. Negative depths are rejected;
    /// depths beyond the platform word size saturate.
    pub fn new(depth: i64) -> Result<Self> {
        if depth < 0 {
            return Err(Error::InvalidScanDepth { depth });
        }
        Ok(Self(usize::try_from(depth).unwrap_or(usize::MAX)))
    }

    /// Number of buses to examine
    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for ScanDepth {
    fn default() -> Self {
        Self(1)
    }
}

// =============================================================================
// Devices
// =============================================================================

/// A hardware unit attached to a virtual machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Device key, unique within one virtual machine
    pub key: i32,
    /// Key of the controller this device hangs off (absent or 0 for controllers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller_key: Option<i32>,
    /// Position on the parent controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_number: Option<u32>,
    /// Human-readable label, e.g. "Hard disk 1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Kind discriminator and kind-specific payload
    #[serde(flatten)]
    pub kind: DeviceKind,
}

/// Kind of device and its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DeviceKind {
    /// Parallel SCSI / SAS controller
    #[serde(rename_all = "camelCase")]
    ScsiController {
        sub_type: ScsiSubType,
        #[serde(default)]
        sharing: BusSharing,
    },
    /// AHCI SATA controller
    SataController,
    /// NVMe controller
    NvmeController,
    /// IDE controller
    IdeController,
    /// Virtual disk with its backing store
    Disk(DiskBacking),
    /// Virtual ethernet card
    NetworkAdapter(NetworkAdapterInfo),
    /// Anything the classifier does not look at (video card, keyboard, ...)
    #[serde(rename_all = "camelCase")]
    Other { type_name: String },
}

impl Device {
    /// Key of the parent controller. A stored key of 0 means no parent.
    pub fn parent_key(&self) -> Option<i32> {
        self.controller_key.filter(|key| *key != 0)
    }

    /// Controller kind, if this device is a controller
    pub fn controller_kind(&self) -> Option<ControllerKind> {
        match self.kind {
            DeviceKind::ScsiController { .. } => Some(ControllerKind::Scsi),
            DeviceKind::SataController => Some(ControllerKind::Sata),
            DeviceKind::NvmeController => Some(ControllerKind::Nvme),
            DeviceKind::IdeController => Some(ControllerKind::Ide),
            _ => None,
        }
    }

    /// Bus sub-type, if this device is a controller
    pub fn bus_type(&self) -> Option<BusType> {
        match self.kind {
            DeviceKind::ScsiController { sub_type, .. } => Some(sub_type.into()),
            DeviceKind::SataController => Some(BusType::Ahci),
            DeviceKind::NvmeController => Some(BusType::Nvme),
            DeviceKind::IdeController => Some(BusType::Ide),
            _ => None,
        }
    }

    /// Bus sharing mode, if this device is a controller.
    ///
    /// Only SCSI controllers can share their bus; every other controller kind
    /// reports [`BusSharing::NoSharing`].
    pub fn bus_sharing(&self) -> Option<BusSharing> {
        match self.kind {
            DeviceKind::ScsiController { sharing, .. } => Some(sharing),
            _ if self.controller_kind().is_some() => Some(BusSharing::NoSharing),
            _ => None,
        }
    }

    /// Disk backing, if this device is a disk
    pub fn as_disk(&self) -> Option<&DiskBacking> {
        match &self.kind {
            DeviceKind::Disk(backing) => Some(backing),
            _ => None,
        }
    }

    /// Adapter payload, if this device is a network adapter
    pub fn as_network_adapter(&self) -> Option<&NetworkAdapterInfo> {
        match &self.kind {
            DeviceKind::NetworkAdapter(info) => Some(info),
            _ => None,
        }
    }
}

// =============================================================================
// Device Snapshot
// =============================================================================

/// Immutable device list retrieved for one virtual machine at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    /// Identity of the virtual machine, used in error reports
    pub vm_id: String,
    /// Flat device list in fetch order
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl DeviceSnapshot {
    /// Create a snapshot for the given virtual machine
    pub fn new(vm_id: impl Into<String>, devices: Vec<Device>) -> Self {
        Self {
            vm_id: vm_id.into(),
            devices,
        }
    }

    /// Build the lookup index for this snapshot
    pub fn index(&self) -> DeviceIndex<'_> {
        DeviceIndex::new(self)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Device builders shared by the inventory tests.

    use super::*;

    pub fn scsi(key: i32, sub_type: ScsiSubType, sharing: BusSharing) -> Device {
        Device {
            key,
            controller_key: None,
            unit_number: None,
            label: Some(format!("SCSI controller {}", key - 1000)),
            kind: DeviceKind::ScsiController { sub_type, sharing },
        }
    }

    pub fn lsilogic(key: i32) -> Device {
        scsi(key, ScsiSubType::LsiLogic, BusSharing::NoSharing)
    }

    pub fn sata(key: i32) -> Device {
        Device {
            key,
            controller_key: None,
            unit_number: None,
            label: None,
            kind: DeviceKind::SataController,
        }
    }

    pub fn disk(key: i32, controller: i32, unit: u32, gib: u64, thin: bool) -> Device {
        Device {
            key,
            controller_key: Some(controller),
            unit_number: Some(unit),
            label: Some(format!("Hard disk {}", key)),
            kind: DeviceKind::Disk(DiskBacking {
                file_name: Some(format!("[datastore1] vm/vm_{}.vmdk", key)),
                capacity_in_bytes: Some(gib * 1024 * 1024 * 1024),
                capacity_in_kb: None,
                thin_provisioned: Some(thin),
                eagerly_scrub: Some(false),
                disk_mode: Some("persistent".to_string()),
            }),
        }
    }

    pub fn nic(key: i32, unit: u32, class: &str, network: &str) -> Device {
        Device {
            key,
            controller_key: Some(100),
            unit_number: Some(unit),
            label: Some(format!("Network adapter {}", unit + 1)),
            kind: DeviceKind::NetworkAdapter(NetworkAdapterInfo {
                implementation_class: class.to_string(),
                mac_address: Some(format!("00:50:56:00:00:{:02x}", unit)),
                backing: Some(NetworkBacking::Standard {
                    network: network.to_string(),
                }),
            }),
        }
    }
}
