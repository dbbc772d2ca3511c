//! Disk Attribute Reader
//!
//! Walks the controllers on buses `0..depth` in bus order and lists their
//! disks in unit order. Disks on controllers beyond the scan depth are left
//! out; callers that need them raise the depth.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ControllerKind, DeviceIndex, DeviceSnapshot, ScanDepth};
use crate::error::{Error, Result};

const GIB: u64 = 1024 * 1024 * 1024;

/// Backing-store payload of a virtual disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskBacking {
    /// Datastore path of the backing file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Capacity in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_in_bytes: Option<u64>,
    /// Capacity in KiB, reported by older platform versions
    #[serde(
        default,
        rename = "capacityInKB",
        skip_serializing_if = "Option::is_none"
    )]
    pub capacity_in_kb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thin_provisioned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eagerly_scrub: Option<bool>,
    /// Disk mode, e.g. "persistent" or "independent_nonpersistent"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_mode: Option<String>,
}

impl DiskBacking {
    /// Capacity in bytes. Prefers the byte count, falls back to KiB.
    /// Zero is treated as missing.
    pub fn capacity_bytes(&self) -> Option<u64> {
        self.capacity_in_bytes
            .filter(|bytes| *bytes > 0)
            .or_else(|| {
                self.capacity_in_kb
                    .filter(|kb| *kb > 0)
                    .map(|kb| kb.saturating_mul(1024))
            })
    }
}

/// Disk attributes as reported upward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DiskRecord {
    /// Capacity in GiB, rounded up
    pub size: u64,
    /// Whether the disk was eagerly zeroed
    pub eagerly_scrub: bool,
    /// Whether the disk is thin provisioned
    pub thin_provisioned: bool,
}

impl DiskRecord {
    fn from_backing(vm_id: &str, device_key: i32, backing: &DiskBacking) -> Result<Self> {
        let bytes = backing
            .capacity_bytes()
            .ok_or_else(|| Error::malformed(vm_id, device_key, "disk backing has no capacity"))?;

        Ok(Self {
            size: bytes.div_ceil(GIB),
            eagerly_scrub: backing.eagerly_scrub.unwrap_or(false),
            thin_provisioned: backing.thin_provisioned.unwrap_or(false),
        })
    }
}

/// Disk records for controllers of `kind` on buses below `depth`, ordered by
/// (bus number, unit number).
///
/// A disk without capacity aborts the whole listing.
pub fn disk_attributes(
    index: &DeviceIndex<'_>,
    kind: ControllerKind,
    depth: ScanDepth,
) -> Result<Vec<DiskRecord>> {
    let mut disks = Vec::new();

    for slot in index.controller_slots(kind, depth) {
        debug!(
            bus_number = slot.bus_number,
            controller_key = slot.device.key,
            units = ?index.unit_numbers(slot.device.key),
            "Scanning controller"
        );
        for device in index.attached(slot.device.key) {
            let Some(backing) = device.as_disk() else {
                continue;
            };
            let record = DiskRecord::from_backing(index.vm_id(), device.key, backing)?;
            debug!(
                bus_number = slot.bus_number,
                unit_number = ?device.unit_number,
                device_key = device.key,
                size_gib = record.size,
                thin = record.thin_provisioned,
                "Read disk attributes"
            );
            disks.push(record);
        }
    }

    Ok(disks)
}

/// Read disk attributes from the controllers of `kind` in a snapshot.
#[instrument(skip(snapshot), fields(vm_id = %snapshot.vm_id))]
pub fn read_disks_kind(
    snapshot: &DeviceSnapshot,
    kind: ControllerKind,
    depth: i64,
) -> Result<Vec<DiskRecord>> {
    let depth = ScanDepth::new(depth)?;
    disk_attributes(&snapshot.index(), kind, depth)
}

/// Read disk attributes from the SCSI controllers in a snapshot.
pub fn read_disks(snapshot: &DeviceSnapshot, depth: i64) -> Result<Vec<DiskRecord>> {
    read_disks_kind(snapshot, ControllerKind::Scsi, depth)
}
