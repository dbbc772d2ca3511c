//! Controller Classifier
//!
//! Reduces the controllers on buses `0..depth` of one kind to a single
//! machine-level bus type and sharing mode. Disagreement yields
//! [`Classification::Mixed`]; an empty scan yields
//! [`Classification::Unknown`]. Neither is an error.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, instrument};

use super::{DeviceIndex, DeviceSnapshot, ScanDepth};
use crate::error::Result;

// =============================================================================
// Controller Kinds
// =============================================================================

/// Family of storage controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Scsi,
    Sata,
    Nvme,
    Ide,
}

impl std::fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerKind::Scsi => write!(f, "SCSI"),
            ControllerKind::Sata => write!(f, "SATA"),
            ControllerKind::Nvme => write!(f, "NVMe"),
            ControllerKind::Ide => write!(f, "IDE"),
        }
    }
}

/// SCSI controller implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScsiSubType {
    #[serde(rename = "buslogic")]
    BusLogic,
    #[serde(rename = "lsilogic")]
    LsiLogic,
    #[serde(rename = "lsilogic-sas")]
    LsiLogicSas,
    #[serde(rename = "pvscsi")]
    ParaVirtual,
}

/// Bus protocol of a storage controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BusType {
    #[serde(rename = "buslogic")]
    BusLogic,
    #[serde(rename = "lsilogic")]
    LsiLogic,
    #[serde(rename = "lsilogic-sas")]
    LsiLogicSas,
    #[serde(rename = "pvscsi")]
    ParaVirtual,
    #[serde(rename = "ahci")]
    Ahci,
    #[serde(rename = "nvme")]
    Nvme,
    #[serde(rename = "ide")]
    Ide,
}

impl BusType {
    /// Label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            BusType::BusLogic => "buslogic",
            BusType::LsiLogic => "lsilogic",
            BusType::LsiLogicSas => "lsilogic-sas",
            BusType::ParaVirtual => "pvscsi",
            BusType::Ahci => "ahci",
            BusType::Nvme => "nvme",
            BusType::Ide => "ide",
        }
    }
}

impl From<ScsiSubType> for BusType {
    fn from(sub_type: ScsiSubType) -> Self {
        match sub_type {
            ScsiSubType::BusLogic => BusType::BusLogic,
            ScsiSubType::LsiLogic => BusType::LsiLogic,
            ScsiSubType::LsiLogicSas => BusType::LsiLogicSas,
            ScsiSubType::ParaVirtual => BusType::ParaVirtual,
        }
    }
}

impl std::fmt::Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-host access mode of a controller bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum BusSharing {
    #[default]
    NoSharing,
    PhysicalSharing,
    VirtualSharing,
}

impl BusSharing {
    /// Label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            BusSharing::NoSharing => "noSharing",
            BusSharing::PhysicalSharing => "physicalSharing",
            BusSharing::VirtualSharing => "virtualSharing",
        }
    }
}

impl std::fmt::Display for BusSharing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Outcome of reducing one attribute across the examined controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification<T> {
    /// Every examined controller agrees on this value
    Uniform(T),
    /// Examined controllers disagree
    Mixed,
    /// No controller was examined
    Unknown,
}

impl<T: PartialEq> Classification<T> {
    /// Reduce observed values: one distinct value, several, or none.
    pub fn reduce<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut values = values.into_iter();
        let Some(first) = values.next() else {
            return Classification::Unknown;
        };
        if values.all(|value| value == first) {
            Classification::Uniform(first)
        } else {
            Classification::Mixed
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Classification::Mixed)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Classification::Unknown)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Classification<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Uniform(value) => value.fmt(f),
            Classification::Mixed => write!(f, "mixed"),
            Classification::Unknown => write!(f, "unknown"),
        }
    }
}

impl<T: std::fmt::Display> Serialize for Classification<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<T> JsonSchema for Classification<T> {
    fn schema_name() -> String {
        "Classification".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// Machine-level bus classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct BusClassification {
    /// Common bus type of the examined controllers
    pub bus_type: Classification<BusType>,
    /// Common sharing mode of the examined controllers
    pub bus_sharing: Classification<BusSharing>,
}

// =============================================================================
// Classifier
// =============================================================================

/// Classify the controllers of `kind` on buses below `depth`.
pub fn classify_controllers(
    index: &DeviceIndex<'_>,
    kind: ControllerKind,
    depth: ScanDepth,
) -> BusClassification {
    let slots: Vec<_> = index.controller_slots(kind, depth).collect();

    for slot in &slots {
        debug!(
            vm_id = index.vm_id(),
            bus_number = slot.bus_number,
            device_key = slot.device.key,
            "Examining {} controller",
            kind
        );
    }

    BusClassification {
        bus_type: Classification::reduce(slots.iter().filter_map(|s| s.device.bus_type())),
        bus_sharing: Classification::reduce(slots.iter().filter_map(|s| s.device.bus_sharing())),
    }
}

/// Classify the controllers of `kind` in a snapshot.
///
/// Fails only when `depth` is negative.
#[instrument(skip(snapshot), fields(vm_id = %snapshot.vm_id))]
pub fn classify_kind(
    snapshot: &DeviceSnapshot,
    kind: ControllerKind,
    depth: i64,
) -> Result<BusClassification> {
    let depth = ScanDepth::new(depth)?;
    let index = snapshot.index();
    let classification = classify_controllers(&index, kind, depth);
    debug!(
        bus_type = %classification.bus_type,
        bus_sharing = %classification.bus_sharing,
        "Controller classification complete"
    );
    Ok(classification)
}

/// Classify the SCSI controllers in a snapshot.
pub fn classify(snapshot: &DeviceSnapshot, depth: i64) -> Result<BusClassification> {
    classify_kind(snapshot, ControllerKind::Scsi, depth)
}
