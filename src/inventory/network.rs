//! Network Adapter Reader
//!
//! Lists every virtual ethernet card on the VM in unit-number order. Scan
//! depth does not apply here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::{DeviceIndex, DeviceSnapshot};

// =============================================================================
// Adapter Types
// =============================================================================

/// Normalized virtual ethernet card type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    E1000,
    E1000e,
    Vmxnet2,
    Vmxnet3,
    Vmxnet3Vrdma,
    Pcnet32,
    Sriov,
    /// Implementation class not recognized
    Unknown,
}

impl AdapterType {
    /// Map a platform implementation class (e.g. `VirtualVmxnet3`) to its label.
    pub fn from_implementation_class(class: &str) -> Self {
        match class {
            "VirtualE1000" => AdapterType::E1000,
            "VirtualE1000e" => AdapterType::E1000e,
            "VirtualVmxnet2" => AdapterType::Vmxnet2,
            "VirtualVmxnet3" => AdapterType::Vmxnet3,
            "VirtualVmxnet3Vrdma" => AdapterType::Vmxnet3Vrdma,
            "VirtualPCNet32" => AdapterType::Pcnet32,
            "VirtualSriovEthernetCard" => AdapterType::Sriov,
            _ => AdapterType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterType::E1000 => "e1000",
            AdapterType::E1000e => "e1000e",
            AdapterType::Vmxnet2 => "vmxnet2",
            AdapterType::Vmxnet3 => "vmxnet3",
            AdapterType::Vmxnet3Vrdma => "vmxnet3vrdma",
            AdapterType::Pcnet32 => "pcnet32",
            AdapterType::Sriov => "sriov",
            AdapterType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AdapterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Adapter Payload
// =============================================================================

/// How an adapter is connected to a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NetworkBacking {
    /// Standard port group
    Standard { network: String },
    /// Distributed virtual switch port group
    #[serde(rename_all = "camelCase")]
    DistributedPort {
        switch_uuid: String,
        portgroup_key: String,
    },
    /// Network managed outside the platform (e.g. NSX)
    #[serde(rename_all = "camelCase")]
    Opaque {
        network_id: String,
        network_type: String,
    },
}

impl NetworkBacking {
    /// Logical network identifier the adapter is connected to
    pub fn network_id(&self) -> &str {
        match self {
            NetworkBacking::Standard { network } => network,
            NetworkBacking::DistributedPort { portgroup_key, .. } => portgroup_key,
            NetworkBacking::Opaque { network_id, .. } => network_id,
        }
    }
}

/// Payload of a virtual ethernet card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAdapterInfo {
    /// Platform implementation class, e.g. `VirtualE1000`
    pub implementation_class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backing: Option<NetworkBacking>,
}

/// Adapter attributes as reported upward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NetworkAdapterRecord {
    pub network_id: String,
    pub adapter_type: AdapterType,
    pub mac_address: String,
}

// =============================================================================
// Reader
// =============================================================================

/// Records for every adapter in the index, ascending by unit number.
pub fn network_adapters(index: &DeviceIndex<'_>) -> Vec<NetworkAdapterRecord> {
    index
        .network_adapters()
        .filter_map(|device| device.as_network_adapter().map(|info| (device, info)))
        .map(|(device, info)| {
            let adapter_type = AdapterType::from_implementation_class(&info.implementation_class);
            if adapter_type == AdapterType::Unknown {
                warn!(
                    vm_id = index.vm_id(),
                    device_key = device.key,
                    class = %info.implementation_class,
                    "Unrecognized network adapter class"
                );
            }
            NetworkAdapterRecord {
                network_id: info
                    .backing
                    .as_ref()
                    .map(|backing| backing.network_id().to_string())
                    .unwrap_or_default(),
                adapter_type,
                mac_address: info.mac_address.clone().unwrap_or_default(),
            }
        })
        .collect()
}

/// Read every network adapter in a snapshot.
#[instrument(skip(snapshot), fields(vm_id = %snapshot.vm_id))]
pub fn read_network_adapters(snapshot: &DeviceSnapshot) -> Vec<NetworkAdapterRecord> {
    network_adapters(&snapshot.index())
}

/// Adapter types only, in the same order as [`read_network_adapters`].
pub fn read_network_adapter_types(snapshot: &DeviceSnapshot) -> Vec<AdapterType> {
    read_network_adapters(snapshot)
        .into_iter()
        .map(|record| record.adapter_type)
        .collect()
}
