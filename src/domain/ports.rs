//! Domain Ports (DDD Port/Adapter Pattern)
//!
//! The classifier is pure; everything that talks to the virtualization
//! platform sits behind [`VirtualMachineSource`]. Adapters implement it
//! against a live endpoint or a recorded inventory dump.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │           VirtualMachineSource (Trait)               │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │               InventoryFileSource                    │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::inventory::{Device, DeviceSnapshot};

// =============================================================================
// Value Objects
// =============================================================================

/// A resolved datacenter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterRef {
    /// Managed object ID, e.g. "datacenter-21"
    pub id: String,
    /// Datacenter name
    pub name: String,
}

impl DatacenterRef {
    /// Inventory path of the datacenter
    pub fn inventory_path(&self) -> String {
        format!("/{}", self.name)
    }
}

/// A resolved virtual machine or template
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualMachineRef {
    /// Managed object ID, e.g. "vm-1001"
    pub id: String,
    /// Full inventory path, e.g. "/dc1/vm/templates/ubuntu-22.04"
    pub inventory_path: String,
}

impl std::fmt::Display for VirtualMachineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inventory_path)
    }
}

/// Hardware section of a virtual machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHardware {
    #[serde(default = "default_one", rename = "numCPU")]
    pub num_cpu: u32,
    #[serde(default = "default_one")]
    pub num_cores_per_socket: u32,
    #[serde(default, rename = "memoryMB")]
    pub memory_mb: u64,
    #[serde(default)]
    pub device: Vec<Device>,
}

fn default_one() -> u32 {
    1
}

impl Default for VirtualHardware {
    fn default() -> Self {
        Self {
            num_cpu: 1,
            num_cores_per_socket: 1,
            memory_mb: 0,
            device: Vec::new(),
        }
    }
}

/// Configuration of a virtual machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineConfig {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub guest_id: String,
    #[serde(default)]
    pub alternate_guest_name: String,
    /// "bios" or "efi"
    #[serde(default)]
    pub firmware: String,
    #[serde(default)]
    pub hardware: VirtualHardware,
}

/// Property set retrieved for one virtual machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachineProperties {
    /// Absent when the platform returns no configuration (e.g. VM being created)
    #[serde(default)]
    pub config: Option<VirtualMachineConfig>,
}

impl VirtualMachineProperties {
    /// Device snapshot of the configured hardware
    pub fn device_snapshot(&self, vm_id: &str) -> Option<DeviceSnapshot> {
        self.config
            .as_ref()
            .map(|config| DeviceSnapshot::new(vm_id, config.hardware.device.clone()))
    }
}

// =============================================================================
// Ports
// =============================================================================

/// Port for locating virtual machines and fetching their properties.
///
/// Retries and timeouts belong to the implementation.
#[async_trait]
pub trait VirtualMachineSource: Send + Sync {
    /// Resolve a datacenter by managed object ID.
    async fn datacenter(&self, id: &str) -> Result<DatacenterRef>;

    /// Find a virtual machine or template by name or inventory path.
    ///
    /// Without a datacenter the source's default datacenter is searched.
    async fn find_virtual_machine(
        &self,
        name: &str,
        datacenter: Option<&DatacenterRef>,
    ) -> Result<VirtualMachineRef>;

    /// Fetch the property set of a virtual machine.
    async fn properties(&self, vm: &VirtualMachineRef) -> Result<VirtualMachineProperties>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_defaults() {
        let config: VirtualMachineConfig =
            serde_json::from_str(r#"{"uuid": "4211", "hardware": {"memoryMB": 2048}}"#).unwrap();
        assert_eq!(config.hardware.num_cpu, 1);
        assert_eq!(config.hardware.num_cores_per_socket, 1);
        assert_eq!(config.hardware.memory_mb, 2048);
        assert!(config.hardware.device.is_empty());
    }

    #[test]
    fn test_snapshot_requires_config() {
        let props = VirtualMachineProperties::default();
        assert!(props.device_snapshot("vm-1").is_none());

        let props = VirtualMachineProperties {
            config: Some(VirtualMachineConfig::default()),
        };
        let snapshot = props.device_snapshot("vm-1").unwrap();
        assert_eq!(snapshot.vm_id, "vm-1");
    }
}
