//! Virtual Machine Data Source
//!
//! Looks a virtual machine up through a [`VirtualMachineSource`], runs the
//! inventory classifier over its devices and assembles a
//! [`VirtualMachineReport`].
//!
//! ```text
//! datacenter? ─▶ find VM ─▶ properties ─▶ DeviceIndex ─┬▶ classify
//!                                                      ├▶ disks
//!                                                      └▶ network adapters
//! ```

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::ports::VirtualMachineSource;
use crate::error::{Error, Result};
use crate::inventory::{
    classify_controllers, disk_attributes, network_adapters, AdapterType, BusSharing, BusType,
    Classification, ControllerKind, DiskRecord, NetworkAdapterRecord, ScanDepth,
};

// =============================================================================
// Configuration
// =============================================================================

/// Lookup parameters for one read
#[derive(Debug, Clone)]
pub struct DataSourceConfig {
    /// Name or inventory path of the virtual machine or template
    pub name: String,

    /// Managed object ID of the datacenter to search. Optional when the
    /// inventory has a single datacenter.
    pub datacenter_id: Option<String>,

    /// Number of SCSI controllers to scan for disks and controller types
    pub scsi_controller_scan_count: i64,
}

impl DataSourceConfig {
    /// Config for the given name with default scan count
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            datacenter_id: None,
            scsi_controller_scan_count: 1,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Hardware description of one virtual machine or template
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct VirtualMachineReport {
    /// UUID of the virtual machine
    pub id: String,
    /// The name or path the machine was looked up by
    pub name: String,
    /// Managed object ID of the machine
    pub moid: String,
    /// Guest ID of the virtual machine
    pub guest_id: String,
    /// Alternate guest name when guest_id is a non-specific operating system
    pub alternate_guest_name: String,
    /// Firmware type of the virtual machine
    pub firmware: String,
    /// Number of virtual processors
    pub num_cpus: u32,
    /// Number of cores per virtual socket
    pub num_cores_per_socket: u32,
    /// Memory size in MB
    pub memory: u64,
    /// Common SCSI bus type of the scanned controllers
    pub scsi_type: Classification<BusType>,
    /// Common SCSI bus sharing mode of the scanned controllers
    pub scsi_bus_sharing: Classification<BusSharing>,
    /// Number of SCSI controllers scanned
    pub scsi_controller_scan_count: i64,
    /// Disks on the scanned controllers, sorted by bus and unit number
    pub disks: Vec<DiskRecord>,
    /// Network interfaces, sorted by unit number
    pub network_interfaces: Vec<NetworkAdapterRecord>,
    /// Network interface types, sorted by unit number
    pub network_interface_types: Vec<AdapterType>,
    /// When the properties were read
    pub read_at: DateTime<Utc>,
}

// =============================================================================
// Read
// =============================================================================

/// Look up a virtual machine and describe its hardware.
#[instrument(skip(source), fields(name = %config.name))]
pub async fn read_virtual_machine<S>(
    source: &S,
    config: &DataSourceConfig,
) -> Result<VirtualMachineReport>
where
    S: VirtualMachineSource + ?Sized,
{
    let depth = ScanDepth::new(config.scsi_controller_scan_count)?;

    debug!("Looking for VM or template by name/path {:?}", config.name);
    let datacenter = match &config.datacenter_id {
        Some(id) => {
            let dc = source.datacenter(id).await?;
            debug!("Datacenter for VM/template search: {}", dc.inventory_path());
            Some(dc)
        }
        None => None,
    };

    let vm = source
        .find_virtual_machine(&config.name, datacenter.as_ref())
        .await?;
    let props = source.properties(&vm).await?;

    let vm_config = props
        .config
        .as_ref()
        .ok_or_else(|| Error::MissingConfig(vm.inventory_path.clone()))?;
    if vm_config.uuid.is_empty() {
        return Err(Error::MissingUuid(vm.inventory_path.clone()));
    }

    let snapshot = props
        .device_snapshot(&vm.inventory_path)
        .ok_or_else(|| Error::MissingConfig(vm.inventory_path.clone()))?;
    let index = snapshot.index();

    let classification = classify_controllers(&index, ControllerKind::Scsi, depth);
    let disks = disk_attributes(&index, ControllerKind::Scsi, depth)?;
    let network_interfaces = network_adapters(&index);
    let network_interface_types = network_interfaces
        .iter()
        .map(|nic| nic.adapter_type)
        .collect();

    debug!(
        "VM search for {:?} completed successfully (UUID {:?})",
        config.name, vm_config.uuid
    );

    Ok(VirtualMachineReport {
        id: vm_config.uuid.clone(),
        name: config.name.clone(),
        moid: vm.id.clone(),
        guest_id: vm_config.guest_id.clone(),
        alternate_guest_name: vm_config.alternate_guest_name.clone(),
        firmware: vm_config.firmware.clone(),
        num_cpus: vm_config.hardware.num_cpu,
        num_cores_per_socket: vm_config.hardware.num_cores_per_socket,
        memory: vm_config.hardware.memory_mb,
        scsi_type: classification.bus_type,
        scsi_bus_sharing: classification.bus_sharing,
        scsi_controller_scan_count: config.scsi_controller_scan_count,
        disks,
        network_interfaces,
        network_interface_types,
        read_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InventoryFileSource;
    use assert_matches::assert_matches;

    const DUMP: &str = r#"
datacenters:
  - id: datacenter-21
    name: dc1
    virtualMachines:
      - id: vm-100
        name: web
        config:
          uuid: 4211a1b2-0000-0000-0000-000000000001
          guestId: ubuntu64Guest
          firmware: efi
          hardware:
            numCPU: 4
            numCoresPerSocket: 2
            memoryMB: 8192
            device:
              - { key: 1000, type: scsiController, subType: pvscsi, sharing: noSharing }
              - { key: 2000, controllerKey: 1000, unitNumber: 0, type: disk, capacityInKB: 41943040, thinProvisioned: true }
              - { key: 4000, controllerKey: 100, unitNumber: 7, type: networkAdapter, implementationClass: VirtualVmxnet3,
                  macAddress: "00:50:56:aa:bb:cc", backing: { type: standard, network: network-12 } }
      - id: vm-101
        name: creating
      - id: vm-102
        name: no-uuid
        config:
          guestId: otherGuest
      - id: vm-103
        name: broken
        config:
          uuid: 4211a1b2-0000-0000-0000-000000000003
          hardware:
            device:
              - { key: 1000, type: scsiController, subType: lsilogic }
              - { key: 2000, controllerKey: 1000, unitNumber: 0, type: disk }
"#;

    fn source() -> InventoryFileSource {
        InventoryFileSource::from_yaml(DUMP).unwrap()
    }

    #[test]
    fn test_read_full_report() {
        let report = tokio_test::block_on(read_virtual_machine(
            &source(),
            &DataSourceConfig::new("web"),
        ))
        .unwrap();

        assert_eq!(report.id, "4211a1b2-0000-0000-0000-000000000001");
        assert_eq!(report.moid, "vm-100");
        assert_eq!(report.guest_id, "ubuntu64Guest");
        assert_eq!(report.firmware, "efi");
        assert_eq!(report.num_cpus, 4);
        assert_eq!(report.num_cores_per_socket, 2);
        assert_eq!(report.memory, 8192);
        assert_eq!(report.scsi_type, Classification::Uniform(BusType::ParaVirtual));
        assert_eq!(report.scsi_bus_sharing, Classification::Uniform(BusSharing::NoSharing));
        assert_eq!(report.disks.len(), 1);
        assert_eq!(report.disks[0].size, 40);
        assert!(report.disks[0].thin_provisioned);
        assert_eq!(report.network_interfaces[0].network_id, "network-12");
        assert_eq!(report.network_interface_types, vec![AdapterType::Vmxnet3]);
    }

    #[test]
    fn test_report_serializes_labels() {
        let report = tokio_test::block_on(read_virtual_machine(
            &source(),
            &DataSourceConfig::new("/dc1/vm/web"),
        ))
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scsi_type"], "pvscsi");
        assert_eq!(json["scsi_bus_sharing"], "noSharing");
        assert_eq!(json["network_interface_types"][0], "vmxnet3");
        assert_eq!(json["disks"][0]["eagerly_scrub"], false);
    }

    #[test]
    fn test_missing_config_and_uuid() {
        let source = source();
        assert_matches!(
            tokio_test::block_on(read_virtual_machine(&source, &DataSourceConfig::new("creating"))),
            Err(Error::MissingConfig(_))
        );
        assert_matches!(
            tokio_test::block_on(read_virtual_machine(&source, &DataSourceConfig::new("no-uuid"))),
            Err(Error::MissingUuid(_))
        );
    }

    #[test]
    fn test_malformed_disk_names_vm_path() {
        let result = tokio_test::block_on(read_virtual_machine(
            &source(),
            &DataSourceConfig::new("broken"),
        ));
        assert_matches!(
            result,
            Err(Error::MalformedDevice { ref vm_id, device_key: 2000, .. }) if vm_id == "/dc1/vm/broken"
        );
    }

    #[test]
    fn test_negative_scan_count_rejected_before_lookup() {
        let config = DataSourceConfig {
            name: "does-not-exist".to_string(),
            scsi_controller_scan_count: -1,
            ..Default::default()
        };
        assert_matches!(
            tokio_test::block_on(read_virtual_machine(&source(), &config)),
            Err(Error::InvalidScanDepth { depth: -1 })
        );
    }

    #[test]
    fn test_unknown_datacenter() {
        let config = DataSourceConfig {
            datacenter_id: Some("datacenter-99".to_string()),
            ..DataSourceConfig::new("web")
        };
        assert_matches!(
            tokio_test::block_on(read_virtual_machine(&source(), &config)),
            Err(Error::DatacenterNotFound(_))
        );
    }
}
