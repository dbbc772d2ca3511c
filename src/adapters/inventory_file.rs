//! Inventory File Adapter
//!
//! Implements the `VirtualMachineSource` port over a recorded inventory dump
//! (JSON or YAML). Used by the CLI and by tests; a live platform adapter would
//! implement the same port.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::ports::{
    DatacenterRef, VirtualMachineProperties, VirtualMachineRef, VirtualMachineSource,
};
use crate::error::{Error, Result};

// =============================================================================
// Dump Format
// =============================================================================

/// Root of an inventory dump
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryDump {
    #[serde(default)]
    pub datacenters: Vec<DatacenterRecord>,
}

/// One datacenter and the machines in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatacenterRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub virtual_machines: Vec<VirtualMachineRecord>,
}

/// One virtual machine or template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachineRecord {
    pub id: String,
    pub name: String,
    /// Folder below the datacenter's `vm` folder, e.g. "templates/linux"
    #[serde(default)]
    pub folder: String,
    #[serde(flatten)]
    pub properties: VirtualMachineProperties,
}

impl VirtualMachineRecord {
    fn inventory_path(&self, datacenter: &DatacenterRecord) -> String {
        let folder = self.folder.trim_matches('/');
        if folder.is_empty() {
            format!("/{}/vm/{}", datacenter.name, self.name)
        } else {
            format!("/{}/vm/{}/{}", datacenter.name, folder, self.name)
        }
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// `VirtualMachineSource` backed by an in-memory inventory dump
#[derive(Debug, Clone)]
pub struct InventoryFileSource {
    dump: InventoryDump,
    /// VM managed object ID -> (datacenter position, VM position)
    by_vm_id: HashMap<String, (usize, usize)>,
}

impl InventoryFileSource {
    /// Create a source over an already-parsed dump
    pub fn from_dump(dump: InventoryDump) -> Self {
        let by_vm_id = dump
            .datacenters
            .iter()
            .enumerate()
            .flat_map(|(dc_pos, dc)| {
                dc.virtual_machines
                    .iter()
                    .enumerate()
                    .map(move |(vm_pos, vm)| (vm.id.clone(), (dc_pos, vm_pos)))
            })
            .collect();
        Self { dump, by_vm_id }
    }

    /// Parse a JSON dump
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(Self::from_dump(serde_json::from_str(contents)?))
    }

    /// Parse a YAML dump
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(Self::from_dump(serde_yaml::from_str(contents)?))
    }

    /// Load a dump from disk. The format follows the file extension.
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let source = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents)?,
            Some("yaml") | Some("yml") => Self::from_yaml(&contents)?,
            other => return Err(Error::UnsupportedFormat(other.unwrap_or("").to_string())),
        };
        debug!(
            datacenters = source.dump.datacenters.len(),
            virtual_machines = source.by_vm_id.len(),
            "Loaded inventory dump"
        );
        Ok(source)
    }

    /// Datacenters searched for a lookup
    fn search_scope(
        &self,
        name: &str,
        datacenter: Option<&DatacenterRef>,
    ) -> Result<Vec<&DatacenterRecord>> {
        match datacenter {
            // Absolute paths name their datacenter
            _ if name.starts_with('/') => Ok(self.dump.datacenters.iter().collect()),
            Some(dc) => self
                .dump
                .datacenters
                .iter()
                .find(|record| record.id == dc.id)
                .map(|record| vec![record])
                .ok_or_else(|| Error::DatacenterNotFound(dc.id.clone())),
            None => match self.dump.datacenters.as_slice() {
                [only] => Ok(vec![only]),
                [] => Err(Error::VirtualMachineNotFound(name.to_string())),
                all => Err(Error::DatacenterRequired { count: all.len() }),
            },
        }
    }
}

/// Whether `vm` in `dc` answers to `name`: an absolute inventory path, a path
/// relative to the datacenter's `vm` folder, or a bare name.
fn matches_name(dc: &DatacenterRecord, vm: &VirtualMachineRecord, name: &str) -> bool {
    if name.starts_with('/') {
        vm.inventory_path(dc) == name
    } else if name.contains('/') {
        vm.inventory_path(dc) == format!("/{}/vm/{}", dc.name, name)
    } else {
        vm.name == name
    }
}

#[async_trait]
impl VirtualMachineSource for InventoryFileSource {
    async fn datacenter(&self, id: &str) -> Result<DatacenterRef> {
        self.dump
            .datacenters
            .iter()
            .find(|dc| dc.id == id)
            .map(|dc| DatacenterRef {
                id: dc.id.clone(),
                name: dc.name.clone(),
            })
            .ok_or_else(|| Error::DatacenterNotFound(id.to_string()))
    }

    async fn find_virtual_machine(
        &self,
        name: &str,
        datacenter: Option<&DatacenterRef>,
    ) -> Result<VirtualMachineRef> {
        let scope = self.search_scope(name, datacenter)?;
        let mut found: Vec<VirtualMachineRef> = scope
            .into_iter()
            .flat_map(|dc| {
                dc.virtual_machines
                    .iter()
                    .filter(move |vm| matches_name(dc, vm, name))
                    .map(move |vm| VirtualMachineRef {
                        id: vm.id.clone(),
                        inventory_path: vm.inventory_path(dc),
                    })
            })
            .collect();

        if found.len() > 1 {
            return Err(Error::AmbiguousVirtualMachine {
                name: name.to_string(),
                matches: found.len(),
            });
        }
        found
            .pop()
            .ok_or_else(|| Error::VirtualMachineNotFound(name.to_string()))
    }

    async fn properties(&self, vm: &VirtualMachineRef) -> Result<VirtualMachineProperties> {
        let (dc_pos, vm_pos) = self
            .by_vm_id
            .get(&vm.id)
            .copied()
            .ok_or_else(|| Error::VirtualMachineNotFound(vm.inventory_path.clone()))?;
        Ok(self.dump.datacenters[dc_pos].virtual_machines[vm_pos]
            .properties
            .clone())
    }
}
