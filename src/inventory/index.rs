//! Device Index
//!
//! Lookup structures over a [`DeviceSnapshot`]. The snapshot stays a flat
//! arena; the index only stores positions into it, keyed by device key,
//! parent controller and controller kind.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use super::{ControllerKind, Device, DeviceSnapshot, ScanDepth};

/// A controller restricted to a bus number below the scan depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSlot<'a> {
    /// Bus number, assigned positionally within the controller kind
    pub bus_number: usize,
    /// The controller device
    pub device: &'a Device,
}

/// Read-only index over one virtual machine's devices
#[derive(Debug)]
pub struct DeviceIndex<'a> {
    vm_id: &'a str,
    devices: &'a [Device],
    by_key: HashMap<i32, usize>,
    /// Controller key -> attached devices, ascending by (unit number, key)
    children: HashMap<i32, Vec<usize>>,
    /// Controllers per kind, ascending by device key
    controllers: BTreeMap<ControllerKind, Vec<usize>>,
    /// Network adapters across the whole VM, ascending by (unit number, key)
    adapters: Vec<usize>,
}

impl<'a> DeviceIndex<'a> {
    /// Build the index for a snapshot
    pub fn new(snapshot: &'a DeviceSnapshot) -> Self {
        let devices = snapshot.devices.as_slice();

        let mut by_key = HashMap::with_capacity(devices.len());
        for (pos, device) in devices.iter().enumerate() {
            if by_key.insert(device.key, pos).is_some() {
                warn!(
                    vm_id = %snapshot.vm_id,
                    device_key = device.key,
                    "Duplicate device key in snapshot, keeping the last occurrence"
                );
            }
        }

        let mut children: HashMap<i32, Vec<usize>> = HashMap::new();
        let mut controllers: BTreeMap<ControllerKind, Vec<usize>> = BTreeMap::new();
        let mut adapters = Vec::new();

        for (pos, device) in devices.iter().enumerate() {
            // Shadowed duplicates stay out of every listing
            if by_key.get(&device.key) != Some(&pos) {
                continue;
            }
            if let Some(kind) = device.controller_kind() {
                controllers.entry(kind).or_default().push(pos);
            }
            if device.as_network_adapter().is_some() {
                adapters.push(pos);
            }
            if let Some(parent) = device.parent_key() {
                if by_key.contains_key(&parent) {
                    children.entry(parent).or_default().push(pos);
                } else {
                    debug!(
                        vm_id = %snapshot.vm_id,
                        device_key = device.key,
                        controller_key = parent,
                        "Device references a missing controller, omitting"
                    );
                }
            }
        }

        let unit_order = |pos: &usize| {
            let device = &devices[*pos];
            (device.unit_number.unwrap_or(u32::MAX), device.key)
        };
        for attached in children.values_mut() {
            attached.sort_by_key(unit_order);
        }
        adapters.sort_by_key(unit_order);
        for list in controllers.values_mut() {
            list.sort_by_key(|pos| devices[*pos].key);
        }

        Self {
            vm_id: &snapshot.vm_id,
            devices,
            by_key,
            children,
            controllers,
            adapters,
        }
    }

    /// Identity of the indexed virtual machine
    pub fn vm_id(&self) -> &'a str {
        self.vm_id
    }

    /// Look up a device by key
    pub fn get(&self, key: i32) -> Option<&'a Device> {
        self.by_key.get(&key).map(|pos| &self.devices[*pos])
    }

    /// Devices attached to a controller, ascending by unit number
    pub fn attached(&self, controller_key: i32) -> impl Iterator<Item = &'a Device> + '_ {
        let devices = self.devices;
        self.children
            .get(&controller_key)
            .into_iter()
            .flatten()
            .map(move |pos| &devices[*pos])
    }

    /// Unit numbers in use on a controller, ascending
    pub fn unit_numbers(&self, controller_key: i32) -> Vec<u32> {
        self.attached(controller_key)
            .filter_map(|device| device.unit_number)
            .collect()
    }

    /// Controllers of a kind, ascending by device key
    pub fn controllers(&self, kind: ControllerKind) -> impl Iterator<Item = &'a Device> + '_ {
        let devices = self.devices;
        self.controllers
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |pos| &devices[*pos])
    }

    /// Controllers of a kind on buses `0..depth`, with their bus numbers
    pub fn controller_slots(
        &self,
        kind: ControllerKind,
        depth: ScanDepth,
    ) -> impl Iterator<Item = ControllerSlot<'a>> + '_ {
        self.controllers(kind)
            .take(depth.get())
            .enumerate()
            .map(|(bus_number, device)| ControllerSlot { bus_number, device })
    }

    /// Network adapters across the VM, ascending by unit number
    pub fn network_adapters(&self) -> impl Iterator<Item = &'a Device> + '_ {
        let devices = self.devices;
        self.adapters.iter().map(move |pos| &devices[*pos])
    }
}
