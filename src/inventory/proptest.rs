//! Property-Based Tests for the Inventory Classifier
//!
//! # Test Properties
//!
//! 1. **Permutation Invariance**: shuffling the snapshot never changes output
//! 2. **Monotonic Depth**: raising the scan depth only appends disks
//! 3. **Mixed Flip**: one differing controller within depth yields "mixed"
//! 4. **Total Order**: adapters come out strictly ascending by unit number

#![cfg(test)]

use proptest::prelude::*;

use super::fixtures::{disk, lsilogic, nic, scsi};
use super::{
    classify, read_disks, read_network_adapters, BusSharing, BusType, Classification, Device,
    DeviceSnapshot, ScsiSubType,
};

// =============================================================================
// Property Strategies
// =============================================================================

fn sub_type_strategy() -> impl Strategy<Value = ScsiSubType> {
    prop_oneof![
        Just(ScsiSubType::BusLogic),
        Just(ScsiSubType::LsiLogic),
        Just(ScsiSubType::LsiLogicSas),
        Just(ScsiSubType::ParaVirtual),
    ]
}

fn sharing_strategy() -> impl Strategy<Value = BusSharing> {
    prop_oneof![
        Just(BusSharing::NoSharing),
        Just(BusSharing::PhysicalSharing),
        Just(BusSharing::VirtualSharing),
    ]
}

/// Up to four SCSI controllers, each with up to six disks, plus up to five
/// adapters. Keys and unit numbers are unique within their scope.
fn devices_strategy() -> impl Strategy<Value = Vec<Device>> {
    let controllers = prop::collection::vec(
        (sub_type_strategy(), sharing_strategy(), prop::collection::vec(1u64..2048, 0..6)),
        0..4,
    );
    let adapters = prop::collection::vec(0usize..4, 0..5);

    (controllers, adapters).prop_map(|(controllers, adapters)| {
        let mut devices = Vec::new();
        for (bus, (sub_type, sharing, sizes)) in controllers.into_iter().enumerate() {
            let controller_key = 1000 + bus as i32;
            devices.push(scsi(controller_key, sub_type, sharing));
            for (unit, size) in sizes.into_iter().enumerate() {
                let key = 2000 + (bus as i32) * 100 + unit as i32;
                devices.push(disk(key, controller_key, unit as u32, size, size % 2 == 0));
            }
        }
        let classes = ["VirtualE1000", "VirtualVmxnet3", "VirtualE1000e", "VirtualBogus"];
        for (unit, class) in adapters.into_iter().enumerate() {
            devices.push(nic(4000 + unit as i32, unit as u32, classes[class], "network-1"));
        }
        devices
    })
}

/// Devices together with a permutation of them.
fn shuffled_devices_strategy() -> impl Strategy<Value = (Vec<Device>, Vec<Device>)> {
    devices_strategy().prop_flat_map(|devices| {
        let original = devices.clone();
        Just(devices)
            .prop_shuffle()
            .prop_map(move |shuffled| (original.clone(), shuffled))
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: output does not depend on the order devices were fetched in.
    #[test]
    fn prop_permutation_invariance(
        (original, shuffled) in shuffled_devices_strategy(),
        depth in 0i64..5,
    ) {
        let a = DeviceSnapshot::new("vm-prop", original);
        let b = DeviceSnapshot::new("vm-prop", shuffled);

        prop_assert_eq!(classify(&a, depth)?, classify(&b, depth)?);
        prop_assert_eq!(read_disks(&a, depth)?, read_disks(&b, depth)?);
        prop_assert_eq!(read_network_adapters(&a), read_network_adapters(&b));
    }

    /// Property: depth k's disks are a prefix of depth k+1's disks.
    #[test]
    fn prop_deeper_scan_only_appends(
        devices in devices_strategy(),
        depth in 0i64..4,
    ) {
        let snapshot = DeviceSnapshot::new("vm-prop", devices);
        let shallow = read_disks(&snapshot, depth)?;
        let deep = read_disks(&snapshot, depth + 1)?;

        prop_assert!(deep.len() >= shallow.len());
        prop_assert_eq!(&deep[..shallow.len()], &shallow[..]);
    }

    /// Property: uniform controllers classify as their shared sub-type; one
    /// differing controller within depth flips the result to mixed.
    #[test]
    fn prop_single_differing_controller_flips_to_mixed(
        count in 1usize..5,
        odd_bus in 0usize..5,
    ) {
        let odd_bus = odd_bus % count;
        let uniform: Vec<Device> = (0..count).map(|bus| lsilogic(1000 + bus as i32)).collect();
        let snapshot = DeviceSnapshot::new("vm-prop", uniform.clone());
        let result = classify(&snapshot, count as i64)?;
        prop_assert_eq!(result.bus_type, Classification::Uniform(BusType::LsiLogic));

        if count > 1 {
            let mut mixed = uniform;
            mixed[odd_bus] = scsi(1000 + odd_bus as i32, ScsiSubType::ParaVirtual, BusSharing::NoSharing);
            let snapshot = DeviceSnapshot::new("vm-prop", mixed);
            let result = classify(&snapshot, count as i64)?;
            prop_assert_eq!(result.bus_type, Classification::Mixed);
            prop_assert_eq!(result.bus_sharing, Classification::Uniform(BusSharing::NoSharing));
        }
    }

    /// Property: adapters are strictly ordered and none are dropped.
    #[test]
    fn prop_adapters_strictly_ordered(devices in devices_strategy()) {
        let expected = devices.iter().filter(|d| d.as_network_adapter().is_some()).count();
        let snapshot = DeviceSnapshot::new("vm-prop", devices);
        let units: Vec<u32> = snapshot
            .index()
            .network_adapters()
            .filter_map(|d| d.unit_number)
            .collect();

        prop_assert_eq!(units.len(), expected);
        prop_assert!(units.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(read_network_adapters(&snapshot).len(), expected);
    }
}
