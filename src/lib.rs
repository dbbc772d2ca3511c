//! vminventory - Virtual Machine Hardware Inventory Classifier
//!
//! Derives a normalized, deterministic description of a virtual machine's
//! storage and networking hardware from the unordered device list the
//! virtualization platform returns.
//!
//! # Architecture
//!
//! ```text
//! VirtualMachineSource (port) → DataSource (orchestrator) → Inventory (pure core)
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - Infrastructure adapters implementing domain ports
//! - [`datasource`] - VM lookup and report assembly
//! - [`domain`] - Port traits and platform value objects
//! - [`error`] - Error types
//! - [`inventory`] - Device index, controller classifier, disk and network readers

pub mod adapters;
pub mod datasource;
pub mod domain;
pub mod error;
pub mod inventory;

// Re-export commonly used types
pub use adapters::InventoryFileSource;
pub use datasource::{read_virtual_machine, DataSourceConfig, VirtualMachineReport};
pub use domain::VirtualMachineSource;
pub use error::{Error, Result};
pub use inventory::{
    classify, read_disks, read_network_adapter_types, read_network_adapters, BusClassification,
    Classification, Device, DeviceSnapshot, DiskRecord, NetworkAdapterRecord, ScanDepth,
};
