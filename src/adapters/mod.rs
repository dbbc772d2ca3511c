//! Infrastructure Adapters
//!
//! Adapter implementations for the domain ports, following the Port/Adapter
//! (Hexagonal) architecture pattern.
//!
//! # Usage
//!
//! ```ignore
//! use vminventory::adapters::InventoryFileSource;
//! use vminventory::domain::VirtualMachineSource;
//!
//! let source = InventoryFileSource::load(Path::new("inventory.yaml")).await?;
//! let vm = source.find_virtual_machine("/dc1/vm/web-01", None).await?;
//! ```

mod inventory_file;

pub use inventory_file::{
    DatacenterRecord, InventoryDump, InventoryFileSource, VirtualMachineRecord,
};
