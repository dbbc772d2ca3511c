//! Domain Layer
//!
//! Port abstractions for the platform the device snapshots come from.
//!
//! # Usage
//!
//! ```ignore
//! use vminventory::domain::VirtualMachineSource;
//!
//! async fn uuid_of<S: VirtualMachineSource>(source: &S, name: &str) -> Result<String> {
//!     let vm = source.find_virtual_machine(name, None).await?;
//!     let props = source.properties(&vm).await?;
//!     // ...
//! }
//! ```

pub mod ports;

pub use ports::{
    DatacenterRef, VirtualHardware, VirtualMachineConfig, VirtualMachineProperties,
    VirtualMachineRef, VirtualMachineSource,
};
