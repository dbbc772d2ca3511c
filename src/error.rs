//! Error types for the VM hardware inventory classifier

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or classifying VM hardware
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Classification Errors
    // =========================================================================
    /// Scan depth below zero
    #[error("Invalid controller scan depth {depth}: must be zero or greater")]
    InvalidScanDepth { depth: i64 },

    /// A device in the snapshot is missing data the classifier requires
    #[error("Malformed device {device_key} on virtual machine {vm_id}: {reason}")]
    MalformedDevice {
        vm_id: String,
        device_key: i32,
        reason: String,
    },

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Datacenter ID did not resolve
    #[error("Cannot locate datacenter: {0}")]
    DatacenterNotFound(String),

    /// No datacenter given and the inventory holds more than one
    #[error("Inventory has {count} datacenters; a datacenter ID is required")]
    DatacenterRequired { count: usize },

    /// Virtual machine name or path did not resolve
    #[error("Virtual machine not found: {0}")]
    VirtualMachineNotFound(String),

    /// Virtual machine name matched several machines
    #[error("Virtual machine name {name:?} is ambiguous: {matches} matches")]
    AmbiguousVirtualMachine { name: String, matches: usize },

    /// Property fetch returned no configuration
    #[error("No configuration returned for virtual machine {0:?}")]
    MissingConfig(String),

    /// Configuration has no UUID
    #[error("Virtual machine {0:?} does not have a UUID")]
    MissingUuid(String),

    // =========================================================================
    // I/O and Format Errors
    // =========================================================================
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Inventory file with an extension we cannot parse
    #[error("Unsupported inventory format: {0}")]
    UnsupportedFormat(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a [`Error::MalformedDevice`] for the given VM and device.
    pub fn malformed(vm_id: &str, device_key: i32, reason: impl Into<String>) -> Self {
        Error::MalformedDevice {
            vm_id: vm_id.to_string(),
            device_key,
            reason: reason.into(),
        }
    }
}
