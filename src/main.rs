//! vminventory CLI
//!
//! Reads a virtual machine from an inventory dump and prints its hardware
//! report.
//!
//! ```text
//! inventory dump ──▶ VM lookup ──▶ device classifier ──▶ JSON / YAML report
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vminventory::datasource::VirtualMachineReport;
use vminventory::{read_virtual_machine, DataSourceConfig, Error, InventoryFileSource, Result};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

/// vminventory - Describe a virtual machine's storage and network hardware
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Inventory dump to read (.json, .yaml or .yml)
    #[arg(long, env = "VMINVENTORY_FILE", required_unless_present = "print_schema")]
    inventory: Option<PathBuf>,

    /// Name or inventory path of the virtual machine or template
    #[arg(long, env = "VMINVENTORY_VM", required_unless_present = "print_schema")]
    name: Option<String>,

    /// Managed object ID of the datacenter the virtual machine is in
    #[arg(long, env = "VMINVENTORY_DATACENTER_ID")]
    datacenter_id: Option<String>,

    /// Number of SCSI controllers to scan for disk sizes and controller types
    #[arg(
        long,
        env = "SCSI_CONTROLLER_SCAN_COUNT",
        default_value = "1",
        allow_negative_numbers = true
    )]
    scsi_controller_scan_count: i64,

    /// Report output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print the JSON schema of the report and exit
    #[arg(long)]
    print_schema: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    if args.print_schema {
        let schema = schemars::schema_for!(VirtualMachineReport);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let (inventory, name) = match (args.inventory.clone(), args.name.clone()) {
        (Some(inventory), Some(name)) => (inventory, name),
        _ => {
            return Err(Error::Config(
                "--inventory and --name are required".to_string(),
            ))
        }
    };

    info!("Reading inventory {}", inventory.display());
    let source = InventoryFileSource::load(&inventory).await?;

    let config = DataSourceConfig {
        name,
        datacenter_id: args.datacenter_id.clone(),
        scsi_controller_scan_count: args.scsi_controller_scan_count,
    };

    let report = read_virtual_machine(&source, &config).await.map_err(|e| {
        error!("Failed to read virtual machine {:?}: {}", config.name, e);
        e
    })?;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Yaml => serde_yaml::to_string(&report)?,
    };
    println!("{}", output);

    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout carries the report
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
