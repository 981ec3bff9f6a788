//! Command-line interface definitions for the enclosure daemon.

use std::env;

use clap::{Parser, Subcommand, ValueEnum};

#[cfg(target_os = "linux")]
use crate::install;

/// Top-level command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands for the enclosure daemon.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to the message bus and drive the enclosure.
    Service(ServiceArgs),

    /// Install the daemon as a systemd service.
    #[cfg(target_os = "linux")]
    Install(install::Args),
}

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
    Pretty,
}

/// Arguments for the service command.
#[derive(Debug, Parser)]
pub struct ServiceArgs {
    /// Path to the configuration file
    #[arg(short, long, env = "ENCLOSURE_CONFIG", default_value = "enclosure.toml")]
    pub config: String,

    /// Format of the log output
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Optional override for the bus url (overrides `bus.url` in config)
    #[arg(long)]
    pub bus_url: Option<String>,
}
