//! Shared pieces of the enclosure daemon.
//!
//! This crate provides:
//! - The JSON wire format of the assistant's message bus
//! - System command construction and execution
//! - Service installation helpers for systemd hosts

use std::path::Path;

mod commands;
mod protocol;
mod service_install;

pub use commands::*;
pub use protocol::*;
pub use service_install::*;

/// Returns `true` if the system uses systemd (detects `/run/systemd/system`).
#[must_use]
pub fn is_systemd() -> bool {
    Path::new("/run/systemd/system").exists()
}
