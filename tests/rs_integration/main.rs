//! Uses the single integration test approach.
//!
//! This improves parallelism when running the tests, and reduces the number of binaries that have to be built (and linked)
#![expect(
    clippy::tests_outside_test_module,
    reason = "This is the integration test binary, so it's expected that tests are outside of a test module"
)]
#![expect(clippy::unwrap_used, reason = "Using unwrap in tests is fine")]

extern crate alloc;
extern crate core;

mod bus;
mod common;

use std::process::Command;

#[test]
fn service_fails_without_config() {
    let status = Command::new(env!("CARGO_BIN_EXE_enclosure"))
        .args(["service", "--config", "/nonexistent/enclosure.toml"])
        .status()
        .expect("failed to start enclosure binary");
    assert!(!status.success(), "service started without a config");
}

#[test]
fn version_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_enclosure"))
        .arg("--version")
        .output()
        .expect("failed to start enclosure binary");
    assert!(output.status.success(), "--version failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "unexpected version output {stdout}");
}
