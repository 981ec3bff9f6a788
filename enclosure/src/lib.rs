//! Library entry for the enclosure daemon.
//!
//! Exposes `inner_main` so the shim binary (and the integration tests) can call into the
//! daemon logic.
//!
//! The daemon listens on the assistant's message bus and reacts to device events: it paints
//! framebuffer visuals, toggles the SSH and AirPlay services, greets on boot and says
//! goodbye before halting or rebooting.
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "This is not problematic in tests",)
)]

extern crate alloc;
extern crate core;

pub mod bus;
pub mod cli;
pub mod config;
pub mod dialog;
pub mod display;
#[cfg(target_os = "linux")]
pub mod install;
pub mod locale;
pub mod pairing;
pub mod reactions;
pub mod run;
pub mod services;
pub mod settings;

use std::{env, fs, process, sync::Once};

use enclosure_common::ProcessRunner;
use eyre::{Result, WrapErr as _};
use tracing::{Instrument as _, info, info_span};
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use cli::{Cli, Command, LogFormat};

static INIT_TRACING: Once = Once::new();

fn init_tracing(log_format: LogFormat) {
    INIT_TRACING.call_once(move || {
        let default_level = if env::var("ENCLOSURE_INTEGRATION_TEST").is_ok() {
            "error"
        } else {
            "info"
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_timer(ChronoLocal::rfc_3339());

        match log_format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    });
}

/// The daemon's main function; called from the shim binary.
///
/// # Errors
///
/// Returns an error if installation fails, or if the config cannot be loaded.
pub async fn inner_main(invocation: Cli) -> Result<()> {
    match invocation.command {
        #[cfg(target_os = "linux")]
        Command::Install(args) => install::setup(args),
        Command::Service(args) => {
            let config_path = fs::canonicalize(&args.config)
                .wrap_err(format!("Config file not found at: {}", args.config))?;

            init_tracing(args.log_format);

            let startup_span = info_span!("enclosure", ?config_path, pid = ?process::id(), version = env!("CARGO_PKG_VERSION"));

            let mut config = config::load(&config_path)
                .instrument(startup_span.clone())
                .await?;
            if let Some(url) = args.bus_url {
                config.bus.url = url;
            }

            async {
                info!(bus = %config.bus.url, skill = %config.skill.id, "Starting enclosure");
                run::run(config, ProcessRunner, run::shutdown_signal()).await
            }
            .instrument(startup_span)
            .await
        }
    }
}
