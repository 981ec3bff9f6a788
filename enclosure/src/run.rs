//! The daemon's main loop: keep a bus connection alive and dispatch what arrives.

use core::{future::Future, pin::Pin, time::Duration};

use enclosure_common::CommandRunner;
use eyre::WrapErr as _;
use tokio::{
    signal,
    sync::mpsc::{self, UnboundedReceiver},
    time::sleep,
};
use tracing::{Instrument as _, info, info_span, warn};

use crate::{
    bus::{self, BusReader, BusWriter},
    config::EnclosureConfig,
    reactions::ReactionTable,
    settings::{SettingsStore, SkillSettings, watch_settings_file},
};

/// Creates a future that resolves when a shutdown signal is received.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, only Ctrl-C stops the daemon");
                drop(signal::ctrl_c().await);
            }
        }
    }
    #[cfg(not(unix))]
    {
        drop(signal::ctrl_c().await);
    }
}

enum ConnectionEnd {
    Lost,
    Shutdown,
}

/// Runs the enclosure until `shutdown` resolves.
///
/// Connects to the bus, reconnecting after `bus.reconnect_delay_secs` whenever the
/// connection drops. Bus messages and settings-file changes are handled one at a time.
///
/// # Errors
///
/// Returns an error if the bus writer task panicked.
pub async fn run<R, F>(config: EnclosureConfig, runner: R, shutdown: F) -> eyre::Result<()>
where
    R: CommandRunner,
    F: Future<Output = ()>,
{
    let store = SettingsStore::new(config.settings_file());
    let initial = store.load().await.unwrap_or_else(|e| {
        warn!(error = %e, "Settings unreadable, assuming everything disabled");
        SkillSettings::default()
    });

    let (outbox, mut outbox_rx) = mpsc::unbounded_channel();
    let mut table = ReactionTable::new(&config, runner, outbox, &initial);
    table.initialize();

    let (settings_tx, mut settings_rx) = mpsc::unbounded_channel();
    let _watcher = watch_settings_file(store.path(), settings_tx)
        .inspect_err(|e| warn!(error = %e, path = ?store.path(), "Not watching settings file"))
        .ok();

    let reconnect_delay = Duration::from_secs(config.bus.reconnect_delay_secs);
    tokio::pin!(shutdown);

    loop {
        let connected = tokio::select! {
            res = bus::connect(&config.bus.url) => res,
            () = &mut shutdown => break,
        };
        match connected {
            Ok((reader, sink)) => {
                info!(url = %config.bus.url, "Connected to message bus");
                let writer = BusWriter::spawn(sink, outbox_rx);
                table.register_intents();
                let end = serve_connection(reader, &mut table, &mut settings_rx, &mut shutdown)
                    .instrument(info_span!("bus.connection", url = %config.bus.url))
                    .await;
                outbox_rx = writer.stop().await.wrap_err("Bus writer failed")?;
                match end {
                    ConnectionEnd::Shutdown => break,
                    ConnectionEnd::Lost => warn!("Lost connection to message bus"),
                }
            }
            Err(e) => warn!(error = %e, "Failed to connect to message bus"),
        }

        tokio::select! {
            () = sleep(reconnect_delay) => {}
            () = &mut shutdown => break,
        }
    }

    table.shutdown();
    info!("Enclosure stopped");
    Ok(())
}

async fn serve_connection<R, F>(
    mut reader: BusReader,
    table: &mut ReactionTable<R>,
    settings_rx: &mut UnboundedReceiver<()>,
    shutdown: &mut Pin<&mut F>,
) -> ConnectionEnd
where
    R: CommandRunner,
    F: Future<Output = ()>,
{
    loop {
        tokio::select! {
            msg = reader.next_message() => match msg {
                Some(msg) => table.dispatch(&msg).await,
                None => return ConnectionEnd::Lost,
            },
            Some(()) = settings_rx.recv() => table.on_settings_changed().await,
            () = shutdown.as_mut() => return ConnectionEnd::Shutdown,
        }
    }
}
