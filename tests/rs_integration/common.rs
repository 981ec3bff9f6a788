//! Common utilities for integration tests.
//!
//! Provides a stand-in for the assistant's message bus, a command runner that records
//! instead of executing, and a way to run the daemon against both.

use core::time::Duration;
use std::{
    env, fs,
    path::PathBuf,
    process,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU16, Ordering},
    },
};

use enclosure_common::{CommandError, CommandRunner, Message, SystemCommand};
use enclosure_daemon::config::{EnclosureConfig, PairingConfig};
use futures::{SinkExt as _, StreamExt as _};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task,
    time::{self, Instant, timeout},
};
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message as Frame};

static NEXT_DIR: AtomicU16 = AtomicU16::new(0);

/// Records every command instead of running it.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingRunner {
    commands: Arc<Mutex<Vec<String>>>,
}

impl RecordingRunner {
    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Waits until a command equal to `expected` was run.
    pub(crate) async fn wait_for(&self, expected: &str, secs: u64) {
        let deadline = Instant::now() + Duration::from_secs(secs);
        while Instant::now() < deadline {
            if self.commands().iter().any(|cmd| cmd == expected) {
                return;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
        panic!("`{expected}` was not run, got {:?}", self.commands());
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &SystemCommand) -> Result<(), CommandError> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(())
    }
}

/// A message bus with room for one client at a time.
pub(crate) struct FakeBus {
    listener: TcpListener,
}

impl FakeBus {
    pub(crate) async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake bus");
        Self { listener }
    }

    pub(crate) fn url(&self) -> String {
        let addr = self.listener.local_addr().unwrap();
        format!("ws://{addr}/core")
    }

    /// Waits for the daemon to connect.
    pub(crate) async fn accept(&self, secs: u64) -> BusClient {
        let (stream, _) = timeout(Duration::from_secs(secs), self.listener.accept())
            .await
            .expect("daemon did not connect")
            .unwrap();
        let socket = accept_async(stream).await.expect("websocket handshake failed");
        BusClient { socket }
    }
}

/// The daemon's connection, seen from the bus.
pub(crate) struct BusClient {
    socket: WebSocketStream<TcpStream>,
}

impl BusClient {
    pub(crate) async fn send(&mut self, msg: &Message) {
        self.socket
            .send(Frame::text(msg.to_json().unwrap()))
            .await
            .expect("failed to send to daemon");
    }

    /// Reads messages until one of type `msg_type` arrives.
    pub(crate) async fn recv_type(&mut self, msg_type: &str, secs: u64) -> Message {
        timeout(Duration::from_secs(secs), async {
            loop {
                let frame = self
                    .socket
                    .next()
                    .await
                    .expect("daemon closed the connection")
                    .unwrap();
                if let Frame::Text(text) = frame {
                    let msg = Message::from_json(text.as_str()).unwrap();
                    if msg.msg_type == msg_type {
                        return msg;
                    }
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("no `{msg_type}` message from daemon"))
    }

    pub(crate) async fn close(mut self) {
        drop(self.socket.close(None).await);
    }
}

/// A config pointing at `bus_url`, with its install directory in a fresh temp dir.
pub(crate) fn test_config(bus_url: &str) -> EnclosureConfig {
    let dir = env::temp_dir().join(format!(
        "enclosure_it_{}_{}",
        process::id(),
        NEXT_DIR.fetch_add(1, Ordering::SeqCst)
    ));
    drop(fs::remove_dir_all(&dir));
    fs::create_dir_all(&dir).expect("failed to create install dir");

    let mut config = EnclosureConfig::default();
    config.bus.url = bus_url.to_owned();
    config.bus.reconnect_delay_secs = 1;
    config.skill.install_dir = dir.to_string_lossy().into_owned();
    config.display.viewer = vec!["fbv".to_owned()];
    config.system.farewell_delay_secs = 0;
    config.pairing = PairingConfig::Always;
    config
}

pub(crate) fn install_dir(config: &EnclosureConfig) -> PathBuf {
    PathBuf::from(&config.skill.install_dir)
}

/// Stops the daemon when dropped, and lets a test wait for a clean stop.
pub(crate) struct RunningDaemon {
    stop: Option<oneshot::Sender<()>>,
    handle: task::JoinHandle<eyre::Result<()>>,
}

impl RunningDaemon {
    pub(crate) async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            drop(stop.send(()));
        }
        timeout(Duration::from_secs(5), &mut self.handle)
            .await
            .expect("daemon did not stop")
            .unwrap()
            .expect("daemon failed");
    }
}

impl Drop for RunningDaemon {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Runs the daemon in the background until the returned guard is stopped or dropped.
pub(crate) fn spawn_daemon(config: EnclosureConfig, runner: RecordingRunner) -> RunningDaemon {
    // SAFETY: This is only used in integration tests and no user-facing code.
    unsafe {
        env::set_var("ENCLOSURE_INTEGRATION_TEST", "1");
    }
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(enclosure_daemon::run::run(config, runner, async move {
        drop(stopped.await);
    }));
    RunningDaemon {
        stop: Some(stop),
        handle,
    }
}
