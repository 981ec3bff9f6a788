//! Websocket client for the message bus.
//!
//! A connection is split in two: the reader is polled by the dispatch loop, the writer is
//! a task draining the outbox. The outbox outlives connections, so the writer hands its
//! receiver back when it stops.

use futures::{
    SinkExt as _, StreamExt as _,
    stream::{SplitSink, SplitStream},
};
use thiserror::Error as ThisError;
use tokio::{
    net::TcpStream,
    sync::{mpsc::UnboundedReceiver, oneshot},
    task::{JoinError, JoinHandle},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message as Frame},
};
use tracing::{debug, info, warn};

use super::Message;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type BusSink = SplitSink<Socket, Frame>;

#[derive(Debug, ThisError)]
pub enum BusError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
}

/// Opens a websocket connection to the bus at `url`.
///
/// # Errors
///
/// Returns an error if the connection or the websocket handshake fails.
pub async fn connect(url: &str) -> Result<(BusReader, BusSink), BusError> {
    let (socket, _response) = connect_async(url).await.map_err(|source| BusError::Connect {
        url: url.to_owned(),
        source: Box::new(source),
    })?;
    let (sink, stream) = socket.split();
    Ok((BusReader { stream }, sink))
}

/// Inbound half of a bus connection.
pub struct BusReader {
    stream: SplitStream<Socket>,
}

impl BusReader {
    /// Waits for the next bus message; `None` once the connection is gone.
    ///
    /// Frames that are not valid bus messages are skipped.
    pub async fn next_message(&mut self) -> Option<Message> {
        loop {
            match self.stream.next().await? {
                Ok(Frame::Text(text)) => match Message::from_json(text.as_str()) {
                    Ok(msg) => return Some(msg),
                    Err(e) => debug!(error = %e, "Skipping unparsable frame"),
                },
                Ok(Frame::Close(frame)) => {
                    info!(?frame, "Bus closed the connection");
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to read from bus");
                    return None;
                }
            }
        }
    }
}

/// Outbound half of a bus connection.
pub struct BusWriter {
    stop: oneshot::Sender<()>,
    task: JoinHandle<UnboundedReceiver<Message>>,
}

impl BusWriter {
    /// Starts writing queued messages to `sink`.
    #[must_use]
    pub fn spawn(sink: BusSink, outbox_rx: UnboundedReceiver<Message>) -> Self {
        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(write_loop(sink, outbox_rx, stop_rx));
        Self { stop, task }
    }

    /// Stops the writer and returns the outbox receiver with any unsent messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer task panicked.
    pub async fn stop(self) -> Result<UnboundedReceiver<Message>, JoinError> {
        // The writer may already have ended on a write error
        drop(self.stop.send(()));
        self.task.await
    }
}

async fn write_loop(
    mut sink: BusSink,
    mut rx: UnboundedReceiver<Message>,
    mut stop: oneshot::Receiver<()>,
) -> UnboundedReceiver<Message> {
    loop {
        let msg = tokio::select! {
            biased;
            _ = &mut stop => break,
            msg = rx.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };
        let json = match msg.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, msg_type = %msg.msg_type, "Failed to serialize bus message");
                continue;
            }
        };
        if let Err(e) = sink.send(Frame::text(json)).await {
            warn!(error = %e, msg_type = %msg.msg_type, "Failed to write to bus, message dropped");
            break;
        }
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "Bus sink did not close cleanly");
    }
    rx
}
