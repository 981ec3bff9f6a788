//! Connection to the assistant's message bus.

mod client;

pub use client::*;

pub use enclosure_common::{Message, Topic};
use tokio::sync::mpsc;

/// Queue of messages waiting to be written to the bus.
///
/// Messages queued while disconnected are written after the next successful connect.
pub type Outbox = mpsc::UnboundedSender<Message>;
