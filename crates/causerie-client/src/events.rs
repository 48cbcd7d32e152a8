//! Engine-to-host event bus.
//!
//! A closed set of notifications flows outward over a broadcast channel.
//! Delivery is fire-and-forget and at-most-once: a subscriber that lags or
//! arrives late simply misses events, there is no replay.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// How many events a lagging subscriber may fall behind before it starts
/// missing them.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Everything the engine tells the outside world.
///
/// Serializes with kebab-case tags (`new-messages`, `server-error`, ...) so
/// hosts can forward events over IPC untouched.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChatEvent {
    /// The stored history has been loaded into the log on cold start.
    MessagesLoaded,
    /// New messages were appended; the log grew from `initial_size` to
    /// `updated_size`, so a renderer can insert exactly that range.
    NewMessages {
        initial_size: usize,
        updated_size: usize,
    },
    /// The image payload of the log entry at `index` became displayable.
    NewImage { index: usize },
    /// An outbound send failed in a way that is not worth retrying.
    SendFailed { reason: String },
    /// The server reported a 5xx class error.
    ServerError,
    NotFound { reason: String },
    Conflict { reason: String },
    PayloadTooLarge { reason: String },
    /// Generic user-visible error (e.g. an empty outbound message).
    GenericError { reason: String },
}

/// Fan-out handle the engine publishes through.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChatEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.tx.subscribe()
    }

    /// Emit one event.  A send error only means nobody is listening.
    pub fn emit(&self, event: ChatEvent) {
        if self.tx.send(event).is_err() {
            debug!("event dropped, no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
