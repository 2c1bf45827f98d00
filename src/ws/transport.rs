//! Per-connection outbound channel
//!
//! The socket writer task owns the receiving end; the engine holds an
//! [`Outbox`] and pushes events without waiting on the network.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

/// Transport-assigned connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Receiving end drained by the socket writer
pub type OutboxReceiver = mpsc::UnboundedReceiver<ServerMsg>;

/// Sending half of a connection's outbound channel
#[derive(Debug, Clone)]
pub struct Outbox {
    connection_id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerMsg>,
}

impl Outbox {
    /// Create an outbox for a connection along with its receiver
    pub fn channel(connection_id: ConnectionId) -> (Self, OutboxReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { connection_id, tx }, rx)
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Fire-and-forget send.
    ///
    /// A closed channel means the socket is going away; its disconnect event
    /// will follow, so the failure is only logged.
    pub fn send(&self, msg: ServerMsg) {
        if self.tx.send(msg).is_err() {
            debug!(connection_id = %self.connection_id, "Outbox closed, dropping message");
        }
    }
}
