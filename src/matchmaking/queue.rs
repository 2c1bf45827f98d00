//! Single-slot matchmaking queue

use std::time::{Duration, Instant};

use crate::ws::transport::ConnectionId;

/// Connection parked in the queue
#[derive(Debug, Clone)]
pub struct WaitingPlayer {
    pub connection_id: ConnectionId,
    pub queued_at: Instant,
}

impl WaitingPlayer {
    fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            queued_at: Instant::now(),
        }
    }

    /// How long this player has been waiting
    pub fn wait_time(&self) -> Duration {
        self.queued_at.elapsed()
    }
}

/// Result of offering a connection to the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offer {
    /// Nobody was waiting; the connection now holds the slot
    Waiting,
    /// Paired with the connection that was already waiting
    Matched {
        waiting: ConnectionId,
        arriving: ConnectionId,
        waited: Duration,
    },
}

/// The matchmaking queue.
///
/// Holds at most one waiting connection. A second arrival is paired with it
/// immediately and the slot is cleared in the same step.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: Option<WaitingPlayer>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair with the waiting connection, or take the slot
    pub fn offer(&mut self, connection_id: ConnectionId) -> Offer {
        match self.waiting.take() {
            Some(waiting) if waiting.connection_id != connection_id => Offer::Matched {
                waiting: waiting.connection_id,
                arriving: connection_id,
                waited: waiting.wait_time(),
            },
            // Re-offering the current waiter keeps its original place
            Some(waiting) => {
                self.waiting = Some(waiting);
                Offer::Waiting
            }
            None => {
                self.waiting = Some(WaitingPlayer::new(connection_id));
                Offer::Waiting
            }
        }
    }

    /// Clear the slot if this exact connection holds it
    pub fn remove_if_waiting(&mut self, connection_id: ConnectionId) -> bool {
        if self.is_waiting(connection_id) {
            self.waiting = None;
            true
        } else {
            false
        }
    }

    /// Check if a connection holds the slot
    pub fn is_waiting(&self, connection_id: ConnectionId) -> bool {
        self.waiting
            .as_ref()
            .is_some_and(|p| p.connection_id == connection_id)
    }

    /// Get queue length (0 or 1)
    pub fn len(&self) -> usize {
        usize::from(self.waiting.is_some())
    }
}
