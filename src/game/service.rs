//! Engine service - the single task that drives the game engine

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::engine::GameEngine;
use crate::ws::protocol::ClientMsg;
use crate::ws::transport::{ConnectionId, Outbox};

/// Inbound event for the engine loop
#[derive(Debug)]
pub enum EngineEvent {
    /// A socket was accepted
    Connected { outbox: Outbox },
    /// A parsed client message
    Client {
        connection_id: ConnectionId,
        msg: ClientMsg,
    },
    /// The socket closed
    Disconnected { connection_id: ConnectionId },
}

/// Counters published after every event, readable without the engine
#[derive(Debug, Default)]
pub struct EngineStats {
    connections: AtomicUsize,
    active_rooms: AtomicUsize,
    waiting_players: AtomicUsize,
}

impl EngineStats {
    fn publish(&self, engine: &GameEngine) {
        self.connections.store(engine.connection_count(), Ordering::Relaxed);
        self.active_rooms.store(engine.active_rooms(), Ordering::Relaxed);
        self.waiting_players.store(engine.waiting_players(), Ordering::Relaxed);
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn active_rooms(&self) -> usize {
        self.active_rooms.load(Ordering::Relaxed)
    }

    pub fn waiting_players(&self) -> usize {
        self.waiting_players.load(Ordering::Relaxed)
    }
}

/// Cloneable handle for feeding the engine loop
#[derive(Clone)]
pub struct EngineHandle {
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    stats: Arc<EngineStats>,
}

impl EngineHandle {
    /// Queue an event; dropped with a warning if the loop has stopped
    pub fn send(&self, event: EngineEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("Engine loop stopped, dropping event");
        }
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }
}

/// Owns the engine and processes events one at a time in arrival order
pub struct EngineService {
    engine: GameEngine,
    event_rx: mpsc::UnboundedReceiver<EngineEvent>,
    stats: Arc<EngineStats>,
}

impl EngineService {
    pub fn new(engine: GameEngine) -> (Self, EngineHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let stats = Arc::new(EngineStats::default());

        let handle = EngineHandle {
            event_tx,
            stats: stats.clone(),
        };
        let service = Self {
            engine,
            event_rx,
            stats,
        };

        (service, handle)
    }

    /// Run until every handle is dropped
    pub async fn run(mut self) {
        info!("Engine loop started");

        while let Some(event) = self.event_rx.recv().await {
            self.apply(event);
            self.stats.publish(&self.engine);
        }

        info!("Engine loop stopped");
    }

    fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Connected { outbox } => self.engine.connect(outbox),
            EngineEvent::Client { connection_id, msg } => {
                self.engine.handle_message(connection_id, msg)
            }
            EngineEvent::Disconnected { connection_id } => self.engine.disconnect(connection_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoDataStore;
    use crate::ws::protocol::ServerMsg;
    use crate::ws::transport::OutboxReceiver;

    const EXPORTS: &str = r#"{ "Peru": [
        { "HS4": "Copper Ore", "Total Trade Value": 15000000000 },
        { "HS4": "Gold", "Total Trade Value": 9000000000 },
        { "HS4": "Refined Copper", "Total Trade Value": 2000000000 },
        { "HS4": "Zinc Ore", "Total Trade Value": 1500000000 }
    ] }"#;
    const DISTANCES: &str = r#"{ "peru": { "brazil": { "distance": 3140, "direction": "W" } } }"#;

    fn spawn_service() -> EngineHandle {
        let geo = GeoDataStore::from_json(EXPORTS, DISTANCES).unwrap();
        let (service, handle) = EngineService::new(GameEngine::new(Arc::new(geo), 1));
        tokio::spawn(service.run());
        handle
    }

    fn connect(handle: &EngineHandle, username: &str) -> (ConnectionId, OutboxReceiver) {
        let connection_id = ConnectionId::new();
        let (outbox, rx) = Outbox::channel(connection_id);
        handle.send(EngineEvent::Connected { outbox });
        handle.send(EngineEvent::Client {
            connection_id,
            msg: ClientMsg::Join {
                username: Some(username.to_string()),
            },
        });
        (connection_id, rx)
    }

    async fn next(rx: &mut OutboxReceiver) -> ServerMsg {
        rx.recv().await.expect("outbox closed")
    }

    #[tokio::test]
    async fn events_flow_through_the_loop_in_order() {
        let handle = spawn_service();

        let (a, mut a_rx) = connect(&handle, "ana");
        assert!(matches!(next(&mut a_rx).await, ServerMsg::Connected { .. }));
        assert!(matches!(next(&mut a_rx).await, ServerMsg::Waiting { .. }));

        let (_b, mut b_rx) = connect(&handle, "bo");
        assert!(matches!(next(&mut b_rx).await, ServerMsg::Connected { .. }));
        assert!(matches!(next(&mut b_rx).await, ServerMsg::GameStart { .. }));
        assert!(matches!(next(&mut b_rx).await, ServerMsg::NewRound { .. }));

        handle.send(EngineEvent::Client {
            connection_id: a,
            msg: ClientMsg::SubmitGuess {
                guess: "Brazil".into(),
                room_id: None,
            },
        });
        assert!(matches!(next(&mut a_rx).await, ServerMsg::GameStart { .. }));
        assert!(matches!(next(&mut a_rx).await, ServerMsg::NewRound { .. }));
        match next(&mut b_rx).await {
            ServerMsg::GuessResult {
                distance,
                guesser_id,
                ..
            } => {
                assert_eq!(guesser_id, a);
                assert_eq!(distance, Some(3140.0));
            }
            other => panic!("expected guessResult, got {other:?}"),
        }
        assert!(matches!(next(&mut b_rx).await, ServerMsg::AddCommodity { .. }));

        handle.send(EngineEvent::Disconnected { connection_id: a });
        assert!(matches!(next(&mut b_rx).await, ServerMsg::OpponentLeft { .. }));

        // Stats are published after the disconnect has been applied
        tokio::task::yield_now().await;
        assert_eq!(handle.stats().active_rooms(), 0);
        assert_eq!(handle.stats().waiting_players(), 0);
        assert_eq!(handle.stats().connections(), 1);
    }
}
