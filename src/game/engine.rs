//! Game engine: matchmaking, round lifecycle and guess evaluation
//!
//! The engine owns the match queue, the room registry and the table of live
//! connections. Every transition happens inside one `&mut self` call, so a
//! single task driving the engine gives strictly ordered, lock-free state
//! changes.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::room::{Member, RoomId, RoomRegistry};
use super::round::RoundPhase;
use crate::geo::GeoDataStore;
use crate::matchmaking::{MatchQueue, Offer};
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, Commodity, ServerMsg};
use crate::ws::transport::{ConnectionId, Outbox};

/// Name used when a player joins without one
pub const DEFAULT_NAME: &str = "Anonymous";
/// Display names are cut to this many characters
pub const MAX_NAME_CHARS: usize = 15;

pub const WAITING_MESSAGE: &str = "Waiting for an opponent...";
pub const OPPONENT_LEFT_MESSAGE: &str =
    "Your opponent has disconnected. Please refresh to find a new game.";

/// A live connection known to the engine
#[derive(Debug)]
struct Connection {
    outbox: Outbox,
    /// Set by `join`
    display_name: Option<String>,
}

/// The authoritative game state machine
pub struct GameEngine {
    geo: Arc<GeoDataStore>,
    queue: MatchQueue,
    rooms: RoomRegistry,
    connections: HashMap<ConnectionId, Connection>,
    rng: ChaCha8Rng,
}

impl GameEngine {
    pub fn new(geo: Arc<GeoDataStore>, seed: u64) -> Self {
        Self {
            geo,
            queue: MatchQueue::new(),
            rooms: RoomRegistry::new(),
            connections: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Register a new connection and tell it its identifier
    pub fn connect(&mut self, outbox: Outbox) {
        let connection_id = outbox.connection_id();
        info!(connection_id = %connection_id, "Player connected");

        outbox.send(ServerMsg::Connected {
            player_id: connection_id,
            server_time: unix_millis(),
        });
        self.connections.insert(
            connection_id,
            Connection {
                outbox,
                display_name: None,
            },
        );
    }

    /// Dispatch an inbound client message
    pub fn handle_message(&mut self, connection_id: ConnectionId, msg: ClientMsg) {
        match msg {
            ClientMsg::Join { username } => self.join(connection_id, username.as_deref()),
            ClientMsg::SubmitGuess { guess, room_id } => {
                self.handle_guess(connection_id, room_id.as_ref(), &guess)
            }
            ClientMsg::RequestRematch { room_id } => {
                self.request_rematch(connection_id, room_id.as_ref())
            }
        }
    }

    /// Set the display name and enter matchmaking
    pub fn join(&mut self, connection_id: ConnectionId, username: Option<&str>) {
        if self.queue.is_waiting(connection_id)
            || self.rooms.find_room_by_connection(connection_id).is_some()
        {
            debug!(
                connection_id = %connection_id,
                "Ignoring join from a matched or waiting player"
            );
            return;
        }

        let Some(connection) = self.connections.get_mut(&connection_id) else {
            debug!(connection_id = %connection_id, "Ignoring join from unknown connection");
            return;
        };

        let name = display_name(username);
        info!(connection_id = %connection_id, username = %name, "Player set username");
        connection.display_name = Some(name);

        match self.queue.offer(connection_id) {
            Offer::Waiting => {
                info!(connection_id = %connection_id, "Player is waiting for an opponent");
                self.send_to(
                    connection_id,
                    ServerMsg::Waiting {
                        message: WAITING_MESSAGE.to_string(),
                    },
                );
            }
            Offer::Matched {
                waiting,
                arriving,
                waited,
            } => {
                let first = self.member(waiting);
                let second = self.member(arriving);
                let room_id = self.rooms.create(first, second);

                let Some(room) = self.rooms.get(&room_id) else {
                    return;
                };
                info!(
                    room_id = %room_id,
                    first = %room.members[0].display_name,
                    second = %room.members[1].display_name,
                    waited_ms = waited.as_millis() as u64,
                    "Game starting"
                );

                let start = ServerMsg::GameStart {
                    players: room.players(),
                    all_countries: self.geo.guessable_countries().to_vec(),
                    room_id: room_id.clone(),
                };
                self.broadcast(room.member_ids(), start);

                self.start_round(&room_id);
            }
        }
    }

    /// Pick a fresh secret and send the opening clues to both members
    pub fn start_round(&mut self, room_id: &RoomId) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let Some((answer, exports)) = self.geo.pick_secret(&mut self.rng) else {
            return;
        };

        let commodities: Vec<Commodity> = room
            .round
            .begin(answer.to_string(), exports.to_vec())
            .iter()
            .map(Commodity::from)
            .collect();

        debug!(room_id = %room_id, answer = %answer, "New round");
        let members = room.member_ids();
        self.broadcast(members, ServerMsg::NewRound { commodities });
    }

    /// Evaluate a guess in the sender's active round
    pub fn handle_guess(
        &mut self,
        connection_id: ConnectionId,
        requested: Option<&RoomId>,
        guess: &str,
    ) {
        let Some(room_id) = self.resolve_room(connection_id, requested) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        if room.round.phase() != RoundPhase::Active {
            debug!(
                room_id = %room_id,
                connection_id = %connection_id,
                "Guess outside an active round"
            );
            return;
        }

        let members = room.member_ids();
        let guesser_name = room
            .member(connection_id)
            .map(|m| m.display_name.clone())
            .unwrap_or_default();
        let answer = room.round.answer().unwrap_or_default().to_string();

        if room.round.matches_answer(guess) {
            room.round.finish(connection_id);
            info!(room_id = %room_id, winner = %guesser_name, "Round won");

            self.broadcast(
                members,
                ServerMsg::RoundOver {
                    winner_id: connection_id,
                    winner_name: guesser_name,
                    answer,
                },
            );
            return;
        }

        let leg = self.geo.distance_and_direction(&answer, guess);
        let new_commodity = room.round.reveal_next().map(Commodity::from);
        info!(
            room_id = %room_id,
            guesser = %guesser_name,
            guess = %guess,
            revealed = room.round.revealed(),
            visible = room.round.visible_clues(),
            "Incorrect guess"
        );

        self.broadcast(
            members,
            ServerMsg::GuessResult {
                guesser_id: connection_id,
                guesser_name,
                guess: guess.to_string(),
                distance: leg.distance,
                direction: leg.direction,
            },
        );
        if let Some(new_commodity) = new_commodity {
            self.broadcast(members, ServerMsg::AddCommodity { new_commodity });
        }
    }

    /// Record a rematch vote; both members voting starts the next round
    pub fn request_rematch(&mut self, connection_id: ConnectionId, requested: Option<&RoomId>) {
        let Some(room_id) = self.resolve_room(connection_id, requested) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };

        if let RoundPhase::Over { winner } = room.round.phase() {
            debug!(
                room_id = %room_id,
                last_winner = %winner,
                "Rematch vote after a finished round"
            );
        }
        let votes = room.round.vote_rematch(connection_id);
        info!(room_id = %room_id, connection_id = %connection_id, votes, "Rematch requested");

        if votes == room.members.len() {
            info!(room_id = %room_id, "Both players ready, starting new round");
            self.start_round(&room_id);
        }
    }

    /// Drop a connection, tearing down its room if it had one
    pub fn disconnect(&mut self, connection_id: ConnectionId) {
        let connection = self.connections.remove(&connection_id);
        info!(
            connection_id = %connection_id,
            username = connection.as_ref().and_then(|c| c.display_name.as_deref()).unwrap_or(""),
            "Player disconnected"
        );

        if self.queue.remove_if_waiting(connection_id) {
            info!(connection_id = %connection_id, "The waiting player disconnected");
            return;
        }

        let Some(room) = self.rooms.find_room_by_connection(connection_id) else {
            return;
        };
        let room_id = room.id.clone();

        if let Some(opponent) = room.opponent_of(connection_id) {
            self.send_to(
                opponent.connection_id,
                ServerMsg::OpponentLeft {
                    message: OPPONENT_LEFT_MESSAGE.to_string(),
                },
            );
        }

        self.rooms.destroy(&room_id);
        info!(room_id = %room_id, "Cleaned up room after player disconnection");
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.active_rooms()
    }

    pub fn waiting_players(&self) -> usize {
        self.queue.len()
    }

    /// The sender's own room, if the request names it (or names nothing)
    fn resolve_room(
        &self,
        connection_id: ConnectionId,
        requested: Option<&RoomId>,
    ) -> Option<RoomId> {
        let Some(room) = self.rooms.find_room_by_connection(connection_id) else {
            debug!(connection_id = %connection_id, "Action from a player without a room");
            return None;
        };

        match requested {
            Some(requested) if *requested != room.id => {
                debug!(
                    connection_id = %connection_id,
                    requested = %requested,
                    "Action names a room the player is not in"
                );
                None
            }
            _ => Some(room.id.clone()),
        }
    }

    fn member(&self, connection_id: ConnectionId) -> Member {
        let display_name = self
            .connections
            .get(&connection_id)
            .and_then(|c| c.display_name.clone())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        Member {
            connection_id,
            display_name,
        }
    }

    fn send_to(&self, connection_id: ConnectionId, msg: ServerMsg) {
        if let Some(connection) = self.connections.get(&connection_id) {
            connection.outbox.send(msg);
        }
    }

    fn broadcast(&self, members: [ConnectionId; 2], msg: ServerMsg) {
        for connection_id in members {
            self.send_to(connection_id, msg.clone());
        }
    }
}

/// Trimmed and capped display name, or the default when blank
fn display_name(username: Option<&str>) -> String {
    match username.map(str::trim) {
        Some(name) if !name.is_empty() => name.chars().take(MAX_NAME_CHARS).collect(),
        _ => DEFAULT_NAME.to_string(),
    }
}
