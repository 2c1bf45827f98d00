//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON object `{ "type": ..., "payload": { ... } }` with
//! camelCase names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::game::RoomId;
use crate::geo::{format_value, Direction, ExportRecord};
use crate::ws::transport::ConnectionId;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Enter matchmaking with a display name
    #[serde(alias = "playerJoining")]
    Join {
        #[serde(default)]
        username: Option<String>,
    },

    /// Guess the secret country of the current round
    #[serde(rename_all = "camelCase")]
    SubmitGuess {
        guess: String,
        /// Defaults to the sender's own room
        #[serde(default, alias = "roomName")]
        room_id: Option<RoomId>,
    },

    /// Vote to play another round
    #[serde(rename_all = "camelCase", alias = "requestPlayAgain")]
    RequestRematch {
        #[serde(default, alias = "roomName")]
        room_id: Option<RoomId>,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Sent once the connection is registered
    #[serde(rename_all = "camelCase")]
    Connected {
        player_id: ConnectionId,
        server_time: u64,
    },

    /// Sender is the solo waiter in the queue
    Waiting { message: String },

    /// A room was created for the two recipients
    #[serde(rename_all = "camelCase")]
    GameStart {
        players: BTreeMap<ConnectionId, String>,
        all_countries: Vec<String>,
        room_id: RoomId,
    },

    /// First clues of a new round
    NewRound { commodities: Vec<Commodity> },

    /// One more clue after an incorrect guess
    #[serde(rename_all = "camelCase")]
    AddCommodity { new_commodity: Commodity },

    /// An incorrect guess by either player
    #[serde(rename_all = "camelCase")]
    GuessResult {
        guesser_id: ConnectionId,
        guesser_name: String,
        guess: String,
        /// Kilometres, absent if the guess is not a known country
        distance: Option<f64>,
        direction: Option<Direction>,
    },

    /// Someone guessed the secret
    #[serde(rename_all = "camelCase")]
    RoundOver {
        winner_id: ConnectionId,
        winner_name: String,
        answer: String,
    },

    /// The other member disconnected; the room is gone
    OpponentLeft { message: String },
}

/// A revealed export clue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    pub name: String,
    pub value: String,
}

impl From<&ExportRecord> for Commodity {
    fn from(record: &ExportRecord) -> Self {
        Self {
            name: record.label.clone(),
            value: format_value(record.value),
        }
    }
}
