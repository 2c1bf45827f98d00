//! Matchmaking: pairing waiting connections

pub mod queue;

pub use queue::{MatchQueue, Offer};
