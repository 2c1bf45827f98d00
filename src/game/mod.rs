//! Game rooms, rounds and the engine that drives them

pub mod engine;
pub mod room;
pub mod round;
pub mod service;

pub use engine::GameEngine;
pub use room::RoomId;
pub use service::{EngineEvent, EngineHandle, EngineService};
