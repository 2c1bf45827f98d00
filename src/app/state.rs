//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{EngineHandle, EngineService, GameEngine};
use crate::geo::GeoDataStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub geo: Arc<GeoDataStore>,
    pub engine: EngineHandle,
}

impl AppState {
    /// Build the state and the engine service that must be spawned to serve it
    pub fn new(config: Config, geo: GeoDataStore) -> (Self, EngineService) {
        let config = Arc::new(config);
        let geo = Arc::new(geo);

        let seed = config.game_seed.unwrap_or_else(rand::random::<u64>);
        let (service, engine) = EngineService::new(GameEngine::new(geo.clone(), seed));

        let state = Self {
            config,
            geo,
            engine,
        };

        (state, service)
    }
}
