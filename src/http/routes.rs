//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.client_origins);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins, or any origin when none are set
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();
    cors.allow_origin(allowed)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connections: usize,
    active_rooms: usize,
    waiting_players: usize,
    countries: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.engine.stats();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connections: stats.connections(),
        active_rooms: stats.active_rooms(),
        waiting_players: stats.waiting_players(),
        countries: state.geo.country_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::geo::GeoDataStore;

    fn state() -> AppState {
        let geo = GeoDataStore::from_json(
            r#"{ "Chile": [{ "HS4": "Copper", "Total Trade Value": 5 }] }"#,
            r#"{ "chile": {} }"#,
        )
        .unwrap();
        let config = Config {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "info".into(),
            log_json: false,
            exports_path: "unused".into(),
            distances_path: "unused".into(),
            client_origins: Vec::new(),
            game_seed: Some(3),
        };
        AppState::new(config, geo).0
    }

    #[tokio::test]
    async fn health_reports_counters() {
        let Json(health) = health_handler(State(state())).await;

        assert_eq!(health.status, "ok");
        assert_eq!(health.countries, 1);
        assert_eq!(health.active_rooms, 0);
        assert_eq!(health.waiting_players, 0);
    }

    #[test]
    fn router_builds_with_and_without_origins() {
        let _ = build_router(state());

        let mut restricted = state();
        restricted.config = std::sync::Arc::new(Config {
            client_origins: vec!["https://play.example".into()],
            ..(*restricted.config).clone()
        });
        let _ = build_router(restricted);
    }
}
