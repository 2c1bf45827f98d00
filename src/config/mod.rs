//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of plain text
    pub log_json: bool,

    /// Country -> ranked export records
    pub exports_path: PathBuf,
    /// Country pair -> distance/direction
    pub distances_path: PathBuf,

    /// Allowed client origins for CORS (empty = any origin)
    pub client_origins: Vec<String>,
    /// Fixed seed for secret selection
    pub game_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any variable source
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match var("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        let log_json = match var("LOG_FORMAT") {
            Some(format) => match format.to_ascii_lowercase().as_str() {
                "json" => true,
                "text" | "" => false,
                _ => return Err(ConfigError::Invalid("LOG_FORMAT")),
            },
            None => false,
        };

        let game_seed = match var("GAME_SEED") {
            Some(seed) => Some(
                seed.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("GAME_SEED"))?,
            ),
            None => None,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json,

            exports_path: var("EXPORTS_PATH")
                .unwrap_or_else(|| "data/data.json".to_string())
                .into(),
            distances_path: var("DISTANCES_PATH")
                .unwrap_or_else(|| "data/country_distances.json".to_string())
                .into(),

            client_origins: var("CLIENT_ORIGIN")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
            game_seed,
        })
    }
}

/// Split a comma-separated origin list, dropping blanks
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
