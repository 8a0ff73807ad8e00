//! API server configuration.
//!
//! Configuration is loaded from environment variables (after `.env`, if
//! present) with fallback to defaults.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use agro_core::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// API server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Interface to listen on
    pub bind_addr: IpAddr,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Page size when a listing omits `limit`
    pub default_page_limit: i64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            bind_addr: read("AGRO_BIND_ADDR", "0.0.0.0")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("AGRO_BIND_ADDR".to_string()))?,

            port: read("AGRO_PORT", "3000")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("AGRO_PORT".to_string()))?,

            database_path: PathBuf::from(read("AGRO_DATABASE_PATH", "./agro.db")),

            db_max_connections: read("AGRO_DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("AGRO_DB_MAX_CONNECTIONS".to_string()))?,

            default_page_limit: read("AGRO_DEFAULT_PAGE_LIMIT", &DEFAULT_PAGE_LIMIT.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("AGRO_DEFAULT_PAGE_LIMIT".to_string()))?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("AGRO_DB_MAX_CONNECTIONS".to_string()));
        }

        if !(1..=MAX_PAGE_LIMIT).contains(&config.default_page_limit) {
            return Err(ConfigError::InvalidValue("AGRO_DEFAULT_PAGE_LIMIT".to_string()));
        }

        Ok(config)
    }

    /// Address the server binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
            database_path: PathBuf::from("./agro.db"),
            db_max_connections: 5,
            default_page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
