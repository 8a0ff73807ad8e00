//! # agro-api: Producer Registry HTTP Server
//!
//! Exposes [`agro_service::ProducerService`] over HTTP with JSON bodies.
//!
//! ## Routes
//! ```text
//! POST   /producers              register a producer          201
//! GET    /producers?page&limit   one page, insertion order    200
//! GET    /producers/dashboard    aggregate figures            200
//! GET    /producers/{id}         one producer with crops      200 / 404
//! PATCH  /producers/{id}         partial update               200 / 404
//! DELETE /producers/{id}         remove with associations     204 / 404
//! GET    /crops                  the crop catalog             200
//! GET    /status                 liveness and database ping   200 / 503
//! ```
//!
//! Errors share one body shape, see [`error::ApiError`].

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ErrorCode};
pub use routes::build_router;
pub use state::AppState;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,agro=debug";
