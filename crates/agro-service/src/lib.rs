//! # agro-service: Producer Lifecycle Manager
//!
//! Turns requests into validated units of work against the store.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apps/api  ──►  ProducerService<S, C>  ──►  agro-db stores              │
//! │                        │                                                │
//! │                        └──►  agro-core (validation, reconciliation)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store and the catalog are injected as generic parameters. Production
//! wires [`agro_db::SqliteStore`] into both slots; tests use
//! [`agro_db::MemoryStore`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agro_db::{Database, DbConfig};
//! use agro_service::ProducerService;
//!
//! let db = Database::new(DbConfig::new("./agro.db")).await?;
//! let service = ProducerService::new(db.store(), db.store());
//! let dashboard = service.get_dashboard_data().await?;
//! ```

pub mod error;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use service::ProducerService;
