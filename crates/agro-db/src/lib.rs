//! # agro-db: Store Layer for the Producer Registry
//!
//! Persistence for producers, crops and their associations, behind the
//! store traits the service is written against.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Agro Registry Data Flow                          │
//! │                                                                         │
//! │  ProducerService<S: ProducerStore, C: CropCatalog>                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     agro-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   store.rs    │    │  repository/  │    │  Migrations  │  │   │
//! │  │   │ traits        │    │ producer.rs   │    │  (embedded)  │  │   │
//! │  │   │ SqliteStore   │───►│ crop.rs       │    │ 001 producers│  │   │
//! │  │   └───────────────┘    └───────────────┘    │ 002 crops    │  │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    │ 003 assoc.   │  │   │
//! │  │   │  memory.rs    │    │   pool.rs     │    └──────────────┘  │   │
//! │  │   │ MemoryStore   │    │ Database      │                      │   │
//! │  │   └───────────────┘    └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (AGRO_DATABASE_PATH)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQL for producers and crops
//! - [`store`] - Store traits and the SQLite implementation
//! - [`memory`] - In-memory store for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agro_db::{Database, DbConfig, ProducerStore, ProducerTransaction};
//!
//! let db = Database::new(DbConfig::new("./agro.db")).await?;
//! let store = db.store();
//!
//! let mut tx = store.begin().await?;
//! tx.create_producer(&producer).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, PRODUCER_DOCUMENT_COLUMN};
pub use memory::{MemoryStore, MemoryTransaction};
pub use pool::{Database, DbConfig};
pub use store::{
    AreaField, CropCatalog, GroupCount, GroupField, ProducerStore, ProducerTransaction,
    SqliteStore, SqliteTransaction,
};

pub use repository::crop::CropRepository;
pub use repository::producer::ProducerRepository;
