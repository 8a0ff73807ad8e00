//! # agro-core: Pure Business Logic for the Producer Registry
//!
//! This crate holds the rules of the registry as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Agro Registry Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    /producers, /producers/dashboard, /crops, /status            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                agro-service (ProducerService)                   │   │
//! │  │    create, find_all, find_one, update, remove, dashboard        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ agro-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   area    │  │ document  │  │ validation│  │   │
//! │  │   │ Producer  │  │   Area    │  │ CPF/CNPJ  │  │ reconcile │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    agro-db (Store Layer)                        │   │
//! │  │          SQLite + in-memory stores, migrations, transactions    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Producer, Crop, inputs, dashboard)
//! - [`area`] - Area type with integer arithmetic
//! - [`document`] - CPF/CNPJ checksums
//! - [`reconcile`] - Crop-set diffing for updates
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use agro_core::area::Area;
//! use agro_core::validation::validate_area_consistency;
//!
//! let total = Area::from_hectares(100.0).unwrap();
//! let agricultural = Area::from_hectares(70.0).unwrap();
//! let vegetation = Area::from_hectares(30.0).unwrap();
//!
//! assert!(validate_area_consistency(total, agricultural, vegetation).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod area;
pub mod document;
pub mod error;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use area::Area;
pub use error::{CoreError, CoreResult, ValidationError};
pub use reconcile::{plan_crop_changes, CropChanges};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page used when a listing request omits `page`.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when a listing request omits `limit`.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page size a listing will return.
pub const MAX_PAGE_LIMIT: i64 = 100;
