//! # Repository Module
//!
//! SQLite query code for the producer registry.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CropRepository        catalog reads (find_all, find_by_ids)            │
//! │  ProducerRepository    pooled reads (pages, aggregates)                 │
//! │  producer::queries     statements shared by the pool and a transaction  │
//! │                        (take `&mut SqliteConnection`)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every statement binds its values; identifiers that vary (aggregate
//! columns) come from closed enums, never from input.

pub mod crop;
pub mod producer;
