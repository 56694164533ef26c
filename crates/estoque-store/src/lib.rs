//! # estoque-store: Local Store for Estoque
//!
//! This crate provides the durable local cache the whole system reads from
//! and writes to, online or not. It uses SQLite via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Estoque Data Flow                                │
//! │                                                                         │
//! │  Repository call (save_product, drain, ...)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   estoque-store (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  LocalStore   │    │  Collections  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │(collections.rs│    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ stock_products│    │ 001_collec-  │  │   │
//! │  │   │ WAL mode      │    │ stock_orders  │    │ tions.sql    │  │   │
//! │  │   │               │    │ sync queue    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (or :memory: in tests)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contract
//!
//! No validation, no merging, no partial patches: callers pass the complete
//! desired collection and the store replaces the stored value. The system's
//! concurrency model is single-logical-writer (one mutation in flight at a
//! time), so the store needs no locking of its own beyond the pool.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`collections`] - Keyed collection and queue access

// =============================================================================
// Module Declarations
// =============================================================================

pub mod collections;
pub mod error;
pub mod migrations;
pub mod pool;

// =============================================================================
// Re-exports
// =============================================================================

pub use collections::CollectionKind;
pub use error::{StoreError, StoreResult};
pub use pool::{LocalStore, StoreConfig};
