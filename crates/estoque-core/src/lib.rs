//! # estoque-core: Pure Business Logic for Estoque
//!
//! This crate is the **heart** of the Estoque inventory tracker. It contains
//! all business rules as pure functions and types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Estoque Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI (external collaborator)                   │   │
//! │  │    Product list ──► Scanner ──► Picking ──► History            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    estoque-sync (repositories)                  │   │
//! │  │    write-through with fallback, pending queue, drain           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ estoque-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ validation│  │   note    │  │  import   │  │   │
//! │  │   │  Product  │  │   rules   │  │ [Mat: id] │  │  export   │  │   │
//! │  │   │   Order   │  │  checks   │  │   codec   │  │   CSV     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Movement, Order, PendingMutation)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`note`] - Operator-tag codec for movement notes
//! - [`import`] - Bulk order import (semicolon CSV)
//! - [`export`] - CSV report formatting
//! - [`boundary`] - Notification boundary towards the UI
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Explicit Errors**: All errors are typed, never strings or panics
//! 4. **Local cache is the read-of-record**: these types serialize unchanged
//!    into the local store; the wire mapping lives in estoque-sync

// =============================================================================
// Module Declarations
// =============================================================================

pub mod boundary;
pub mod error;
pub mod export;
pub mod import;
pub mod note;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use estoque_core::Product` instead of
// `use estoque_core::types::Product`

pub use boundary::{Notice, NoticeKind, NoticeSink, NoOpSink};
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Stock level at or below which a product is flagged as running low.
///
/// Used by UI layers to badge products; not enforced by any rule here.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Remote movement history reads are capped at this many rows.
///
/// The history screen only ever shows recent activity; full exports go
/// through the local collection instead.
pub const MOVEMENT_FETCH_LIMIT: u32 = 200;
