//! # Remote Gateway Abstraction
//!
//! The seam between the sync layer and the hosted data API. Everything above
//! this trait is testable against an in-memory implementation; the real one
//! lives in [`crate::rest`].
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Gateway Contract                                  │
//! │                                                                         │
//! │  AVAILABILITY IS EXPLICIT STATE                                        │
//! │  ──────────────────────────────                                        │
//! │  connect()    establishes the handle  → is_available() == true         │
//! │  disconnect() tears it down           → is_available() == false        │
//! │  A call while unavailable fails immediately with Unavailable -         │
//! │  no per-call probing, no hidden global client.                         │
//! │                                                                         │
//! │  ONE DISPATCH, TAGGED COMMANDS                                         │
//! │  ─────────────────────────────                                         │
//! │  execute(Products, Insert(row))      POST                              │
//! │  execute(Products, Upsert(row))      POST + merge-duplicates           │
//! │  execute(Orders,   Update{id, ...})  PATCH ?id=eq.<id>                 │
//! │  execute(Orders,   Delete{id})       DELETE ?id=eq.<id>                │
//! │  query(Movements,  Query{...})       GET ?order=...&limit=...          │
//! │  purge(Movements,  ceiling)          DELETE ?created_at=lte.<ceiling>  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::GatewayResult;

// =============================================================================
// Collections
// =============================================================================

/// The three server-side collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Movements,
    Orders,
}

impl Collection {
    /// Remote table name.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Movements => "movements",
            Collection::Orders => "orders",
        }
    }

    /// Column the quirky backend schema types as an array.
    ///
    /// When an insert/upsert is rejected with a scalar-vs-array mismatch,
    /// this is the column the gateway wraps before its single retry.
    pub(crate) fn quirk_column(&self) -> Option<&'static str> {
        match self {
            Collection::Products => Some("id"),
            Collection::Movements => Some("prod_id"),
            Collection::Orders => None,
        }
    }

    /// Date column used by [`RemoteGateway::purge`].
    pub(crate) fn date_column(&self) -> &'static str {
        match self {
            Collection::Products => "created_at",
            Collection::Movements => "created_at",
            Collection::Orders => "date",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

// =============================================================================
// Commands
// =============================================================================

/// A tagged mutation command, dispatched by [`RemoteGateway::execute`].
///
/// One tagged type instead of per-call boolean flags keeps the drain path
/// reusable: replaying a queued mutation rebuilds the same command the live
/// path would have sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a new row. Fails on identity conflicts.
    Insert(Value),
    /// Insert-or-replace by identity. Preferred for idempotent retries.
    Upsert(Value),
    /// Partial update of the row with the given identity.
    Update { id: String, fields: Value },
    /// Delete the row with the given identity.
    Delete { id: String },
}

impl Command {
    /// Short verb for log lines.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Insert(_) => "insert",
            Command::Upsert(_) => "upsert",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// A filtered/sorted read.
#[derive(Debug, Clone)]
pub struct Query {
    /// Column to order by.
    pub order_by: &'static str,

    /// Descending order (default ascending).
    pub descending: bool,

    /// Row cap, if any.
    pub limit: Option<u32>,
}

impl Query {
    /// Ascending query on `column`, no limit.
    pub fn order_by(column: &'static str) -> Self {
        Query {
            order_by: column,
            descending: false,
            limit: None,
        }
    }

    /// Switches to descending order.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Caps the number of returned rows.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// Gateway Trait
// =============================================================================

/// Abstraction over the hosted network data API.
///
/// Owned by the engine/repositories as an `Arc<dyn RemoteGateway>` - there
/// is no process-wide client instance. The handle is constructed on
/// `connect` and torn down or replaced on `disconnect`.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Whether a handle is currently established.
    fn is_available(&self) -> bool;

    /// (Re)establishes the handle. On success `is_available` becomes true.
    async fn connect(&self) -> GatewayResult<()>;

    /// Tears the handle down. Subsequent calls fail fast with `Unavailable`.
    fn disconnect(&self);

    /// Executes one mutation command against a collection.
    async fn execute(&self, collection: Collection, command: Command) -> GatewayResult<()>;

    /// Runs a sorted/limited read against a collection.
    async fn query(&self, collection: Collection, query: Query) -> GatewayResult<Vec<Value>>;

    /// Bulk-deletes every row whose date column is at or below `ceiling`.
    async fn purge(&self, collection: Collection, ceiling: DateTime<Utc>) -> GatewayResult<()>;
}

// =============================================================================
// Unit Tests
// =============================================================================
