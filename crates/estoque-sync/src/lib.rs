//! # estoque-sync: Offline Synchronization Layer
//!
//! This crate implements the local-first data path for Estoque:
//!
//! - reads are always served and writes always accepted against the local
//!   cache, connected or not;
//! - mutations that could not reach the remote store are queued, in order;
//! - on reconnect the queue is drained through the same repository entry
//!   points, with per-item failure tolerance, and the cache is refreshed
//!   from the remote source of truth.
//!
//! ## Write-Through With Fallback
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Repository Save                                  │
//! │                                                                         │
//! │  validate ──► gateway available?                                        │
//! │                   │                                                     │
//! │        ┌─── yes ──┴── no ───┐                                           │
//! │        ▼                    ▼                                           │
//! │  remote command       duplicate check                                   │
//! │        │                    │                                           │
//! │   ok?──┤                    ▼                                           │
//! │    no  │ yes          local cache write                                 │
//! │    ▼   ▼                    │                                           │
//! │  error local cache          ▼                                           │
//! │  (no   write          enqueue PendingMutation                           │
//! │  cache      │               │                                           │
//! │  write)     ▼               ▼                                           │
//! │          success      success ("pending delivery")                      │
//! │                                                                         │
//! │  POLICY: the local cache is the UI's read-of-record; the remote store   │
//! │  is eventually consistent through the queue. A remote error while       │
//! │  AVAILABLE is a data problem - surfaced hard, never queued. Only        │
//! │  UNAVAILABILITY queues.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`gateway`] - `RemoteGateway` trait, collections, tagged commands
//! - [`rest`] - REST implementation (hosted data API)
//! - [`rows`] - domain ⇄ wire row conversions
//! - [`engine`] - pending queue lifecycle (enqueue + drain)
//! - [`repository`] - write-through entity repositories + stock service
//! - [`agent`] - reconnect/refresh orchestration
//! - [`config`] - gateway configuration (TOML + env)
//! - [`error`] - gateway and sync error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod repository;
pub mod rest;
pub mod rows;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::SyncAgent;
pub use config::GatewayConfig;
pub use engine::{DrainOutcome, SyncEngine};
pub use error::{GatewayError, GatewayResult, SyncError, SyncResult};
pub use gateway::{Collection, Command, Query, RemoteGateway};
pub use repository::{
    MovementRepository, OrderRepository, PickOutcome, ProductRepository, Repositories,
    StockDirection, StockService,
};
pub use rest::RestGateway;
