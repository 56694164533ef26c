//! # Sync Error Types
//!
//! Error types for gateway and sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   GatewayError  │  │    SyncError    │  │   Queueing boundary     │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Unavailable    │  │  Domain         │  │  Unavailable → queue    │ │
//! │  │  SchemaMismatch │  │  Remote         │  │  Everything else →      │ │
//! │  │  Api            │  │  Store          │  │  surface to the caller  │ │
//! │  │  Transport      │  │  Serialization  │  │  immediately            │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! - Error classification is typed and decided inside the gateway
//!   implementation - callers never inspect free text
//! - A remote error while the gateway is AVAILABLE is a data problem and is
//!   surfaced immediately; only unavailability defers work to the queue

use thiserror::Error;

use estoque_core::{CoreError, ValidationError};
use estoque_store::StoreError;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Result type alias for sync/repository operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// Gateway Error
// =============================================================================

/// Remote gateway failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No handle is established. The only error that queues work.
    ///
    /// Raised immediately when a call is attempted while disconnected - no
    /// network round-trip happens.
    #[error("Remote store is unavailable")]
    Unavailable,

    /// The backend rejected a scalar where its schema expects an array.
    ///
    /// Classified here, inside the gateway, from the API response; the
    /// insert/upsert path retries exactly once with the quirk column wrapped
    /// as a single-element array. Never escapes a successful retry.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The API rejected the request (constraint violation, bad payload...).
    #[error("Remote API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request never completed (DNS, TLS, timeout, connection reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The configured endpoint could not be parsed.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::InvalidEndpoint(err.to_string())
    }
}

// =============================================================================
// Sync Error
// =============================================================================

/// Everything a repository or engine call can surface.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Business rule violation (duplicate, insufficient stock, validation...).
    /// Surfaced immediately, never queued.
    #[error("{0}")]
    Domain(#[from] CoreError),

    /// Remote gateway failure. `Unavailable` is handled inside the
    /// repositories (it triggers queueing); anything else reaching the
    /// caller means the remote rejected the data while reachable.
    #[error("{0}")]
    Remote(#[from] GatewayError),

    /// Local store failure (infrastructure, not business).
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    /// Queue payload (de)serialization failed.
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid or unreadable configuration.
    #[error("Invalid sync configuration: {0}")]
    Config(String),
}

impl From<ValidationError> for SyncError {
    fn from(err: ValidationError) -> Self {
        SyncError::Domain(CoreError::Validation(err))
    }
}

impl SyncError {
    /// True when the failure is a business rule the operator can act on
    /// (as opposed to infrastructure).
    pub fn is_domain(&self) -> bool {
        matches!(self, SyncError::Domain(_))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
