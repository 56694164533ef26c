//! # UI Notification Boundary
//!
//! The core never renders. Results and queue outcomes that the operator
//! should see flow through [`NoticeSink`], a pass-through callback target
//! with no buffering: whatever the UI does with a notice (toast, status
//! line, nothing) is its business.
//!
//! The capture side of the boundary (barcode/QR scanner) needs no trait:
//! a successful read is just a decoded text code, and every entry point that
//! consumes one takes it as a plain `&str`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Notice
// =============================================================================

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Operation landed (locally or remotely).
    Success,
    /// Operation was blocked; the input should be redisplayed.
    Error,
    /// Neutral information (e.g. "sincronizando 3 itens...").
    Info,
}

/// A user-facing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice { kind: NoticeKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice { kind: NoticeKind::Error, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notice { kind: NoticeKind::Info, message: message.into() }
    }
}

// =============================================================================
// Sink
// =============================================================================

/// Trait for delivering notices to the UI (implemented by the embedding app).
pub trait NoticeSink: Send + Sync {
    /// Delivers one notice. Must not block.
    fn notify(&self, notice: Notice);
}

/// No-op sink for tests and headless use.
pub struct NoOpSink;

impl NoticeSink for NoOpSink {
    fn notify(&self, _notice: Notice) {}
}

// =============================================================================
// Unit Tests
// =============================================================================
