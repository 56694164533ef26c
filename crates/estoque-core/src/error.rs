//! # Error Types
//!
//! Domain-specific error types for estoque-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  estoque-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  estoque-store errors (separate crate)                                 │
//! │  └── StoreError       - Local persistence failures                     │
//! │                                                                         │
//! │  estoque-sync errors (separate crate)                                  │
//! │  ├── GatewayError     - Remote API failures (incl. Unavailable)        │
//! │  └── SyncError        - Everything a repository call can surface       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → UI                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, quantities, etc.)
//! 3. Errors are enum variants, never String
//! 4. Domain errors are never queued for later retry - only gateway
//!    unavailability is (see estoque-sync)

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They abort the operation
/// with no side effects and must be surfaced to the operator immediately -
/// the sync queue never sees them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the local cache.
    ///
    /// ## When This Occurs
    /// - A scanned/typed code does not match any cached product
    /// - Picking an order line whose product was deleted
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Offline insert of an identity that already exists locally.
    ///
    /// ## When This Occurs
    /// Only while the gateway is unavailable: a new product is saved with a
    /// code that is already present in the local collection. While online the
    /// remote store is the authority and the same save merges instead.
    #[error("Product '{id}' already exists offline")]
    Duplicate { id: String },

    /// Insufficient stock to complete an outbound transaction.
    ///
    /// ## When This Occurs
    /// - Removing more units than the product currently holds
    ///
    /// ## User Workflow
    /// ```text
    /// Outbound (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { id: "789101", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Estoque insuficiente" and redisplays the form
    /// ```
    #[error("Insufficient stock for {id}: available {available}, requested {requested}")]
    InsufficientStock {
        id: String,
        available: i64,
        requested: i64,
    },

    /// Picking a product whose stock is already zero.
    #[error("Product {0} is out of stock")]
    OutOfStock(String),

    /// The scanned product does not belong to the order being picked.
    #[error("Product {product_id} is not part of order #{order_number}")]
    ItemNotInOrder {
        order_number: String,
        product_id: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// An order needs at least one item before it can be saved.
    #[error("order must contain at least one item")]
    EmptyItems,

    /// Invalid format (e.g., unparseable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            id: "789101".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 789101: available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "matricula".to_string(),
        };
        assert_eq!(err.to_string(), "matricula is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::EmptyItems;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
