//! # Business Rule Validation
//!
//! Early validation of operator input, run before any remote call or cache
//! write. A validation failure aborts the operation with **no side effects**:
//! nothing reaches the gateway, the local store, or the pending queue, and
//! the UI redisplays the unsaved input.

use crate::error::ValidationError;
use crate::types::{Order, Product};

// =============================================================================
// Product
// =============================================================================

/// Validates a product before saving.
///
/// ## Rules
/// - `id` (the code) is required
/// - `name` is required
/// - `qty` must not be negative
pub fn validate_product(product: &Product) -> Result<(), ValidationError> {
    if product.id.trim().is_empty() {
        return Err(ValidationError::Required { field: "id".into() });
    }
    if product.name.trim().is_empty() {
        return Err(ValidationError::Required { field: "name".into() });
    }
    if product.qty < 0 {
        return Err(ValidationError::MustBePositive { field: "qty".into() });
    }
    Ok(())
}

// =============================================================================
// Order
// =============================================================================

/// Validates an order before saving.
///
/// ## Rules
/// - `order_number` is required
/// - `customer_name` is required
/// - at least one item
/// - no item with a negative requested or picked quantity
pub fn validate_order(order: &Order) -> Result<(), ValidationError> {
    if order.order_number.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "order_number".into(),
        });
    }
    if order.customer_name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customer_name".into(),
        });
    }
    if order.items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }
    for item in &order.items {
        if item.qty_requested < 0 || item.qty_picked < 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("items[{}].qty", item.product_id),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Stock Transaction
// =============================================================================

/// Validates a stock transaction's operator input.
///
/// ## Rules
/// - quantity must be strictly positive (direction carries the sign)
/// - operator identifier (matricula) is mandatory for any transaction
///
/// Stock sufficiency is a business rule, not input validation - it lives in
/// the stock service where the current product state is known.
pub fn validate_transaction(qty: i64, matricula: &str) -> Result<(), ValidationError> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive { field: "qty".into() });
    }
    if matricula.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "matricula".into(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderItem;
    use chrono::NaiveDate;

    fn valid_product() -> Product {
        Product {
            id: "789101".into(),
            name: "Caneta Azul".into(),
            qty: 10,
        }
    }

    #[test]
    fn test_product_requires_code_and_name() {
        assert!(validate_product(&valid_product()).is_ok());

        let mut p = valid_product();
        p.id = "  ".into();
        assert!(matches!(
            validate_product(&p),
            Err(ValidationError::Required { field }) if field == "id"
        ));

        let mut p = valid_product();
        p.name = String::new();
        assert!(matches!(
            validate_product(&p),
            Err(ValidationError::Required { field }) if field == "name"
        ));
    }

    #[test]
    fn test_product_rejects_negative_stock() {
        let mut p = valid_product();
        p.qty = -1;
        assert!(validate_product(&p).is_err());
    }

    #[test]
    fn test_order_requires_number_customer_and_items() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 25).unwrap();
        let mut order = Order::new("101", "João", date);
        assert!(matches!(validate_order(&order), Err(ValidationError::EmptyItems)));

        order.items.push(OrderItem {
            product_id: "789101".into(),
            product_name: "Caneta Azul".into(),
            qty_requested: 2,
            qty_picked: 0,
        });
        assert!(validate_order(&order).is_ok());

        order.order_number = String::new();
        assert!(validate_order(&order).is_err());
    }

    #[test]
    fn test_transaction_requires_operator() {
        assert!(validate_transaction(1, "007").is_ok());
        assert!(matches!(
            validate_transaction(1, "   "),
            Err(ValidationError::Required { field }) if field == "matricula"
        ));
        assert!(validate_transaction(0, "007").is_err());
        assert!(validate_transaction(-2, "007").is_err());
    }
}
