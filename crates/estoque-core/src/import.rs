//! # Bulk Order Import
//!
//! Parses the semicolon-delimited order sheet into orders, one row per
//! product line:
//!
//! ```text
//! Numero;Cliente;Filial;Matricula;Data;CodProduto;Qtd
//! 101;João;01;1234;2023-10-25;789101;2
//! 101;João;01;1234;2023-10-25;789101;1   ← same order + code: summed
//! 102;Maria;02;5678;2023-10-26;555000;1  ← unknown code: placeholder name
//! ```
//!
//! Parsing is pure: the caller supplies the known products (for display
//! names) and the fallback date, and saves the resulting orders through the
//! normal repository path - which is what queues them when offline.

use chrono::NaiveDate;

use crate::types::{Order, OrderItem, Product};

/// Note stamped on every imported order.
const IMPORT_NOTE: &str = "Importado via CSV";

// =============================================================================
// Parsing
// =============================================================================

/// Parses an import sheet into orders, aggregated by order number.
///
/// ## Rules
/// - an optional header row is skipped when its first field is not numeric
/// - rows missing the order number or the product code are skipped
/// - repeated product codes within the same order number accumulate into a
///   single item with the quantities summed
/// - unknown product codes are kept with a placeholder display name
///   (`Produto <code>`) rather than rejected
/// - an unparseable quantity falls back to 1; an unparseable date falls back
///   to `fallback_date`
///
/// Orders come back in first-seen row order.
pub fn parse_orders(text: &str, products: &[Product], fallback_date: NaiveDate) -> Vec<Order> {
    let mut orders: Vec<Order> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(';');
        let number = fields.next().unwrap_or("").trim();

        // Header row: first field is label text, not an order number.
        if index == 0 && number.parse::<i64>().is_err() {
            continue;
        }

        let customer = fields.next().unwrap_or("").trim();
        let filial = fields.next().unwrap_or("").trim();
        let matricula = fields.next().unwrap_or("").trim();
        let date_str = fields.next().unwrap_or("").trim();
        let prod_code = fields.next().unwrap_or("").trim();
        let qty_str = fields.next().unwrap_or("").trim();

        if number.is_empty() || prod_code.is_empty() {
            continue;
        }

        let qty = qty_str.parse::<i64>().unwrap_or(1);
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap_or(fallback_date);

        let prod_name = products
            .iter()
            .find(|p| p.id == prod_code)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("Produto {}", prod_code));

        let position = match orders.iter().position(|o| o.order_number == number) {
            Some(position) => position,
            None => {
                let mut order = Order::new(
                    number,
                    if customer.is_empty() { "Importado" } else { customer },
                    date,
                );
                order.filial = filial.to_string();
                order.matricula = matricula.to_string();
                order.obs = Some(IMPORT_NOTE.to_string());
                orders.push(order);
                orders.len() - 1
            }
        };
        let order = &mut orders[position];

        match order.items.iter_mut().find(|i| i.product_id == prod_code) {
            Some(item) => item.qty_requested += qty,
            None => order.items.push(OrderItem {
                product_id: prod_code.to_string(),
                product_name: prod_name,
                qty_requested: qty,
                qty_picked: 0,
            }),
        }
    }

    orders
}

// =============================================================================
// Unit Tests
// =============================================================================
