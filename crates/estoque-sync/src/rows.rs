//! # Wire Row Conversions
//!
//! Mapping between the domain types and the hosted API's rows. All remote
//! quirks live here so repositories and the engine stay wire-agnostic:
//!
//! - snake_case columns (`order_number`, `envio_malote`, ...)
//! - the operator tag folded into / out of the movement note
//! - array-typed ids unwrapped to their first element on read
//! - order status normalized against the completion invariant on read
//! - order items serialized with their legacy camelCase field names, which
//!   is what every deployed row already contains
//!
//! ## Field Mapping (movements)
//! ```text
//! Movement                →  movements row
//! ─────────────────────────────────────────
//! id                      →  (server-assigned on insert)
//! date                    →  created_at
//! prod_id                 →  prod_id        (array-wrapped on retry)
//! prod_name               →  prod_name
//! qty                     →  qty
//! obs + matricula         →  obs ("[Mat: <id>] <obs>")
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

use estoque_core::{note, Movement, Order, OrderItem, OrderStatus, Product};

// =============================================================================
// Helpers
// =============================================================================

/// Reads a string column that the quirky schema may store as an array,
/// unwrapping to the first element.
fn unwrap_quirk(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn str_column(row: &Value, column: &str) -> Option<String> {
    row.get(column).and_then(Value::as_str).map(str::to_string)
}

// =============================================================================
// Products
// =============================================================================

/// Product → wire row.
pub fn product_to_row(product: &Product) -> Value {
    json!({
        "id": product.id,
        "name": product.name,
        "qty": product.qty,
    })
}

/// Wire row → Product. Rows without a usable id or name are dropped.
pub fn product_from_row(row: &Value) -> Option<Product> {
    let id = unwrap_quirk(row.get("id"))?;
    let name = str_column(row, "name")?;
    let qty = row.get("qty").and_then(Value::as_i64).unwrap_or(0);
    Some(Product { id, name, qty })
}

// =============================================================================
// Movements
// =============================================================================

/// Movement → wire row. The operator tag is folded into the note here; the
/// movement id stays local (the server assigns its own).
pub fn movement_to_row(movement: &Movement) -> Value {
    let obs = note::encode(movement.matricula.as_deref(), movement.obs.as_deref());
    json!({
        "prod_id": movement.prod_id,
        "prod_name": movement.prod_name,
        "qty": movement.qty,
        "obs": obs,
        "created_at": movement.date.to_rfc3339(),
    })
}

/// Wire row → Movement.
///
/// An explicit `matricula` column wins when the backend grows one; otherwise
/// the operator tag is decoded out of the note. Rows without a parseable
/// timestamp are dropped.
pub fn movement_from_row(row: &Value) -> Option<Movement> {
    let date = str_column(row, "created_at")
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))?;

    let raw_obs = str_column(row, "obs");
    let explicit = str_column(row, "matricula").filter(|m| !m.is_empty());
    let (matricula, obs) = match explicit {
        Some(mat) => (Some(mat), raw_obs),
        None => note::decode(raw_obs.as_deref()),
    };

    Some(Movement {
        id: row.get("id").and_then(Value::as_i64).unwrap_or(0),
        date,
        prod_id: unwrap_quirk(row.get("prod_id")),
        prod_name: str_column(row, "prod_name").unwrap_or_default(),
        qty: row.get("qty").and_then(Value::as_i64).unwrap_or(0),
        obs,
        matricula,
    })
}

// =============================================================================
// Orders
// =============================================================================

/// Order → wire row.
///
/// `include_id` distinguishes the upsert body (carries the id) from the
/// partial-update body (the id travels in the `eq.` filter instead).
pub fn order_to_row(order: &Order, include_id: bool) -> Value {
    let mut row = json!({
        "order_number": order.order_number,
        "customer_name": order.customer_name,
        "filial": order.filial,
        "matricula": order.matricula,
        "date": order.date.format("%Y-%m-%d").to_string(),
        "status": match order.status {
            OrderStatus::Completed => "completed",
            OrderStatus::Pending => "pending",
        },
        "items": order.items.iter().map(item_to_wire).collect::<Vec<_>>(),
        "obs": order.obs,
        "envio_malote": order.envio_malote,
        "entrega_matriz": order.entrega_matriz,
    });
    if include_id {
        if let Some(object) = row.as_object_mut() {
            object.insert("id".to_string(), Value::String(order.id.clone()));
        }
    }
    row
}

/// Wire row → Order, normalized: a stale `completed` with both shipping
/// flags false reads back as pending.
pub fn order_from_row(row: &Value) -> Option<Order> {
    let id = str_column(row, "id")?;
    let order_number = str_column(row, "order_number")?;

    let date = str_column(row, "date")
        .and_then(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.date_naive()))
        })
        .unwrap_or_default();

    let status = match str_column(row, "status").as_deref() {
        Some("completed") => OrderStatus::Completed,
        _ => OrderStatus::Pending,
    };

    let items = row
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(item_from_wire).collect())
        .unwrap_or_default();

    let mut order = Order {
        id,
        order_number,
        customer_name: str_column(row, "customer_name").unwrap_or_default(),
        filial: str_column(row, "filial").unwrap_or_default(),
        matricula: str_column(row, "matricula").unwrap_or_default(),
        date,
        status,
        items,
        obs: str_column(row, "obs"),
        envio_malote: row.get("envio_malote").and_then(Value::as_bool).unwrap_or(false),
        entrega_matriz: row.get("entrega_matriz").and_then(Value::as_bool).unwrap_or(false),
    };
    order.normalize();
    Some(order)
}

/// OrderItem → embedded wire object (legacy camelCase field names).
fn item_to_wire(item: &OrderItem) -> Value {
    json!({
        "productId": item.product_id,
        "productName": item.product_name,
        "qtyRequested": item.qty_requested,
        "qtyPicked": item.qty_picked,
    })
}

/// Embedded wire object → OrderItem.
fn item_from_wire(value: &Value) -> Option<OrderItem> {
    let product_id = str_column(value, "productId")?;
    Some(OrderItem {
        product_id,
        product_name: str_column(value, "productName").unwrap_or_default(),
        qty_requested: value.get("qtyRequested").and_then(Value::as_i64).unwrap_or(0),
        qty_picked: value.get("qtyPicked").and_then(Value::as_i64).unwrap_or(0),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
