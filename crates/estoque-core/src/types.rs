//! # Domain Types
//!
//! Core domain types used throughout Estoque.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Movement     │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (code)      │   │  id (millis)    │   │  id (UUID)      │       │
//! │  │  name           │   │  prod_id?       │   │  order_number   │       │
//! │  │  qty            │   │  qty (signed)   │   │  status         │       │
//! │  └─────────────────┘   │  matricula?     │   │  items[]        │       │
//! │                        └─────────────────┘   │  shipping flags │       │
//! │                                              └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────────────────────────┐     │
//! │  │   OrderItem     │   │          PendingMutation                │     │
//! │  │  ─────────────  │   │  ───────────────────────────────────── │     │
//! │  │  product_id     │   │  kind: PRODUCT|MOVEMENT|ORDER|          │     │
//! │  │  qty_requested  │   │        DELETE_ORDER                     │     │
//! │  │  qty_picked     │   │  payload: entity snapshot or id         │     │
//! │  └─────────────────┘   └─────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - Product identity is the user-assigned code (barcode or manual)
//! - Movement identity is its creation timestamp in milliseconds
//! - Order identity is a UUID v4, generated offline-safe

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

// =============================================================================
// Product
// =============================================================================

/// A tracked product.
///
/// Identity is the user-assigned `id` (a barcode or manually typed code),
/// not a surrogate key: the same code is scanned at the shelf and typed on
/// the order import sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Barcode or manual code. Unique, user-assigned.
    pub id: String,

    /// Display name shown in lists and on movements.
    pub name: String,

    /// Current stock level. Never negative - outbound transactions that
    /// would cross zero are rejected before any write happens.
    pub qty: i64,
}

impl Product {
    /// Checks whether `quantity` units can leave stock.
    #[inline]
    pub fn can_remove(&self, quantity: i64) -> bool {
        self.qty >= quantity
    }

    /// Whether the product should be flagged as running low.
    #[inline]
    pub fn is_low(&self) -> bool {
        self.qty < crate::LOW_STOCK_THRESHOLD
    }
}

// =============================================================================
// Movement
// =============================================================================

/// A stock movement: one append-only history row.
///
/// Movements are never mutated after creation, only bulk-deleted when the
/// history is cleared. `qty` is signed: negative for removals, positive for
/// additions, zero for informational system events (e.g. order shipped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Movement {
    /// Creation timestamp in milliseconds. Effectively unique.
    pub id: i64,

    /// When the movement happened.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,

    /// Product code, or None for system-level events (order shipped).
    pub prod_id: Option<String>,

    /// Product name snapshot (or the system event label).
    pub prod_name: String,

    /// Signed quantity delta. Negative = removal, positive = addition,
    /// zero = informational.
    pub qty: i64,

    /// Free-text note. On the wire this also carries the operator tag when
    /// the backend has no dedicated column - see [`crate::note`].
    pub obs: Option<String>,

    /// Operator identifier (employee registration number).
    pub matricula: Option<String>,
}

impl Movement {
    /// Creates a movement stamped with the current time.
    ///
    /// The millisecond timestamp doubles as the identity, matching how the
    /// history collection has always been keyed.
    pub fn record(
        prod_id: Option<String>,
        prod_name: impl Into<String>,
        qty: i64,
        obs: Option<String>,
        matricula: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Movement {
            id: now.timestamp_millis(),
            date: now,
            prod_id,
            prod_name: prod_name.into(),
            qty,
            obs,
            matricula,
        }
    }

    /// True for system-level rows (no product attached).
    #[inline]
    pub fn is_system(&self) -> bool {
        self.prod_id.is_none()
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// There are only two states; "completed" is *derived*, never trusted from
/// input. See [`Order::recomputed_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Items still being picked, or no shipping channel chosen yet.
    Pending,
    /// Every item fully picked and a shipping channel flagged.
    Completed,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line inside an order. Embedded, not an independent entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    /// Product code this line refers to.
    pub product_id: String,

    /// Product name snapshot (placeholder for unknown imported codes).
    pub product_name: String,

    /// Units the customer asked for.
    pub qty_requested: i64,

    /// Units already picked off the shelf.
    pub qty_picked: i64,
}

impl OrderItem {
    /// Whether this line needs no further picking.
    #[inline]
    pub fn is_fully_picked(&self) -> bool {
        self.qty_picked >= self.qty_requested
    }
}

// =============================================================================
// Shipping Method
// =============================================================================

/// The fulfillment channel chosen for a completed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    /// Sent in the inter-branch pouch.
    Malote,
    /// Handed over at the head office.
    Matriz,
}

impl ShippingMethod {
    /// Human label used in movement notes and reports.
    pub fn label(&self) -> &'static str {
        match self {
            ShippingMethod::Malote => "Malote",
            ShippingMethod::Matriz => "Matriz",
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order being picked from stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    /// UUID v4, generated locally (offline-safe).
    pub id: String,

    /// Business order number as printed on the request sheet.
    pub order_number: String,

    /// Customer or destination name.
    pub customer_name: String,

    /// Branch the order ships to.
    pub filial: String,

    /// Operator who registered the order.
    pub matricula: String,

    /// Order date.
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Derived status - recomputed on every save, normalized on every load.
    pub status: OrderStatus,

    /// Ordered list of items.
    pub items: Vec<OrderItem>,

    /// Free-text note.
    pub obs: Option<String>,

    /// Shipping flag: inter-branch pouch.
    #[serde(default)]
    pub envio_malote: bool,

    /// Shipping flag: head-office delivery.
    #[serde(default)]
    pub entrega_matriz: bool,
}

impl Order {
    /// Creates an empty order dated `date` with a fresh UUID.
    pub fn new(order_number: impl Into<String>, customer_name: impl Into<String>, date: NaiveDate) -> Self {
        Order {
            id: Uuid::new_v4().to_string(),
            order_number: order_number.into(),
            customer_name: customer_name.into(),
            filial: String::new(),
            matricula: String::new(),
            date,
            status: OrderStatus::Pending,
            items: Vec::new(),
            obs: None,
            envio_malote: false,
            entrega_matriz: false,
        }
    }

    /// Whether every item has been fully picked.
    pub fn is_fully_picked(&self) -> bool {
        self.items.iter().all(OrderItem::is_fully_picked)
    }

    /// Whether at least one shipping channel is flagged.
    #[inline]
    pub fn has_shipping(&self) -> bool {
        self.envio_malote || self.entrega_matriz
    }

    /// Derives the status from the completion invariant:
    /// completed iff fully picked AND a shipping channel is flagged.
    ///
    /// Callers never get to persist their own idea of "completed" - every
    /// save path routes through this.
    pub fn recomputed_status(&self) -> OrderStatus {
        if self.is_fully_picked() && self.has_shipping() {
            OrderStatus::Completed
        } else {
            OrderStatus::Pending
        }
    }

    /// Repairs a stale persisted status on load.
    ///
    /// Rows written by older clients (or edited server-side) can carry
    /// `completed` with both shipping flags false; those read back as
    /// pending. Only the inconsistent direction is corrected - a pending
    /// row is left alone even when it would recompute to completed.
    pub fn normalize(&mut self) {
        if self.status == OrderStatus::Completed && !self.has_shipping() {
            self.status = OrderStatus::Pending;
        }
    }

    /// Sum of requested units across all items.
    pub fn total_requested(&self) -> i64 {
        self.items.iter().map(|i| i.qty_requested).sum()
    }

    /// Sum of picked units across all items.
    pub fn total_picked(&self) -> i64 {
        self.items.iter().map(|i| i.qty_picked).sum()
    }
}

// =============================================================================
// Pending Mutation (sync queue entry)
// =============================================================================

/// What kind of entity a queued mutation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationKind {
    /// Product insert or upsert.
    Product,
    /// Movement insert (append-only).
    Movement,
    /// Order upsert or partial update.
    Order,
    /// Order deletion by id.
    DeleteOrder,
}

/// A recorded intent to apply one entity change remotely.
///
/// The payload is the *repository-level* snapshot (the fully-formed entity,
/// plus `is_new` where insert-vs-update matters), not a raw network request:
/// replay goes back through the repositories' remote-apply paths, which do
/// no validation and no cache writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMutation {
    /// Identity of the affected entity (product code, movement id, order id).
    pub id: String,

    /// Entity kind, drives drain dispatch.
    pub kind: MutationKind,

    /// Entity snapshot (or bare identifier for deletions) as JSON.
    pub payload: serde_json::Value,

    /// Insert vs update, where the distinction matters remotely.
    #[serde(default)]
    pub is_new: bool,

    /// When the mutation was queued.
    pub enqueued_at: DateTime<Utc>,
}

impl PendingMutation {
    /// Queue entry for a product save.
    pub fn product(product: &Product, is_new: bool) -> Result<Self, serde_json::Error> {
        Ok(PendingMutation {
            id: product.id.clone(),
            kind: MutationKind::Product,
            payload: serde_json::to_value(product)?,
            is_new,
            enqueued_at: Utc::now(),
        })
    }

    /// Queue entry for a movement insert.
    pub fn movement(movement: &Movement) -> Result<Self, serde_json::Error> {
        Ok(PendingMutation {
            id: movement.id.to_string(),
            kind: MutationKind::Movement,
            payload: serde_json::to_value(movement)?,
            is_new: true,
            enqueued_at: Utc::now(),
        })
    }

    /// Queue entry for an order save.
    pub fn order(order: &Order, is_new: bool) -> Result<Self, serde_json::Error> {
        Ok(PendingMutation {
            id: order.id.clone(),
            kind: MutationKind::Order,
            payload: serde_json::to_value(order)?,
            is_new,
            enqueued_at: Utc::now(),
        })
    }

    /// Queue entry for an order deletion.
    pub fn delete_order(order_id: &str) -> Self {
        PendingMutation {
            id: order_id.to_string(),
            kind: MutationKind::DeleteOrder,
            payload: serde_json::Value::String(order_id.to_string()),
            is_new: false,
            enqueued_at: Utc::now(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
