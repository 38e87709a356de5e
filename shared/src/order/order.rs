//! Order aggregate root
//!
//! The order owns its composition (items + discount) and caches the
//! derived totals computed by the engine. Composition fields are only
//! written by the composer/totals graph and status only by the
//! lifecycle machine; the `version` counter backs optimistic
//! concurrency on every persisted write.

use super::status::OrderStatus;
use super::types::{DiscountSpec, LineItem, OrderTotals};
use crate::money::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (assigned by server)
    pub id: String,
    /// Owning customer
    pub customer_id: String,
    /// Location the order was taken at
    pub location_id: String,
    /// Fulfillment status
    pub status: OrderStatus,
    /// Items in the order
    pub items: Vec<LineItem>,
    /// Order-level discount
    #[serde(default)]
    pub discount: DiscountSpec,
    /// Cached derived totals (refreshed whenever the composition is saved)
    pub subtotal: Money,
    #[serde(default)]
    pub discount_value: Money,
    pub total: Money,
    /// Optimistic concurrency counter, bumped on every persisted write
    pub version: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Order {
    /// Create a new empty order in status New
    pub fn new(customer_id: String, location_id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id,
            location_id,
            status: OrderStatus::New,
            items: Vec::new(),
            discount: DiscountSpec::none(),
            subtotal: Money::ZERO,
            discount_value: Money::ZERO,
            total: Money::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the composition may still be edited
    pub fn is_editable(&self) -> bool {
        self.status.is_pre_production()
    }

    /// Replace the composition and cached totals in one step
    pub fn apply_composition(
        &mut self,
        items: Vec<LineItem>,
        discount: DiscountSpec,
        totals: OrderTotals,
    ) {
        self.items = items;
        self.discount = discount;
        self.subtotal = totals.subtotal;
        self.discount_value = totals.applied_discount_value;
        self.total = totals.total;
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}
