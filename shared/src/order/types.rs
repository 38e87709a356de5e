//! Shared types for order composition

use crate::money::Money;
use crate::order::status::OrderItemStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Line item snapshot - one product+quantity+notes entry within an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Persistence ID (assigned when the order is first stored)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Content-addressed equivalence key (product_id + trimmed notes)
    pub line_key: String,
    /// Product ID
    pub product_id: String,
    /// Product name snapshot
    pub product_name: String,
    /// Product size snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_size: Option<String>,
    /// Quantity (always >= 1)
    pub quantity: u32,
    /// Free-form notes; trimmed for equivalence matching
    #[serde(default)]
    pub notes: String,
    /// Per-unit price
    pub unit_price: Money,
    /// Line total (always unit_price * quantity, recomputed on every
    /// mutation - never set independently)
    pub line_total: Money,
    /// Item production status (independent of the order status)
    #[serde(default)]
    pub status: OrderItemStatus,
}

/// Line item input - candidate values entered by the user
///
/// `product_id` is optional because the add path must reject a missing
/// product explicitly rather than panic on it; the edit path falls back
/// to the edited item's product.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LineItemInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_size: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub notes: String,
    pub unit_price: Money,
}

/// Discount kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    #[default]
    Percent,
    Fixed,
}

/// Order-level discount specification
///
/// A Percent amount is whole percentage points (10 means 10%).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DiscountSpec {
    pub kind: DiscountKind,
    pub amount: Decimal,
}

impl DiscountSpec {
    pub fn percent(amount: Decimal) -> Self {
        Self {
            kind: DiscountKind::Percent,
            amount,
        }
    }

    pub fn fixed(amount: Decimal) -> Self {
        Self {
            kind: DiscountKind::Fixed,
            amount,
        }
    }

    pub fn none() -> Self {
        Self::percent(Decimal::ZERO)
    }

    /// Reject negative amounts at the boundary, before any state mutates
    pub fn validate(&self) -> Result<(), NegativeDiscount> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(NegativeDiscount {
                amount: self.amount,
            });
        }
        Ok(())
    }
}

impl Default for DiscountSpec {
    fn default() -> Self {
        Self::none()
    }
}

/// Validation error for a negative discount amount
#[derive(Debug, Clone, Error, PartialEq)]
#[error("discount amount must be non-negative, got {amount}")]
pub struct NegativeDiscount {
    pub amount: Decimal,
}

/// Discount validity reported alongside computed totals
///
/// An out-of-range discount never raises an error mid-edit; it degrades
/// to a zero discount and the condition stays queryable here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountValidity {
    #[default]
    Valid,
    ExceedsSubtotal,
    Negative,
}

/// Fully derived order totals snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderTotals {
    /// Sum of line totals over all items
    pub subtotal: Money,
    /// Discount value before validity checks
    pub raw_discount_value: Money,
    /// Discount actually applied (zero when the raw value exceeds the
    /// subtotal - the discount is rejected wholesale, not capped)
    pub applied_discount_value: Money,
    /// subtotal - applied_discount_value, clamped at zero
    pub total: Money,
}

/// Acting user identity, passed explicitly into every recorded operation
///
/// Session-scoped state (current location, operator) is carried here
/// rather than looked up ambiently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: String,
    pub actor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

impl ActorContext {
    pub fn new(actor_id: impl Into<String>, actor_name: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            actor_name: actor_name.into(),
            location_id: None,
        }
    }

    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }
}
