//! Status change history - immutable facts recorded after each transition
//!
//! History is append-only and never rewritten. The timestamp is always
//! set by the server when the record is created.

use super::status::{OrderItemStatus, OrderStatus};
use serde::{Deserialize, Serialize};

/// Immutable audit record for an order status transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderStatusChange {
    /// Record unique ID
    pub id: String,
    /// Order this change belongs to
    pub order_id: String,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    /// Operator who triggered the change
    pub actor_id: String,
    /// Operator name (snapshot for audit)
    pub actor_name: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
}

impl OrderStatusChange {
    pub fn new(
        order_id: String,
        previous_status: OrderStatus,
        new_status: OrderStatus,
        actor_id: String,
        actor_name: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id,
            previous_status,
            new_status,
            actor_id,
            actor_name,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Immutable audit record for an order item status transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemStatusChange {
    pub id: String,
    pub order_id: String,
    /// Line key of the affected item
    pub line_key: String,
    pub previous_status: OrderItemStatus,
    pub new_status: OrderItemStatus,
    pub actor_id: String,
    pub actor_name: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
}

impl ItemStatusChange {
    pub fn new(
        order_id: String,
        line_key: String,
        previous_status: OrderItemStatus,
        new_status: OrderItemStatus,
        actor_id: String,
        actor_name: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id,
            line_key,
            previous_status,
            new_status,
            actor_id,
            actor_name,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
