//! Lifecycle state machine application
//!
//! Applies status transitions to orders and their items, enforcing the
//! transition guard server-side and producing the append-only history
//! records. A failed transition leaves the order untouched and records
//! nothing.

use shared::order::{
    ActorContext, ItemStatusChange, Order, OrderItemStatus, OrderStatus, OrderStatusChange,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LifecycleError {
    #[error("illegal order transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("illegal item transition: {from} -> {to}")]
    IllegalItemTransition {
        from: OrderItemStatus,
        to: OrderItemStatus,
    },

    #[error("line item not found: {0}")]
    ItemNotFound(String),
}

/// Apply an order status transition
///
/// Validates against the guard, mutates the order, and returns the
/// history record to append. The record's timestamp is set here, on the
/// server, never taken from the caller.
pub fn transition_order(
    order: &mut Order,
    to: OrderStatus,
    actor: &ActorContext,
) -> Result<OrderStatusChange, LifecycleError> {
    let from = order.status;
    if !from.can_transition_to(to) {
        return Err(LifecycleError::IllegalTransition { from, to });
    }

    order.status = to;
    order.updated_at = chrono::Utc::now().timestamp_millis();

    info!(order_id = %order.id, %from, %to, actor = %actor.actor_id, "order status changed");
    Ok(OrderStatusChange::new(
        order.id.clone(),
        from,
        to,
        actor.actor_id.clone(),
        actor.actor_name.clone(),
    ))
}

/// Apply an item status transition within an order
pub fn transition_item(
    order: &mut Order,
    line_key: &str,
    to: OrderItemStatus,
    actor: &ActorContext,
) -> Result<ItemStatusChange, LifecycleError> {
    let item = order
        .items
        .iter_mut()
        .find(|i| i.line_key == line_key)
        .ok_or_else(|| LifecycleError::ItemNotFound(line_key.to_string()))?;

    let from = item.status;
    if !from.can_transition_to(to) {
        return Err(LifecycleError::IllegalItemTransition { from, to });
    }

    item.status = to;
    order.updated_at = chrono::Utc::now().timestamp_millis();

    info!(order_id = %order.id, %line_key, %from, %to, "item status changed");
    Ok(ItemStatusChange::new(
        order.id.clone(),
        line_key.to_string(),
        from,
        to,
        actor.actor_id.clone(),
        actor.actor_name.clone(),
    ))
}
