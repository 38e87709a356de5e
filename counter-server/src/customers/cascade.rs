//! Customer deletion cascade
//!
//! Deleting a customer is a policy decision over their orders, applied
//! atomically in one write transaction:
//!
//! - any order in an active fulfillment status blocks the deletion
//! - open orders that never reached production are cancelled, with a
//!   history record naming the deleting actor
//! - orders already in a terminal status are left untouched
//! - the customer record is deactivated, never removed
//!
//! Note the blocking set is broader than the in-production
//! classification: `ReadyForPickup` blocks deletion even though the
//! order is out of production, because the goods still await handover.

use crate::orders::lifecycle;
use crate::orders::storage::{OrderStorage, StorageError};
use shared::order::{ActorContext, OrderStatus};
use thiserror::Error;
use tracing::info;

/// Statuses that block customer deletion outright
pub const DELETION_BLOCKING_STATUSES: [OrderStatus; 4] = [
    OrderStatus::InProgress,
    OrderStatus::Baked,
    OrderStatus::Packaged,
    OrderStatus::ReadyForPickup,
];

/// Statuses whose orders are cancelled when their customer is deleted
pub const CANCEL_ON_DELETE_STATUSES: [OrderStatus; 3] = [
    OrderStatus::New,
    OrderStatus::Verified,
    OrderStatus::NotOk,
];

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] lifecycle::LifecycleError),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Cannot delete customer with {active_orders} in-progress order(s)")]
    Blocked {
        customer_id: String,
        active_orders: usize,
    },
}

pub type CascadeResult<T> = Result<T, CascadeError>;

/// Read-only preflight result for a deletion request
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionEvaluation {
    pub eligible: bool,
    /// Orders in a deletion-blocking fulfillment status
    pub in_progress_order_count: usize,
    /// Orders the deletion would cancel
    pub pre_production_order_count: usize,
    pub blocking_reason: Option<String>,
}

/// What a completed deletion did
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub customer_id: String,
    pub cancelled_order_ids: Vec<String>,
}

/// Evaluate whether a customer can be deleted, without writing anything
pub fn evaluate_deletion(
    storage: &OrderStorage,
    customer_id: &str,
) -> CascadeResult<DeletionEvaluation> {
    let customer = storage
        .get_customer(customer_id)?
        .filter(|c| c.active)
        .ok_or_else(|| CascadeError::CustomerNotFound(customer_id.to_string()))?;

    let orders = storage.get_orders_for_customer(&customer.id)?;
    let blocking = orders
        .iter()
        .filter(|o| DELETION_BLOCKING_STATUSES.contains(&o.status))
        .count();
    let cancellable = orders
        .iter()
        .filter(|o| CANCEL_ON_DELETE_STATUSES.contains(&o.status))
        .count();

    Ok(DeletionEvaluation {
        eligible: blocking == 0,
        in_progress_order_count: blocking,
        pre_production_order_count: cancellable,
        blocking_reason: (blocking > 0).then(|| {
            format!("Cannot delete customer with {} in-progress order(s)", blocking)
        }),
    })
}

/// Delete a customer, cancelling their open orders
///
/// The evaluation is redone inside the write transaction, so an order
/// that entered production after a successful preflight still blocks
/// the deletion here.
pub fn delete_customer(
    storage: &OrderStorage,
    customer_id: &str,
    actor: &ActorContext,
) -> CascadeResult<CascadeOutcome> {
    let txn = storage.begin_write()?;

    let mut customer = storage
        .get_customer_txn(&txn, customer_id)?
        .filter(|c| c.active)
        .ok_or_else(|| CascadeError::CustomerNotFound(customer_id.to_string()))?;

    let orders = storage.get_orders_for_customer_txn(&txn, &customer.id)?;
    let blocking = orders
        .iter()
        .filter(|o| DELETION_BLOCKING_STATUSES.contains(&o.status))
        .count();
    if blocking > 0 {
        return Err(CascadeError::Blocked {
            customer_id: customer.id,
            active_orders: blocking,
        });
    }

    let mut cancelled = Vec::new();
    for mut order in orders {
        if !CANCEL_ON_DELETE_STATUSES.contains(&order.status) {
            // Terminal orders stay as they are
            continue;
        }
        // The guard always admits Cancelled from a pre-production status
        let change = lifecycle::transition_order(&mut order, OrderStatus::Cancelled, actor)?;
        storage.store_order_checked(&txn, &order)?;
        storage.append_order_history(&txn, &change)?;
        cancelled.push(order.id);
    }

    customer.active = false;
    storage.store_customer(&txn, &customer)?;
    storage.commit(txn)?;

    info!(
        customer_id = %customer.id,
        cancelled = cancelled.len(),
        actor = %actor.actor_id,
        "customer deleted"
    );
    Ok(CascadeOutcome {
        customer_id: customer.id,
        cancelled_order_ids: cancelled,
    })
}
