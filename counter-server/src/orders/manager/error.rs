use super::super::composer::ComposerError;
use super::super::lifecycle::LifecycleError;
use super::super::storage::StorageError;
use shared::order::{NegativeDiscount, OrderStatus};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Composition error: {0}")]
    Composition(#[from] ComposerError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Discount error: {0}")]
    Discount(#[from] NegativeDiscount),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Order {order_id} is not editable in status {status}")]
    OrderNotEditable {
        order_id: String,
        status: OrderStatus,
    },
}

pub type ManagerResult<T> = Result<T, ManagerError>;
