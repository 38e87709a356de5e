//! Shared types for the order tracker
//!
//! Common types used across crates: money arithmetic, order composition
//! types, lifecycle statuses, status-change history records, and the
//! customer model.

pub mod models;
pub mod money;
pub mod order;

// Re-exports
pub use models::Customer;
pub use money::Money;
pub use order::{
    ActorContext, DiscountKind, DiscountSpec, DiscountValidity, ItemStatusChange, LineItem,
    LineItemInput, Order, OrderItemStatus, OrderStatus, OrderStatusChange, OrderTotals,
};
pub use serde::{Deserialize, Serialize};
