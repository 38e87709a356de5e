//! Order domain types shared between the engine and its consumers

pub mod history;
pub mod order;
pub mod status;
pub mod types;

pub use history::{ItemStatusChange, OrderStatusChange};
pub use order::Order;
pub use status::{OrderItemStatus, OrderStatus};
pub use types::{
    ActorContext, DiscountKind, DiscountSpec, DiscountValidity, LineItem, LineItemInput,
    NegativeDiscount, OrderTotals,
};
