//! Order engine
//!
//! This module implements the order side of the tracker:
//!
//! - **composer**: line item equivalence keys and merge-on-match
//! - **composition**: mutable order drafts (items + discount + totals)
//! - **totals**: generation-memoized derived totals graph
//! - **lifecycle**: status transition guard and history production
//! - **storage**: redb-based persistence for orders and history
//! - **manager**: OrdersManager tying drafts, lifecycle, and storage together
//!
//! # Data Flow
//!
//! ```text
//! Edit → OrderComposition → TotalsGraph (memoized)
//!             ↓ save
//!        OrdersManager → Storage (redb, versioned write)
//!             ↓
//!         Broadcast to subscribers
//! ```

pub mod composer;
pub mod composition;
pub mod lifecycle;
pub mod manager;
pub mod storage;
pub mod totals;

// Re-exports
pub use composer::{line_key, ComposerError, MAX_QUANTITY};
pub use composition::OrderComposition;
pub use lifecycle::LifecycleError;
pub use manager::{EngineEvent, ManagerError, ManagerResult, OrdersManager};
pub use storage::{OrderStorage, StorageError, StorageResult};
pub use totals::TotalsGraph;

// Re-export shared types for convenience
pub use shared::order::{
    ActorContext, DiscountKind, DiscountSpec, DiscountValidity, ItemStatusChange, LineItem,
    LineItemInput, Order, OrderItemStatus, OrderStatus, OrderStatusChange, OrderTotals,
};
