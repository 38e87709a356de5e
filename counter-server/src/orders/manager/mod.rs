//! OrdersManager - order lifecycle and composition coordination
//!
//! This module handles:
//! - Draft composition (add/edit/remove items, discount, derived totals)
//! - Saving compositions with optimistic version checks
//! - Status transitions with server-side guard enforcement
//! - Append-only status history
//! - Change broadcasting to subscribers
//!
//! # Save Flow
//!
//! ```text
//! save_composition(order_id, expected_version)
//!     ├─ 1. Snapshot the in-memory draft (items + discount + totals)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Reload stored order; reject if not editable or version moved
//!     ├─ 4. Apply composition, write with version + 1
//!     ├─ 5. Commit transaction
//!     └─ 6. Broadcast change event
//! ```
//!
//! Transitions follow the same shape but run entirely inside the write
//! transaction: reload, guard, mutate, persist, append history, commit.
//! A guard rejection aborts before anything is written, so no history
//! record ever exists for a failed transition.

mod error;
pub use error::*;

use super::composition::OrderComposition;
use super::lifecycle;
use super::storage::OrderStorage;
use dashmap::DashMap;
use shared::order::{
    ActorContext, DiscountSpec, DiscountValidity, ItemStatusChange, LineItemInput, Order,
    OrderItemStatus, OrderStatus, OrderStatusChange, OrderTotals,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Broadcast capacity for change events
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change events broadcast to subscribers after each committed write
#[derive(Debug, Clone)]
pub enum EngineEvent {
    OrderCreated { order_id: String },
    CompositionSaved { order_id: String, version: u64 },
    OrderStatusChanged(OrderStatusChange),
    ItemStatusChanged(ItemStatusChange),
}

/// Core order manager
pub struct OrdersManager {
    storage: OrderStorage,
    /// In-memory draft compositions keyed by order ID
    drafts: Arc<DashMap<String, OrderComposition>>,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl OrdersManager {
    /// Create a manager backed by a database at the given path
    pub fn new(db_path: impl AsRef<Path>) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        Ok(Self::with_storage(storage))
    }

    /// Create a manager with an existing storage instance
    pub fn with_storage(storage: OrderStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            drafts: Arc::new(DashMap::new()),
            event_tx,
        }
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Access the underlying storage
    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    fn broadcast(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    // ========== Order Creation and Lookup ==========

    /// Create a new empty order for a customer
    ///
    /// The customer must exist and be active.
    pub fn create_order(&self, customer_id: &str, location_id: &str) -> ManagerResult<Order> {
        let customer = self
            .storage
            .get_customer(customer_id)?
            .filter(|c| c.active)
            .ok_or_else(|| ManagerError::CustomerNotFound(customer_id.to_string()))?;

        let mut order = Order::new(customer.id, location_id.to_string());
        let txn = self.storage.begin_write()?;
        let version = self.storage.store_order_checked(&txn, &order)?;
        self.storage.commit(txn)?;
        order.version = version;

        info!(order_id = %order.id, customer_id = %order.customer_id, "order created");
        self.broadcast(EngineEvent::OrderCreated {
            order_id: order.id.clone(),
        });
        Ok(order)
    }

    /// Get an order by ID
    pub fn get_order(&self, order_id: &str) -> ManagerResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// Get all orders for a customer
    pub fn get_orders_for_customer(&self, customer_id: &str) -> ManagerResult<Vec<Order>> {
        Ok(self.storage.get_orders_for_customer(customer_id)?)
    }

    // ========== Draft Composition ==========

    /// Verify the order exists and is still editable, then make sure a
    /// draft is loaded for it
    fn editable_draft(&self, order_id: &str) -> ManagerResult<()> {
        let order = self.get_order(order_id)?;
        if !order.is_editable() {
            return Err(ManagerError::OrderNotEditable {
                order_id: order_id.to_string(),
                status: order.status,
            });
        }
        self.drafts
            .entry(order_id.to_string())
            .or_insert_with(|| OrderComposition::from_parts(order.items, order.discount));
        Ok(())
    }

    /// Add an item to the order's draft, returning its line key
    pub fn add_item(&self, order_id: &str, input: &LineItemInput) -> ManagerResult<String> {
        self.editable_draft(order_id)?;
        let mut draft = self
            .drafts
            .get_mut(order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        Ok(draft.add_item(input)?)
    }

    /// Edit an item in the order's draft, returning its (possibly new) line key
    pub fn update_item(
        &self,
        order_id: &str,
        line_key: &str,
        input: &LineItemInput,
    ) -> ManagerResult<String> {
        self.editable_draft(order_id)?;
        let mut draft = self
            .drafts
            .get_mut(order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        Ok(draft.update_item(line_key, input)?)
    }

    /// Remove an item from the order's draft (idempotent)
    pub fn remove_item(&self, order_id: &str, line_key: &str) -> ManagerResult<()> {
        self.editable_draft(order_id)?;
        let mut draft = self
            .drafts
            .get_mut(order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        draft.remove_item(line_key);
        Ok(())
    }

    /// Set the order's discount
    ///
    /// A negative amount is rejected; the draft remembers the rejection
    /// and reports `DiscountValidity::Negative` until a valid spec is set.
    pub fn set_discount(&self, order_id: &str, spec: DiscountSpec) -> ManagerResult<()> {
        self.editable_draft(order_id)?;
        let mut draft = self
            .drafts
            .get_mut(order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        draft.set_discount(spec)?;
        Ok(())
    }

    /// Current derived totals for the order's draft
    pub fn totals(&self, order_id: &str) -> ManagerResult<OrderTotals> {
        self.editable_draft(order_id)?;
        let mut draft = self
            .drafts
            .get_mut(order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        Ok(draft.totals())
    }

    /// Current discount validity for the order's draft
    pub fn discount_validity(&self, order_id: &str) -> ManagerResult<DiscountValidity> {
        self.editable_draft(order_id)?;
        let mut draft = self
            .drafts
            .get_mut(order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        Ok(draft.discount_validity())
    }

    /// Drop the in-memory draft, discarding unsaved edits
    pub fn discard_draft(&self, order_id: &str) {
        self.drafts.remove(order_id);
    }

    /// Persist the order's draft composition
    ///
    /// `expected_version` is the version the caller read; the save is
    /// rejected when the stored order moved past it in the meantime.
    pub fn save_composition(
        &self,
        order_id: &str,
        expected_version: u64,
    ) -> ManagerResult<Order> {
        self.editable_draft(order_id)?;
        let (mut items, discount, totals) = {
            let mut draft = self
                .drafts
                .get_mut(order_id)
                .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
            let totals = draft.totals();
            (draft.items().to_vec(), *draft.discount(), totals)
        };

        // Assign persistence IDs to items saved for the first time
        for item in &mut items {
            if item.id.is_none() {
                item.id = Some(uuid::Uuid::new_v4().to_string());
            }
        }

        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        if !order.is_editable() {
            return Err(ManagerError::OrderNotEditable {
                order_id: order_id.to_string(),
                status: order.status,
            });
        }
        order.version = expected_version;
        order.apply_composition(items, discount, totals);
        let version = self.storage.store_order_checked(&txn, &order)?;
        self.storage.commit(txn)?;
        order.version = version;

        // Refresh the draft so the assigned item IDs stick across saves
        self.drafts.insert(
            order_id.to_string(),
            OrderComposition::from_parts(order.items.clone(), order.discount),
        );

        debug!(order_id = %order.id, version, total = %order.total, "composition saved");
        self.broadcast(EngineEvent::CompositionSaved {
            order_id: order.id.clone(),
            version,
        });
        Ok(order)
    }

    // ========== Lifecycle ==========

    /// Legal next statuses for an order
    pub fn allowed_transitions(&self, order_id: &str) -> ManagerResult<Vec<OrderStatus>> {
        Ok(self.get_order(order_id)?.status.allowed_next_statuses())
    }

    /// Transition an order to a new status
    ///
    /// On success the change is persisted together with its history
    /// record in one transaction. On guard rejection nothing is written.
    pub fn transition_status(
        &self,
        order_id: &str,
        to: OrderStatus,
        actor: &ActorContext,
    ) -> ManagerResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;

        let change = lifecycle::transition_order(&mut order, to, actor)?;
        let version = self.storage.store_order_checked(&txn, &order)?;
        self.storage.append_order_history(&txn, &change)?;
        self.storage.commit(txn)?;
        order.version = version;

        // The composition is frozen once the order leaves pre-production
        if !order.status.is_pre_production() {
            self.drafts.remove(order_id);
        }

        self.broadcast(EngineEvent::OrderStatusChanged(change));
        Ok(order)
    }

    /// Transition one item of an order to a new status
    pub fn set_item_status(
        &self,
        order_id: &str,
        line_key: &str,
        to: OrderItemStatus,
        actor: &ActorContext,
    ) -> ManagerResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;

        let change = lifecycle::transition_item(&mut order, line_key, to, actor)?;
        let version = self.storage.store_order_checked(&txn, &order)?;
        self.storage.append_item_history(&txn, &change)?;
        self.storage.commit(txn)?;
        order.version = version;

        self.broadcast(EngineEvent::ItemStatusChanged(change));
        Ok(order)
    }

    // ========== History ==========

    /// Full order status history, oldest first
    pub fn order_history(&self, order_id: &str) -> ManagerResult<Vec<OrderStatusChange>> {
        Ok(self.storage.get_order_history(order_id)?)
    }

    /// Full item status history for an order, oldest first
    pub fn item_history(&self, order_id: &str) -> ManagerResult<Vec<ItemStatusChange>> {
        Ok(self.storage.get_item_history(order_id)?)
    }
}

impl Clone for OrdersManager {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            drafts: self.drafts.clone(),
            event_tx: self.event_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests;
