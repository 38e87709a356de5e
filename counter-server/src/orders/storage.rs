//! redb-based storage layer
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Current order state |
//! | `customers` | `customer_id` | `Customer` | Customer directory |
//! | `order_history` | `(order_id, sequence)` | `OrderStatusChange` | Order status audit (append-only) |
//! | `item_history` | `(order_id, sequence)` | `ItemStatusChange` | Item status audit (append-only) |
//! | `sequence_counter` | `&str` | `u64` | History sequence counters |
//!
//! # Durability
//!
//! redb uses `Durability::Immediate` by default: commits are persistent
//! as soon as `commit()` returns, and the database file is always in a
//! consistent state after power loss.
//!
//! # Versioning
//!
//! Every order carries a `version` counter. `store_order_checked`
//! rejects the write when the stored version no longer matches the one
//! the caller read, which is how a stale save loses the race instead of
//! silently clobbering a newer write.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::order::{ItemStatusChange, Order, OrderStatusChange};
use shared::Customer;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Current order state: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Customer directory: key = customer_id, value = JSON-serialized Customer
const CUSTOMERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("customers");

/// Order status history: key = (order_id, sequence), value = JSON-serialized OrderStatusChange
const ORDER_HISTORY_TABLE: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("order_history");

/// Item status history: key = (order_id, sequence), value = JSON-serialized ItemStatusChange
const ITEM_HISTORY_TABLE: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("item_history");

/// Sequence counters: key = counter name, value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const ORDER_HISTORY_SEQ_KEY: &str = "order_history_seq";
const ITEM_HISTORY_SEQ_KEY: &str = "item_history_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Version conflict on order {order_id}: expected {expected}, stored {stored}")]
    VersionConflict {
        order_id: String,
        expected: u64,
        stored: u64,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order and customer storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(CUSTOMERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_HISTORY_TABLE)?;
            let _ = write_txn.open_table(ITEM_HISTORY_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(ORDER_HISTORY_SEQ_KEY)?.is_none() {
                seq_table.insert(ORDER_HISTORY_SEQ_KEY, 0u64)?;
            }
            if seq_table.get(ITEM_HISTORY_SEQ_KEY)?.is_none() {
                seq_table.insert(ITEM_HISTORY_SEQ_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Commit a write transaction
    pub fn commit(&self, txn: WriteTransaction) -> StorageResult<()> {
        Ok(txn.commit()?)
    }

    // ========== Sequence Operations ==========

    fn increment_sequence(&self, txn: &WriteTransaction, key: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table.get(key)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key, next)?;
        Ok(next)
    }

    // ========== Order Operations ==========

    /// Store an order unconditionally (within transaction)
    ///
    /// Version is written as-is; use `store_order_checked` on every path
    /// where a concurrent writer may exist.
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Store an order with an optimistic version check (within transaction)
    ///
    /// The caller's `order.version` is the version it read. The write
    /// succeeds only when the stored version still matches; the stored
    /// copy then carries `version + 1`, which is also returned so the
    /// caller can update its in-memory state.
    pub fn store_order_checked(
        &self,
        txn: &WriteTransaction,
        order: &Order,
    ) -> StorageResult<u64> {
        let mut table = txn.open_table(ORDERS_TABLE)?;

        let stored_version = match table.get(order.id.as_str())? {
            Some(value) => {
                let stored: Order = serde_json::from_slice(value.value())?;
                stored.version
            }
            None => 0,
        };
        if stored_version != order.version {
            return Err(StorageError::VersionConflict {
                order_id: order.id.clone(),
                expected: order.version,
                stored: stored_version,
            });
        }

        let mut next = order.clone();
        next.version = order.version + 1;
        let value = serde_json::to_vec(&next)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(next.version)
    }

    /// Get an order by ID
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let order: Order = serde_json::from_slice(value.value())?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Get an order by ID (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;

        let order = match table.get(order_id)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(order)
    }

    /// Get all orders
    pub fn get_all_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            orders.push(order);
        }
        Ok(orders)
    }

    /// Get all orders belonging to a customer
    pub fn get_orders_for_customer(&self, customer_id: &str) -> StorageResult<Vec<Order>> {
        Ok(self
            .get_all_orders()?
            .into_iter()
            .filter(|o| o.customer_id == customer_id)
            .collect())
    }

    /// Get all orders belonging to a customer (within transaction)
    pub fn get_orders_for_customer_txn(
        &self,
        txn: &WriteTransaction,
        customer_id: &str,
    ) -> StorageResult<Vec<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.customer_id == customer_id {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    // ========== Customer Operations ==========

    /// Store a customer (within transaction)
    pub fn store_customer(&self, txn: &WriteTransaction, customer: &Customer) -> StorageResult<()> {
        let mut table = txn.open_table(CUSTOMERS_TABLE)?;
        let value = serde_json::to_vec(customer)?;
        table.insert(customer.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a customer by ID
    pub fn get_customer(&self, customer_id: &str) -> StorageResult<Option<Customer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CUSTOMERS_TABLE)?;

        match table.get(customer_id)? {
            Some(value) => {
                let customer: Customer = serde_json::from_slice(value.value())?;
                Ok(Some(customer))
            }
            None => Ok(None),
        }
    }

    /// Get a customer by ID (within transaction)
    pub fn get_customer_txn(
        &self,
        txn: &WriteTransaction,
        customer_id: &str,
    ) -> StorageResult<Option<Customer>> {
        let table = txn.open_table(CUSTOMERS_TABLE)?;

        let customer = match table.get(customer_id)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(customer)
    }

    /// Find an active customer by phone number
    pub fn find_active_customer_by_phone(&self, phone: &str) -> StorageResult<Option<Customer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CUSTOMERS_TABLE)?;

        for result in table.iter()? {
            let (_key, value) = result?;
            let customer: Customer = serde_json::from_slice(value.value())?;
            if customer.active && customer.phone == phone {
                return Ok(Some(customer));
            }
        }
        Ok(None)
    }

    /// Get all customers, optionally including deactivated ones
    pub fn get_all_customers(&self, include_inactive: bool) -> StorageResult<Vec<Customer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CUSTOMERS_TABLE)?;

        let mut customers = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let customer: Customer = serde_json::from_slice(value.value())?;
            if include_inactive || customer.active {
                customers.push(customer);
            }
        }
        Ok(customers)
    }

    // ========== History Operations ==========

    /// Append an order status change record (within transaction)
    pub fn append_order_history(
        &self,
        txn: &WriteTransaction,
        change: &OrderStatusChange,
    ) -> StorageResult<()> {
        let seq = self.increment_sequence(txn, ORDER_HISTORY_SEQ_KEY)?;
        let mut table = txn.open_table(ORDER_HISTORY_TABLE)?;
        let key = (change.order_id.as_str(), seq);
        let value = serde_json::to_vec(change)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get the full order status history, oldest first
    pub fn get_order_history(&self, order_id: &str) -> StorageResult<Vec<OrderStatusChange>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_HISTORY_TABLE)?;

        let mut changes = Vec::new();
        let range_start = (order_id, 0u64);
        let range_end = (order_id, u64::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let change: OrderStatusChange = serde_json::from_slice(value.value())?;
            changes.push(change);
        }
        Ok(changes)
    }

    /// Append an item status change record (within transaction)
    pub fn append_item_history(
        &self,
        txn: &WriteTransaction,
        change: &ItemStatusChange,
    ) -> StorageResult<()> {
        let seq = self.increment_sequence(txn, ITEM_HISTORY_SEQ_KEY)?;
        let mut table = txn.open_table(ITEM_HISTORY_TABLE)?;
        let key = (change.order_id.as_str(), seq);
        let value = serde_json::to_vec(change)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get the full item status history for an order, oldest first
    pub fn get_item_history(&self, order_id: &str) -> StorageResult<Vec<ItemStatusChange>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ITEM_HISTORY_TABLE)?;

        let mut changes = Vec::new();
        let range_start = (order_id, 0u64);
        let range_end = (order_id, u64::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let change: ItemStatusChange = serde_json::from_slice(value.value())?;
            changes.push(change);
        }
        Ok(changes)
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let orders_table = read_txn.open_table(ORDERS_TABLE)?;
        let customers_table = read_txn.open_table(CUSTOMERS_TABLE)?;
        let order_history_table = read_txn.open_table(ORDER_HISTORY_TABLE)?;
        let item_history_table = read_txn.open_table(ITEM_HISTORY_TABLE)?;

        Ok(StorageStats {
            order_count: orders_table.len()?,
            customer_count: customers_table.len()?,
            order_history_count: order_history_table.len()?,
            item_history_count: item_history_table.len()?,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub order_count: u64,
    pub customer_count: u64,
    pub order_history_count: u64,
    pub item_history_count: u64,
}
