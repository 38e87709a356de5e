//! Customer directory
//!
//! Thin service over the customer table: explicit creation, lookup by
//! phone with implicit creation for walk-in orders, and the deletion
//! cascade. Phone numbers are matched exactly against active customers
//! only, so a deleted customer's number can be reused by a new record.

use super::cascade::{self, CascadeOutcome, CascadeResult, DeletionEvaluation};
use crate::orders::storage::{OrderStorage, StorageError};
use shared::order::ActorContext;
use shared::Customer;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Customer directory service
#[derive(Clone)]
pub struct CustomerDirectory {
    storage: OrderStorage,
}

impl CustomerDirectory {
    pub fn new(storage: OrderStorage) -> Self {
        Self { storage }
    }

    /// Register a customer explicitly
    pub fn register(&self, name: &str, phone: &str) -> DirectoryResult<Customer> {
        let customer = Customer::new(name.to_string(), phone.to_string());
        let txn = self.storage.begin_write()?;
        self.storage.store_customer(&txn, &customer)?;
        self.storage.commit(txn)?;
        debug!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    /// Get an active customer by ID
    pub fn get(&self, customer_id: &str) -> DirectoryResult<Customer> {
        self.storage
            .get_customer(customer_id)?
            .filter(|c| c.active)
            .ok_or_else(|| DirectoryError::CustomerNotFound(customer_id.to_string()))
    }

    /// Find an active customer by exact phone number
    pub fn find_by_phone(&self, phone: &str) -> DirectoryResult<Option<Customer>> {
        Ok(self.storage.find_active_customer_by_phone(phone)?)
    }

    /// Find an active customer by phone, creating one when none exists
    ///
    /// This is the walk-in path: an order names a phone number and the
    /// directory resolves it to a customer either way.
    pub fn find_or_create(&self, name: &str, phone: &str) -> DirectoryResult<Customer> {
        if let Some(existing) = self.find_by_phone(phone)? {
            return Ok(existing);
        }
        self.register(name, phone)
    }

    /// List customers, optionally including deactivated ones
    pub fn list(&self, include_inactive: bool) -> DirectoryResult<Vec<Customer>> {
        Ok(self.storage.get_all_customers(include_inactive)?)
    }

    /// Check what deleting a customer would do, without writing anything
    pub fn evaluate_deletion(&self, customer_id: &str) -> CascadeResult<DeletionEvaluation> {
        cascade::evaluate_deletion(&self.storage, customer_id)
    }

    /// Delete a customer, cancelling their open orders
    pub fn delete(&self, customer_id: &str, actor: &ActorContext) -> CascadeResult<CascadeOutcome> {
        cascade::delete_customer(&self.storage, customer_id, actor)
    }
}
