//! Customer model

use serde::{Deserialize, Serialize};

/// A customer account
///
/// Customers are created explicitly at the counter or implicitly when
/// an order names a phone number with no matching active customer.
/// They are never hard-deleted: the deletion cascade flips `active` to
/// false so historical orders stay attributable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub active: bool,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Customer {
    pub fn new(name: String, phone: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            phone,
            active: true,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
