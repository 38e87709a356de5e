//! Line item composition mechanics
//!
//! This module provides the merge-on-match primitives for interactive
//! order construction:
//! - `line_key`: content-addressed equivalence key for a line item
//! - `input_to_item`: convert a `LineItemInput` to a `LineItem`
//! - `add_or_merge`: fold an item into an existing equivalent line
//!
//! Two items are equivalent iff product_id and trimmed notes are equal
//! (case-sensitive). Merging sums quantities instead of creating a
//! duplicate row, so quantity never fragments across rows for the same
//! product+notes combination.

use sha2::{Digest, Sha256};
use shared::order::{LineItem, LineItemInput, OrderItemStatus};
use thiserror::Error;

/// Maximum allowed quantity per line item
pub const MAX_QUANTITY: u32 = 9999;

/// Composer errors - all rejected at the boundary, before any mutation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ComposerError {
    #[error("quantity must be between 1 and {MAX_QUANTITY}, got {0}")]
    InvalidQuantity(u32),

    #[error("a product must be selected before adding an item")]
    ProductRequired,

    #[error("line item not found: {0}")]
    ItemNotFound(String),
}

/// Generate the content-addressed line key for an item
///
/// The key is a hash of the item's identity-defining properties:
/// product_id and trimmed notes. Empty and whitespace-only notes hash
/// identically, so they fall into the same equivalence class. Items
/// with the same line key are merged (quantities added together).
pub fn line_key(product_id: &str, notes: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(product_id.as_bytes());
    // Separator so ("ab", "c") and ("a", "bc") never collide
    hasher.update([0u8]);
    hasher.update(notes.trim().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// Validate candidate values before processing
///
/// `product_id` is only required on the add path; the edit path falls
/// back to the edited item's product.
pub(crate) fn validate_input(input: &LineItemInput, adding: bool) -> Result<(), ComposerError> {
    if input.quantity < 1 || input.quantity > MAX_QUANTITY {
        return Err(ComposerError::InvalidQuantity(input.quantity));
    }
    if adding && input.product_id.is_none() {
        return Err(ComposerError::ProductRequired);
    }
    Ok(())
}

/// Recompute the derived line total; the only write path for it
pub(crate) fn recompute_line_total(item: &mut LineItem) {
    item.line_total = item.unit_price.times(item.quantity);
}

/// Convert validated input into a fresh line item
pub(crate) fn input_to_item(input: &LineItemInput, product_id: &str) -> LineItem {
    let mut item = LineItem {
        id: None,
        line_key: line_key(product_id, &input.notes),
        product_id: product_id.to_string(),
        product_name: input.product_name.clone(),
        product_size: input.product_size.clone(),
        quantity: input.quantity,
        notes: input.notes.clone(),
        unit_price: input.unit_price,
        line_total: shared::Money::ZERO,
        status: OrderItemStatus::New,
    };
    recompute_line_total(&mut item);
    item
}

/// Add an item to the collection, merging quantities when an equivalent
/// line already exists (the candidate row is discarded)
pub(crate) fn add_or_merge(items: &mut Vec<LineItem>, item: LineItem) {
    if let Some(existing) = items.iter_mut().find(|i| i.line_key == item.line_key) {
        existing.quantity += item.quantity;
        recompute_line_total(existing);
    } else {
        items.push(item);
    }
}
