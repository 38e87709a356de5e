//! Interactive order composition
//!
//! `OrderComposition` is the mutable working state of one order draft:
//! the line items, the discount spec, and the memoized totals graph.
//! Every mutation goes through here so the graph's input generations
//! stay in step with the data, and the collection invariant holds at
//! all times: at most one line item per (product_id, trimmed notes)
//! equivalence class.

use shared::order::{
    DiscountSpec, DiscountValidity, LineItem, LineItemInput, NegativeDiscount, OrderTotals,
};
use tracing::debug;

use super::composer::{
    add_or_merge, input_to_item, line_key, recompute_line_total, validate_input, ComposerError,
};
use super::totals::TotalsGraph;

/// Working state of one order draft
#[derive(Debug, Clone)]
pub struct OrderComposition {
    items: Vec<LineItem>,
    discount: DiscountSpec,
    graph: TotalsGraph,
}

impl Default for OrderComposition {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderComposition {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            discount: DiscountSpec::none(),
            graph: TotalsGraph::new(),
        }
    }

    /// Rebuild a composition from stored order state
    pub fn from_parts(items: Vec<LineItem>, discount: DiscountSpec) -> Self {
        Self {
            items,
            discount,
            graph: TotalsGraph::new(),
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn discount(&self) -> &DiscountSpec {
        &self.discount
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item, merging into an existing equivalent line if present
    pub fn add_item(&mut self, input: &LineItemInput) -> Result<String, ComposerError> {
        validate_input(input, true)?;
        let product_id = input.product_id.as_deref().ok_or(ComposerError::ProductRequired)?;
        let item = input_to_item(input, product_id);
        let key = item.line_key.clone();
        add_or_merge(&mut self.items, item);
        self.graph.note_items_changed();
        debug!(line_key = %key, "item added");
        Ok(key)
    }

    /// Edit an existing item in place
    ///
    /// When the edit moves the item into another item's equivalence
    /// class (same product, notes edited to match), the two rows merge:
    /// the edited quantity folds into the surviving row and the edited
    /// row is removed.
    pub fn update_item(
        &mut self,
        key: &str,
        input: &LineItemInput,
    ) -> Result<String, ComposerError> {
        validate_input(input, false)?;
        let pos = self
            .items
            .iter()
            .position(|i| i.line_key == key)
            .ok_or_else(|| ComposerError::ItemNotFound(key.to_string()))?;

        let product_id = input
            .product_id
            .clone()
            .unwrap_or_else(|| self.items[pos].product_id.clone());
        let new_key = line_key(&product_id, &input.notes);

        let survivor = if new_key != key {
            self.items.iter_mut().find(|i| i.line_key == new_key)
        } else {
            None
        };
        if let Some(survivor) = survivor {
            // Merge into the existing equivalent row
            survivor.quantity += input.quantity;
            recompute_line_total(survivor);
            self.items.remove(pos);
            debug!(from = %key, into = %new_key, "item edit merged rows");
        } else {
            let item = &mut self.items[pos];
            item.product_id = product_id;
            item.product_name = input.product_name.clone();
            item.product_size = input.product_size.clone();
            item.quantity = input.quantity;
            item.notes = input.notes.clone();
            item.unit_price = input.unit_price;
            item.line_key = new_key.clone();
            recompute_line_total(item);
        }

        self.graph.note_items_changed();
        Ok(new_key)
    }

    /// Remove an item by its line key
    ///
    /// Idempotent: removing an absent key is a no-op that returns `None`
    /// and leaves the totals graph untouched.
    pub fn remove_item(&mut self, key: &str) -> Option<LineItem> {
        let pos = self.items.iter().position(|i| i.line_key == key)?;
        let removed = self.items.remove(pos);
        self.graph.note_items_changed();
        Some(removed)
    }

    /// Replace the discount spec
    ///
    /// Negative amounts are rejected before any state mutates; the
    /// rejection is remembered and surfaces as `DiscountValidity::Negative`
    /// (with a zero applied discount) until a valid spec arrives.
    pub fn set_discount(&mut self, spec: DiscountSpec) -> Result<(), NegativeDiscount> {
        if let Err(err) = spec.validate() {
            self.graph.note_discount_changed(true);
            return Err(err);
        }
        self.discount = spec;
        self.graph.note_discount_changed(false);
        Ok(())
    }

    /// Current totals, refreshing any stale node first
    pub fn totals(&mut self) -> OrderTotals {
        self.graph.refresh(&self.items, &self.discount);
        self.graph.totals()
    }

    /// Current discount validity, refreshing any stale node first
    pub fn discount_validity(&mut self) -> DiscountValidity {
        self.graph.refresh(&self.items, &self.discount);
        self.graph.validity()
    }
}
