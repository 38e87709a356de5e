//! Generation-memoized derived totals
//!
//! The order totals form a small dependency graph:
//!
//! ```text
//!   items ──> subtotal ──> discount value ──> total
//!   discount spec ────────────┘
//! ```
//!
//! Each input carries a generation counter that writes bump; each
//! derived node remembers the generations it last computed against and
//! recomputes only when an input moved. The subtotal node bumps its own
//! generation only when the recomputed value actually changed, so item
//! edits that leave the subtotal identical skip the discount and total
//! recomputation entirely.

use shared::order::{DiscountKind, DiscountSpec, DiscountValidity, LineItem, OrderTotals};
use shared::Money;
use tracing::trace;

/// Memoized derived-totals state for one order draft
#[derive(Debug, Clone, Default)]
pub struct TotalsGraph {
    // Input generations
    items_gen: u64,
    discount_gen: u64,

    // Subtotal node
    subtotal: Money,
    subtotal_seen_items_gen: u64,
    subtotal_gen: u64,

    // Discount node
    raw_discount: Money,
    applied_discount: Money,
    validity: DiscountValidity,
    discount_seen: (u64, u64),

    // Total node
    total: Money,
    total_seen: (u64, u64),

    /// Set when the last discount write was rejected as negative; the
    /// discount degrades to zero until a valid spec arrives
    negative_input: bool,
}

impl TotalsGraph {
    pub fn new() -> Self {
        // Seen generations start behind the input generations so the
        // first refresh computes every node
        Self {
            items_gen: 1,
            discount_gen: 1,
            ..Default::default()
        }
    }

    /// Record an item mutation (add, edit, remove)
    pub fn note_items_changed(&mut self) {
        self.items_gen += 1;
    }

    /// Record a discount spec change; `negative` marks a rejected write
    pub fn note_discount_changed(&mut self, negative: bool) {
        self.discount_gen += 1;
        self.negative_input = negative;
    }

    /// Bring every stale node up to date against the current inputs
    pub fn refresh(&mut self, items: &[LineItem], spec: &DiscountSpec) {
        if self.subtotal_seen_items_gen != self.items_gen {
            let subtotal: Money = items.iter().map(|i| i.line_total).sum();
            if subtotal != self.subtotal {
                self.subtotal = subtotal;
                self.subtotal_gen += 1;
            }
            self.subtotal_seen_items_gen = self.items_gen;
            trace!(subtotal = %self.subtotal, generation = self.subtotal_gen, "subtotal refreshed");
        }

        let discount_inputs = (self.subtotal_gen, self.discount_gen);
        if self.discount_seen != discount_inputs {
            (self.raw_discount, self.applied_discount, self.validity) =
                self.compute_discount(spec);
            self.discount_seen = discount_inputs;
            trace!(
                applied = %self.applied_discount,
                validity = ?self.validity,
                "discount refreshed"
            );
        }

        let total_inputs = (self.subtotal_gen, self.discount_gen);
        if self.total_seen != total_inputs {
            self.total = self.subtotal.saturating_sub(self.applied_discount);
            self.total_seen = total_inputs;
        }
    }

    fn compute_discount(&self, spec: &DiscountSpec) -> (Money, Money, DiscountValidity) {
        if self.negative_input {
            return (Money::ZERO, Money::ZERO, DiscountValidity::Negative);
        }
        let raw = match spec.kind {
            DiscountKind::Percent => self.subtotal.percent(spec.amount),
            DiscountKind::Fixed => Money::new(spec.amount),
        };
        if raw > self.subtotal {
            // Rejected wholesale, not capped at the subtotal
            (raw, Money::ZERO, DiscountValidity::ExceedsSubtotal)
        } else {
            (raw, raw, DiscountValidity::Valid)
        }
    }

    /// Current totals snapshot; call `refresh` first
    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            raw_discount_value: self.raw_discount,
            applied_discount_value: self.applied_discount,
            total: self.total,
        }
    }

    pub fn validity(&self) -> DiscountValidity {
        self.validity
    }

    #[cfg(test)]
    pub(crate) fn subtotal_gen(&self) -> u64 {
        self.subtotal_gen
    }

    #[cfg(test)]
    pub(crate) fn discount_seen(&self) -> (u64, u64) {
        self.discount_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::composer::input_to_item;
    use rust_decimal::Decimal;
    use shared::order::LineItemInput;

    fn item(product_id: &str, quantity: u32, unit_price: &str) -> LineItem {
        input_to_item(
            &LineItemInput {
                product_id: Some(product_id.to_string()),
                product_name: "Test".to_string(),
                product_size: None,
                quantity,
                notes: String::new(),
                unit_price: unit_price.parse().unwrap(),
            },
            product_id,
        )
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_initial_refresh_computes_all_nodes() {
        let mut graph = TotalsGraph::new();
        let items = vec![item("a", 2, "3.00"), item("b", 1, "4.50")];
        graph.refresh(&items, &DiscountSpec::none());

        let totals = graph.totals();
        assert_eq!(totals.subtotal, money("10.50"));
        assert_eq!(totals.applied_discount_value, Money::ZERO);
        assert_eq!(totals.total, money("10.50"));
        assert_eq!(graph.validity(), DiscountValidity::Valid);
    }

    #[test]
    fn test_percent_discount() {
        let mut graph = TotalsGraph::new();
        let items = vec![item("a", 1, "100.00")];
        graph.refresh(&items, &DiscountSpec::percent(Decimal::from(10)));

        let totals = graph.totals();
        assert_eq!(totals.raw_discount_value, money("10.00"));
        assert_eq!(totals.applied_discount_value, money("10.00"));
        assert_eq!(totals.total, money("90.00"));
    }

    #[test]
    fn test_fixed_discount_exceeding_subtotal_rejected_wholesale() {
        let mut graph = TotalsGraph::new();
        let items = vec![item("a", 1, "5.00")];
        graph.refresh(&items, &DiscountSpec::fixed(Decimal::from(8)));

        let totals = graph.totals();
        assert_eq!(totals.raw_discount_value, money("8.00"));
        // Not capped at 5.00 - rejected entirely
        assert_eq!(totals.applied_discount_value, Money::ZERO);
        assert_eq!(totals.total, money("5.00"));
        assert_eq!(graph.validity(), DiscountValidity::ExceedsSubtotal);
    }

    #[test]
    fn test_fixed_discount_on_empty_order() {
        let mut graph = TotalsGraph::new();
        graph.refresh(&[], &DiscountSpec::fixed(Decimal::from(3)));

        let totals = graph.totals();
        assert_eq!(totals.subtotal, Money::ZERO);
        assert_eq!(totals.applied_discount_value, Money::ZERO);
        assert_eq!(totals.total, Money::ZERO);
        assert_eq!(graph.validity(), DiscountValidity::ExceedsSubtotal);
    }

    #[test]
    fn test_refresh_without_writes_is_a_no_op() {
        let mut graph = TotalsGraph::new();
        let items = vec![item("a", 2, "3.00")];
        let spec = DiscountSpec::percent(Decimal::from(10));
        graph.refresh(&items, &spec);

        let gen_before = graph.subtotal_gen();
        let seen_before = graph.discount_seen();
        graph.refresh(&items, &spec);
        graph.refresh(&items, &spec);

        assert_eq!(graph.subtotal_gen(), gen_before);
        assert_eq!(graph.discount_seen(), seen_before);
    }

    #[test]
    fn test_subtotal_preserving_edit_skips_discount_recompute() {
        let mut graph = TotalsGraph::new();
        let spec = DiscountSpec::percent(Decimal::from(10));

        // 2 x 3.00 = 6.00
        let items = vec![item("a", 2, "3.00")];
        graph.refresh(&items, &spec);
        let gen_before = graph.subtotal_gen();
        let seen_before = graph.discount_seen();

        // Swap for a different composition with the same subtotal
        let items = vec![item("b", 3, "2.00")];
        graph.note_items_changed();
        graph.refresh(&items, &spec);

        // Subtotal value unchanged, so its generation did not bump and
        // the discount node saw nothing stale
        assert_eq!(graph.subtotal_gen(), gen_before);
        assert_eq!(graph.discount_seen(), seen_before);
        assert_eq!(graph.totals().total, money("5.40"));
    }

    #[test]
    fn test_item_change_invalidates_downstream() {
        let mut graph = TotalsGraph::new();
        let spec = DiscountSpec::percent(Decimal::from(10));
        let mut items = vec![item("a", 1, "100.00")];
        graph.refresh(&items, &spec);

        items.push(item("b", 1, "50.00"));
        graph.note_items_changed();
        graph.refresh(&items, &spec);

        let totals = graph.totals();
        assert_eq!(totals.subtotal, money("150.00"));
        assert_eq!(totals.applied_discount_value, money("15.00"));
        assert_eq!(totals.total, money("135.00"));
    }

    #[test]
    fn test_negative_discount_degrades_to_zero() {
        let mut graph = TotalsGraph::new();
        let items = vec![item("a", 1, "10.00")];
        graph.note_discount_changed(true);
        graph.refresh(&items, &DiscountSpec::none());

        assert_eq!(graph.validity(), DiscountValidity::Negative);
        assert_eq!(graph.totals().applied_discount_value, Money::ZERO);
        assert_eq!(graph.totals().total, money("10.00"));

        // A later valid spec clears the condition
        graph.note_discount_changed(false);
        graph.refresh(&items, &DiscountSpec::percent(Decimal::from(50)));
        assert_eq!(graph.validity(), DiscountValidity::Valid);
        assert_eq!(graph.totals().total, money("5.00"));
    }

    #[test]
    fn test_exceeds_subtotal_recovers_when_items_grow() {
        let mut graph = TotalsGraph::new();
        let spec = DiscountSpec::fixed(Decimal::from(8));
        let mut items = vec![item("a", 1, "5.00")];
        graph.refresh(&items, &spec);
        assert_eq!(graph.validity(), DiscountValidity::ExceedsSubtotal);

        items.push(item("b", 1, "5.00"));
        graph.note_items_changed();
        graph.refresh(&items, &spec);

        assert_eq!(graph.validity(), DiscountValidity::Valid);
        assert_eq!(graph.totals().total, money("2.00"));
    }
}
