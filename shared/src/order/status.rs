//! Order and item lifecycle statuses
//!
//! The two lifecycles are independent: an order moves through the full
//! fulfillment progression while each of its items tracks its own
//! production state. Classification sets (terminal, pre-production,
//! in-production) drive policy elsewhere; note that the customer
//! deletion cascade uses its own, broader blocking set.

use serde::{Deserialize, Serialize};

/// Order status in the fulfillment lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Verified,
    NotOk,
    Cancelled,
    InProgress,
    Baked,
    Packaged,
    ReadyForPickup,
    PickedUp,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::New,
        OrderStatus::Verified,
        OrderStatus::NotOk,
        OrderStatus::Cancelled,
        OrderStatus::InProgress,
        OrderStatus::Baked,
        OrderStatus::Packaged,
        OrderStatus::ReadyForPickup,
        OrderStatus::PickedUp,
    ];

    /// No further transitions are permitted out of a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::PickedUp)
    }

    /// Statuses preceding any manufacturing step
    pub fn is_pre_production(&self) -> bool {
        matches!(
            self,
            OrderStatus::New | OrderStatus::Verified | OrderStatus::NotOk
        )
    }

    /// Statuses where the order is being manufactured
    pub fn is_in_production(&self) -> bool {
        matches!(
            self,
            OrderStatus::InProgress | OrderStatus::Baked | OrderStatus::Packaged
        )
    }

    /// Legal next statuses from the current one
    ///
    /// Any non-terminal status may be assigned from a non-terminal
    /// status (including Cancelled, which is how orders are abandoned);
    /// terminal statuses allow nothing. This is the minimal guard the
    /// presentation layer already implied, enforced server-side.
    pub fn allowed_next_statuses(&self) -> Vec<OrderStatus> {
        if self.is_terminal() {
            return Vec::new();
        }
        OrderStatus::ALL
            .into_iter()
            .filter(|s| s != self && (!s.is_terminal() || *s == OrderStatus::Cancelled))
            .collect()
    }

    /// Whether assigning `next` from this status is legal
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next_statuses().contains(&next)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::New => "NEW",
            OrderStatus::Verified => "VERIFIED",
            OrderStatus::NotOk => "NOT_OK",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Baked => "BAKED",
            OrderStatus::Packaged => "PACKAGED",
            OrderStatus::ReadyForPickup => "READY_FOR_PICKUP",
            OrderStatus::PickedUp => "PICKED_UP",
        };
        write!(f, "{}", name)
    }
}

/// Order item status (independent lifecycle)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderItemStatus {
    #[default]
    New,
    Verified,
    NotOk,
    Cancelled,
    InProgress,
    Baked,
}

impl OrderItemStatus {
    pub const ALL: [OrderItemStatus; 6] = [
        OrderItemStatus::New,
        OrderItemStatus::Verified,
        OrderItemStatus::NotOk,
        OrderItemStatus::Cancelled,
        OrderItemStatus::InProgress,
        OrderItemStatus::Baked,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderItemStatus::Cancelled)
    }

    /// Legal next statuses; same shape as the order-level guard
    pub fn allowed_next_statuses(&self) -> Vec<OrderItemStatus> {
        if self.is_terminal() {
            return Vec::new();
        }
        OrderItemStatus::ALL
            .into_iter()
            .filter(|s| s != self)
            .collect()
    }

    pub fn can_transition_to(&self, next: OrderItemStatus) -> bool {
        self.allowed_next_statuses().contains(&next)
    }
}

impl std::fmt::Display for OrderItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderItemStatus::New => "NEW",
            OrderItemStatus::Verified => "VERIFIED",
            OrderItemStatus::NotOk => "NOT_OK",
            OrderItemStatus::Cancelled => "CANCELLED",
            OrderItemStatus::InProgress => "IN_PROGRESS",
            OrderItemStatus::Baked => "BAKED",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_sets() {
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::PickedUp.is_terminal());
        assert!(!OrderStatus::ReadyForPickup.is_terminal());

        assert!(OrderStatus::New.is_pre_production());
        assert!(OrderStatus::Verified.is_pre_production());
        assert!(OrderStatus::NotOk.is_pre_production());
        assert!(!OrderStatus::InProgress.is_pre_production());

        assert!(OrderStatus::InProgress.is_in_production());
        assert!(OrderStatus::Baked.is_in_production());
        assert!(OrderStatus::Packaged.is_in_production());
        // ReadyForPickup is deliberately NOT in-production
        assert!(!OrderStatus::ReadyForPickup.is_in_production());
    }

    #[test]
    fn test_terminal_statuses_allow_nothing() {
        assert!(OrderStatus::Cancelled.allowed_next_statuses().is_empty());
        assert!(OrderStatus::PickedUp.allowed_next_statuses().is_empty());
        assert!(OrderItemStatus::Cancelled.allowed_next_statuses().is_empty());
    }

    #[test]
    fn test_cancelled_reachable_from_any_non_terminal() {
        for status in OrderStatus::ALL {
            if status.is_terminal() {
                continue;
            }
            assert!(
                status.can_transition_to(OrderStatus::Cancelled),
                "{} should allow cancellation",
                status
            );
        }
    }

    #[test]
    fn test_picked_up_never_an_allowed_target() {
        // PickedUp is terminal but is not Cancelled, so the guard
        // excludes it from direct assignment via the generic rule
        for status in OrderStatus::ALL {
            assert!(!status.allowed_next_statuses().contains(&OrderStatus::PickedUp));
        }
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&OrderStatus::ReadyForPickup).unwrap();
        assert_eq!(json, "\"READY_FOR_PICKUP\"");
        let back: OrderStatus = serde_json::from_str("\"NOT_OK\"").unwrap();
        assert_eq!(back, OrderStatus::NotOk);
    }
}
