use super::*;
use crate::orders::lifecycle::LifecycleError;
use crate::orders::storage::StorageError;
use rust_decimal::Decimal;
use shared::order::DiscountValidity;
use shared::{Customer, Money};

fn create_test_manager() -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    OrdersManager::with_storage(storage)
}

fn seed_customer(manager: &OrdersManager, name: &str, phone: &str) -> Customer {
    let customer = Customer::new(name.to_string(), phone.to_string());
    let txn = manager.storage().begin_write().unwrap();
    manager.storage().store_customer(&txn, &customer).unwrap();
    txn.commit().unwrap();
    customer
}

fn item_input(product_id: &str, quantity: u32, notes: &str, unit_price: &str) -> LineItemInput {
    LineItemInput {
        product_id: Some(product_id.to_string()),
        product_name: format!("Product {product_id}"),
        product_size: None,
        quantity,
        notes: notes.to_string(),
        unit_price: unit_price.parse().unwrap(),
    }
}

fn test_actor() -> ActorContext {
    ActorContext::new("op-1", "Alice").with_location("loc-1")
}

fn money(s: &str) -> Money {
    s.parse().unwrap()
}

/// Create a customer and an order for them, returning the order
fn create_test_order(manager: &OrdersManager) -> Order {
    let customer = seed_customer(manager, "Bob", "555-0100");
    manager.create_order(&customer.id, "loc-1").unwrap()
}

// ========================================================================
// Core tests
// ========================================================================

#[test]
fn test_create_order_for_unknown_customer_fails() {
    let manager = create_test_manager();
    let err = manager.create_order("missing", "loc-1");
    assert!(matches!(err, Err(ManagerError::CustomerNotFound(_))));
}

#[test]
fn test_create_order_for_inactive_customer_fails() {
    let manager = create_test_manager();
    let mut customer = Customer::new("Gone".to_string(), "555-0199".to_string());
    customer.active = false;
    let txn = manager.storage().begin_write().unwrap();
    manager.storage().store_customer(&txn, &customer).unwrap();
    txn.commit().unwrap();

    let err = manager.create_order(&customer.id, "loc-1");
    assert!(matches!(err, Err(ManagerError::CustomerNotFound(_))));
}

#[test]
fn test_create_order_persists_empty_new_order() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);

    assert_eq!(order.status, OrderStatus::New);
    assert_eq!(order.version, 1);
    assert!(order.items.is_empty());

    let stored = manager.get_order(&order.id).unwrap();
    assert_eq!(stored, order);
}

#[test]
fn test_get_unknown_order() {
    let manager = create_test_manager();
    assert!(matches!(
        manager.get_order("missing"),
        Err(ManagerError::OrderNotFound(_))
    ));
}

#[test]
fn test_add_items_and_totals() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);

    manager.add_item(&order.id, &item_input("bread", 2, "", "3.50")).unwrap();
    manager.add_item(&order.id, &item_input("cake", 1, "", "12.00")).unwrap();

    let totals = manager.totals(&order.id).unwrap();
    assert_eq!(totals.subtotal, money("19.00"));
    assert_eq!(totals.total, money("19.00"));
}

#[test]
fn test_add_equivalent_item_merges() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);

    let key_1 = manager.add_item(&order.id, &item_input("bread", 2, "sliced", "3.50")).unwrap();
    let key_2 = manager.add_item(&order.id, &item_input("bread", 1, " sliced ", "3.50")).unwrap();
    assert_eq!(key_1, key_2);

    let saved = manager.save_composition(&order.id, order.version).unwrap();
    assert_eq!(saved.items.len(), 1);
    assert_eq!(saved.items[0].quantity, 3);
}

#[test]
fn test_save_composition_bumps_version_and_assigns_item_ids() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);

    manager.add_item(&order.id, &item_input("bread", 2, "", "3.50")).unwrap();
    let saved = manager.save_composition(&order.id, order.version).unwrap();

    assert_eq!(saved.version, order.version + 1);
    assert_eq!(saved.subtotal, money("7.00"));
    assert!(saved.items[0].id.is_some());

    let stored = manager.get_order(&order.id).unwrap();
    assert_eq!(stored, saved);
}

#[test]
fn test_save_with_stale_version_rejected() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);

    manager.add_item(&order.id, &item_input("bread", 1, "", "3.50")).unwrap();
    manager.save_composition(&order.id, order.version).unwrap();

    // A second save with the version read before the first one
    let err = manager.save_composition(&order.id, order.version);
    assert!(matches!(
        err,
        Err(ManagerError::Storage(StorageError::VersionConflict { .. }))
    ));
}

#[test]
fn test_set_discount_and_validity() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);

    manager.add_item(&order.id, &item_input("cake", 1, "", "20.00")).unwrap();
    manager
        .set_discount(&order.id, DiscountSpec::percent(Decimal::from(10)))
        .unwrap();

    assert_eq!(manager.discount_validity(&order.id).unwrap(), DiscountValidity::Valid);
    let totals = manager.totals(&order.id).unwrap();
    assert_eq!(totals.applied_discount_value, money("2.00"));
    assert_eq!(totals.total, money("18.00"));
}

#[test]
fn test_negative_discount_rejected() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);

    manager.add_item(&order.id, &item_input("cake", 1, "", "20.00")).unwrap();
    let err = manager.set_discount(&order.id, DiscountSpec::fixed(Decimal::from(-3)));
    assert!(matches!(err, Err(ManagerError::Discount(_))));
    assert_eq!(
        manager.discount_validity(&order.id).unwrap(),
        DiscountValidity::Negative
    );
}

#[test]
fn test_transition_records_history() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);
    let actor = test_actor();

    manager.transition_status(&order.id, OrderStatus::Verified, &actor).unwrap();
    let updated = manager
        .transition_status(&order.id, OrderStatus::InProgress, &actor)
        .unwrap();
    assert_eq!(updated.status, OrderStatus::InProgress);

    let history = manager.order_history(&order.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].previous_status, OrderStatus::New);
    assert_eq!(history[0].new_status, OrderStatus::Verified);
    assert_eq!(history[1].new_status, OrderStatus::InProgress);
    assert_eq!(history[1].actor_id, "op-1");
}

#[test]
fn test_illegal_transition_records_nothing() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);
    let actor = test_actor();

    manager.transition_status(&order.id, OrderStatus::Cancelled, &actor).unwrap();
    let err = manager.transition_status(&order.id, OrderStatus::InProgress, &actor);
    assert!(matches!(
        err,
        Err(ManagerError::Lifecycle(LifecycleError::IllegalTransition { .. }))
    ));

    // Only the successful transition is in the history
    let history = manager.order_history(&order.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(manager.get_order(&order.id).unwrap().status, OrderStatus::Cancelled);
}

#[test]
fn test_allowed_transitions() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);
    let actor = test_actor();

    let allowed = manager.allowed_transitions(&order.id).unwrap();
    assert!(allowed.contains(&OrderStatus::Verified));
    assert!(allowed.contains(&OrderStatus::Cancelled));
    assert!(!allowed.contains(&OrderStatus::New));
    assert!(!allowed.contains(&OrderStatus::PickedUp));

    manager.transition_status(&order.id, OrderStatus::Cancelled, &actor).unwrap();
    assert!(manager.allowed_transitions(&order.id).unwrap().is_empty());
}

#[test]
fn test_item_status_change_and_history() {
    let manager = create_test_manager();
    let order = create_test_order(&manager);
    let actor = test_actor();

    let key = manager.add_item(&order.id, &item_input("bread", 1, "", "3.50")).unwrap();
    let saved = manager.save_composition(&order.id, order.version).unwrap();

    let updated = manager
        .set_item_status(&saved.id, &key, OrderItemStatus::InProgress, &actor)
        .unwrap();
    assert_eq!(updated.items[0].status, OrderItemStatus::InProgress);

    let history = manager.item_history(&order.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].line_key, key);
    assert_eq!(history[0].new_status, OrderItemStatus::InProgress);
}

#[test]
fn test_events_broadcast_on_writes() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    let order = create_test_order(&manager);
    assert!(matches!(
        rx.try_recv().unwrap(),
        EngineEvent::OrderCreated { .. }
    ));

    manager.add_item(&order.id, &item_input("bread", 1, "", "3.50")).unwrap();
    manager.save_composition(&order.id, order.version).unwrap();
    assert!(matches!(
        rx.try_recv().unwrap(),
        EngineEvent::CompositionSaved { version: 2, .. }
    ));

    manager
        .transition_status(&order.id, OrderStatus::Verified, &test_actor())
        .unwrap();
    assert!(matches!(
        rx.try_recv().unwrap(),
        EngineEvent::OrderStatusChanged(_)
    ));
}
