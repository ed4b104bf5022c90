//! Cart engine integration tests: quantity invariants, reconciliation,
//! the checkout gate and snapshot persistence.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{discounted_product, product};
use shared::{AdjustmentTrigger, RemovalReason};
use storefront::adapters::{MemoryStore, PersistentStore, StaticSource};
use storefront::{CartStore, Config, CustomerInfo, DeliveryMethod, Storefront};

fn test_config() -> Config {
    Config {
        persist_debounce: Duration::from_millis(10),
        ..Config::default()
    }
}

fn volatile_cart() -> CartStore {
    CartStore::new(None, &test_config())
}

fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Ana".to_string(),
        customer_id: "V-12345678".to_string(),
        delivery: DeliveryMethod::Caracas,
        payment: "Pago móvil".to_string(),
    }
}

// ============ Quantity invariants ============

#[tokio::test]
async fn test_unlimited_stock_clamps_to_cap() {
    // Scenario: available -1 means unlimited, capped at 100
    let cart = volatile_cart();
    let p = product(1, -1, 0);

    cart.add(&p, 150, None, false).await;

    let items = cart.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].qty, 100);
}

#[tokio::test]
async fn test_add_to_existing_line_clamps_silently() {
    let cart = volatile_cart();
    let p = product(2, 3, 2); // max = 5

    cart.add(&p, 3, None, false).await;
    cart.add(&p, 4, None, false).await;

    let items = cart.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].qty, 5);
}

#[tokio::test]
async fn test_add_unpurchasable_is_noop() {
    let cart = volatile_cart();
    cart.add(&product(1, 0, 0), 1, None, false).await;
    cart.add(&product(2, -3, 5), 1, None, false).await;
    assert!(cart.is_empty().await);
}

#[tokio::test]
async fn test_add_captures_price_and_discount_snapshot() {
    let cart = volatile_cart();
    let p = discounted_product(1, 10.0, 8.0);

    cart.add(&p, 1, None, false).await;

    let items = cart.items().await;
    assert_eq!(items[0].unit_price, 8.0);
    assert!(items[0].discount_applied);
    assert_eq!(items[0].name, "Product 1");
    assert_eq!(items[0].sku, "SKU-1");
}

#[tokio::test]
async fn test_update_zero_removes_line() {
    // update(id, 0) is equivalent to remove(id)
    let cart = volatile_cart();
    let p = product(1, 10, 0);
    cart.add(&p, 2, None, false).await;

    cart.update(1, 0, Some(p.max_purchasable())).await;

    assert!(cart.is_empty().await);
}

#[tokio::test]
async fn test_update_clamps_to_max() {
    let cart = volatile_cart();
    let p = product(1, 4, 0);
    cart.add(&p, 1, None, false).await;

    cart.update(1, 99, Some(p.max_purchasable())).await;
    assert_eq!(cart.items().await[0].qty, 4);

    // Unknown product: no clamp applies
    cart.update(1, 99, None).await;
    assert_eq!(cart.items().await[0].qty, 99);
}

#[tokio::test]
async fn test_totals() {
    let cart = volatile_cart();
    cart.add(&discounted_product(1, 10.0, 8.0), 2, None, false).await;
    cart.add(&product(2, 10, 0), 3, None, false).await;

    assert_eq!(cart.total_items().await, 5);
    assert!((cart.subtotal_usd().await - (2.0 * 8.0 + 3.0 * 10.0)).abs() < 1e-9);
}

// ============ Reconciliation ============

#[tokio::test]
async fn test_reconcile_reduces_overstocked_line() {
    // Scenario: qty 5 in cart, catalog drops to max 1
    let cart = volatile_cart();
    cart.add(&product(2, 3, 2), 5, None, false).await;

    let report = cart
        .reconcile_with_products(&[product(2, 1, 0)], AdjustmentTrigger::Refresh)
        .await
        .expect("report expected");

    assert!(report.removed.is_empty());
    assert_eq!(report.reduced.len(), 1);
    assert_eq!(report.reduced[0].product_id, 2);
    assert_eq!(report.reduced[0].from, 5);
    assert_eq!(report.reduced[0].to, 1);
    assert_eq!(cart.items().await[0].qty, 1);
}

#[tokio::test]
async fn test_reconcile_removes_missing_product() {
    let cart = volatile_cart();
    cart.add(&product(3, 10, 0), 2, None, false).await;

    let report = cart
        .reconcile_with_products(&[], AdjustmentTrigger::Refresh)
        .await
        .expect("report expected");

    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.removed[0].product_id, 3);
    assert_eq!(report.removed[0].reason, RemovalReason::Missing);
    assert!(cart.is_empty().await);
}

#[tokio::test]
async fn test_reconcile_removes_out_of_stock_product() {
    let cart = volatile_cart();
    cart.add(&product(4, 2, 0), 2, None, false).await;

    let report = cart
        .reconcile_with_products(&[product(4, 0, 0)], AdjustmentTrigger::Refresh)
        .await
        .expect("report expected");

    assert_eq!(report.removed[0].reason, RemovalReason::NoStock);
    assert!(cart.is_empty().await);
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let cart = volatile_cart();
    cart.add(&product(2, 3, 2), 5, None, false).await;
    let snapshot = vec![product(2, 1, 0)];

    assert!(cart
        .reconcile_with_products(&snapshot, AdjustmentTrigger::Refresh)
        .await
        .is_some());
    // Same snapshot again: nothing to adjust, no report, no mutation
    assert!(cart
        .reconcile_with_products(&snapshot, AdjustmentTrigger::Refresh)
        .await
        .is_none());
    assert_eq!(cart.items().await[0].qty, 1);
}

#[tokio::test]
async fn test_reconcile_unchanged_returns_none() {
    let cart = volatile_cart();
    let p = product(1, 10, 0);
    cart.add(&p, 2, None, false).await;

    assert!(cart
        .reconcile_with_products(&[p], AdjustmentTrigger::Refresh)
        .await
        .is_none());
    assert_eq!(cart.items().await[0].qty, 2);
}

#[tokio::test]
async fn test_pending_report_overwrite_and_consume() {
    let cart = volatile_cart();
    cart.add(&product(1, 10, 0), 2, None, false).await;

    let first = cart
        .reconcile_with_products(&[product(1, 1, 0)], AdjustmentTrigger::Refresh)
        .await
        .expect("report expected");
    cart.publish(first).await;

    let second = cart
        .reconcile_with_products(&[], AdjustmentTrigger::Checkout)
        .await
        .expect("report expected");
    cart.publish(second.clone()).await;

    // Exactly one report is live; the newer one wins
    assert_eq!(cart.pending_adjustments().await, Some(second));
    cart.consume_pending_adjustments().await;
    assert!(cart.pending_adjustments().await.is_none());
}

// ============ Persistence ============

#[tokio::test]
async fn test_cart_snapshot_round_trip() {
    let store: Arc<dyn PersistentStore> = Arc::new(MemoryStore::new());
    let config = test_config();

    {
        let cart = CartStore::new(Some(store.clone()), &config);
        cart.add(&product(1, 10, 0), 2, None, false).await;
        cart.add(&product(2, 10, 0), 3, None, false).await;
        // Let the write-behind worker flush
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let cart = CartStore::new(Some(store), &config);
    cart.restore().await;
    let pairs: Vec<(i64, u32)> = cart
        .items()
        .await
        .iter()
        .map(|it| (it.product_id, it.qty))
        .collect();
    assert_eq!(pairs, vec![(1, 2), (2, 3)]);
}

#[tokio::test]
async fn test_restore_drops_malformed_entries() {
    let store: Arc<dyn PersistentStore> = Arc::new(MemoryStore::new());
    store
        .set_value(
            "cart_items_v1",
            serde_json::json!([
                {"product_id": 1, "sku": "SKU-1", "name": "Good", "qty": 2,
                 "unit_price": 10.0, "discount_applied": false},
                {"product_id": 2, "sku": "SKU-2", "name": "Zero qty", "qty": 0,
                 "unit_price": 10.0, "discount_applied": false},
                {"product_id": "not-a-number", "sku": "SKU-3", "name": "Bad id", "qty": 1,
                 "unit_price": 10.0, "discount_applied": false},
                {"product_id": 4, "sku": "SKU-4", "name": "Negative", "qty": -2,
                 "unit_price": 10.0, "discount_applied": false}
            ]),
        )
        .await
        .unwrap();

    let cart = CartStore::new(Some(store), &test_config());
    cart.restore().await;

    let items = cart.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, 1);
    assert_eq!(items[0].qty, 2);
}

// ============ Checkout gate ============

#[tokio::test]
async fn test_checkout_blocked_by_pending_adjustments() {
    let source = Arc::new(StaticSource::new(vec![product(1, 5, 0)], 36.5));
    let storefront = Storefront::new(source, None, test_config());
    storefront.init().await;
    assert!(storefront.add_to_cart(1, 5).await);

    // A line for a product the catalog no longer carries
    storefront.cart.add(&product(99, 10, 0), 1, None, false).await;

    let result = storefront.submit_order(&customer()).await;
    assert!(matches!(
        result,
        Err(storefront::CheckoutError::AdjustmentsPending)
    ));

    // Report published with the checkout trigger; order not built
    let report = storefront
        .cart
        .pending_adjustments()
        .await
        .expect("report expected");
    assert_eq!(report.trigger, AdjustmentTrigger::Checkout);
    assert_eq!(report.removed[0].product_id, 99);

    // After acknowledging, the adjusted cart goes through
    storefront.cart.consume_pending_adjustments().await;
    let message = storefront.submit_order(&customer()).await.expect("order sends");
    assert!(message.contains("5x Product 1"));
}

#[tokio::test]
async fn test_checkout_empty_cart_rejected() {
    let source = Arc::new(StaticSource::new(vec![product(1, 5, 0)], 36.5));
    let storefront = Storefront::new(source, None, test_config());
    storefront.init().await;

    assert!(matches!(
        storefront.submit_order(&customer()).await,
        Err(storefront::CheckoutError::EmptyCart)
    ));
}

#[tokio::test]
async fn test_customer_info_persists_across_sessions() {
    let source = Arc::new(StaticSource::new(vec![product(1, 5, 0)], 36.5));
    let store: Arc<dyn PersistentStore> = Arc::new(MemoryStore::new());

    {
        let storefront = Storefront::new(source.clone(), Some(store.clone()), test_config());
        assert!(storefront.load_customer_info().await.is_none());
        storefront.save_customer_info(&customer()).await;
    }

    let storefront = Storefront::new(source, Some(store), test_config());
    let info = storefront.load_customer_info().await.expect("info saved");
    assert_eq!(info, customer());
}

#[tokio::test]
async fn test_refresh_reconciles_nonempty_cart() {
    let source = Arc::new(StaticSource::new(vec![product(1, 5, 0)], 36.5));
    let storefront = Storefront::new(source.clone(), None, test_config());
    storefront.init().await;
    storefront.add_to_cart(1, 5).await;

    source.set_products(vec![product(1, 2, 0)]);
    storefront.refresh(true).await;

    let report = storefront
        .cart
        .pending_adjustments()
        .await
        .expect("report expected");
    assert_eq!(report.trigger, AdjustmentTrigger::Refresh);
    assert_eq!(report.reduced[0].from, 5);
    assert_eq!(report.reduced[0].to, 2);
    assert_eq!(storefront.cart.items().await[0].qty, 2);
}
