//! Cart engine store
//!
//! Owns the cart line items and enforces the purchasable-quantity
//! invariant on every mutation: no line ever exceeds the matching
//! product's `max_purchasable`. Reconciliation adjusts lines against a
//! catalog snapshot and reports what changed; the report blocks checkout
//! until the UI acknowledges it.

use std::collections::HashMap;
use std::sync::Arc;

use shared::{
    pricing, AdjustmentReport, AdjustmentTrigger, CartItem, Product, ReducedItem, RemovalReason,
    RemovedItem,
};
use tokio::sync::RwLock;

use super::persist::DebouncedWriter;
use crate::adapters::PersistentStore;
use crate::config::{self, Config};

#[derive(Default)]
struct CartState {
    items: Vec<CartItem>,
    pending: Option<AdjustmentReport>,
}

/// Cart engine store
///
/// Must be created inside a tokio runtime when a persistent store is
/// attached (the write-behind worker is spawned at construction).
pub struct CartStore {
    store: Option<Arc<dyn PersistentStore>>,
    persister: Option<DebouncedWriter<Vec<CartItem>>>,
    state: RwLock<CartState>,
}

impl CartStore {
    pub fn new(store: Option<Arc<dyn PersistentStore>>, config: &Config) -> Self {
        let persister = store
            .clone()
            .map(|s| DebouncedWriter::spawn(s, config::KV_CART_ITEMS, config.persist_debounce));
        Self {
            store,
            persister,
            state: RwLock::new(CartState::default()),
        }
    }

    // ============ Read accessors ============

    pub async fn items(&self) -> Vec<CartItem> {
        self.state.read().await.items.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.items.is_empty()
    }

    /// Total unit count across all lines.
    pub async fn total_items(&self) -> u32 {
        self.state.read().await.items.iter().map(|it| it.qty).sum()
    }

    /// USD subtotal from the captured unit prices.
    pub async fn subtotal_usd(&self) -> f64 {
        self.state
            .read()
            .await
            .items
            .iter()
            .map(|it| it.qty as f64 * it.unit_price)
            .sum()
    }

    // ============ Startup restore ============

    /// Load the persisted snapshot, dropping entries that fail shape
    /// validation (non-numeric id, non-positive quantity).
    pub async fn restore(&self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let raw = match store.get_value(config::KV_CART_ITEMS).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Cart restore failed");
                return;
            }
        };

        let entries = match raw {
            serde_json::Value::Array(entries) => entries,
            _ => {
                tracing::warn!("Persisted cart snapshot is not an array; ignoring");
                return;
            }
        };

        let items: Vec<CartItem> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<CartItem>(entry).ok())
            .filter(|it| it.qty > 0)
            .collect();

        let count = items.len();
        self.state.write().await.items = items;
        tracing::info!(count, "Restored cart from storage");
    }

    // ============ Mutations ============

    /// Add `qty` units of a product, clamping to its purchasable maximum.
    ///
    /// No-op when the product is not purchasable. Overflow past the
    /// maximum clamps silently instead of erroring. The unit price and
    /// discount flag are captured as add-time snapshots.
    pub async fn add(&self, product: &Product, qty: u32, unit_price: Option<f64>, discount_applied: bool) {
        let max = product.max_purchasable();
        if max == 0 || qty == 0 {
            return;
        }

        let mut state = self.state.write().await;
        if let Some(existing) = state.items.iter_mut().find(|it| it.product_id == product.id) {
            existing.qty = (existing.qty + qty).min(max);
        } else {
            let price = unit_price.unwrap_or_else(|| pricing::final_price(product));
            let discount_applied = pricing::usd_discount(product).is_some() || discount_applied;
            state.items.push(CartItem {
                product_id: product.id,
                sku: product.sku.clone(),
                name: product.name.clone(),
                qty: qty.min(max),
                unit_price: price,
                discount_applied,
            });
        }
        let snapshot = state.items.clone();
        drop(state);
        self.persist_snapshot(snapshot);
    }

    /// Set a line's quantity. Zero removes the line; otherwise the value
    /// is clamped to `max` when the matching product is known.
    pub async fn update(&self, product_id: i64, qty: u32, max: Option<u32>) {
        if qty == 0 {
            self.remove(product_id).await;
            return;
        }
        let clamped = max.map_or(qty, |max| qty.min(max));

        let mut state = self.state.write().await;
        for item in state.items.iter_mut() {
            if item.product_id == product_id {
                item.qty = clamped;
            }
        }
        let snapshot = state.items.clone();
        drop(state);
        self.persist_snapshot(snapshot);
    }

    pub async fn remove(&self, product_id: i64) {
        let mut state = self.state.write().await;
        state.items.retain(|it| it.product_id != product_id);
        let snapshot = state.items.clone();
        drop(state);
        self.persist_snapshot(snapshot);
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.items.clear();
        drop(state);
        self.persist_snapshot(Vec::new());
    }

    // ============ Reconciliation ============

    /// Adjust every line against a catalog snapshot.
    ///
    /// Missing products and products with no purchasable stock drop their
    /// lines; quantities above the purchasable maximum are clamped. When
    /// anything changed the line list is replaced atomically and a report
    /// is returned; otherwise nothing is mutated and `None` comes back,
    /// which keeps repeated passes over the same snapshot silent.
    pub async fn reconcile_with_products(
        &self,
        products: &[Product],
        trigger: AdjustmentTrigger,
    ) -> Option<AdjustmentReport> {
        let mut state = self.state.write().await;
        if state.items.is_empty() {
            return None;
        }

        let by_id: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();
        let mut removed = Vec::new();
        let mut reduced = Vec::new();
        let mut next_items = Vec::with_capacity(state.items.len());

        for item in &state.items {
            let Some(product) = by_id.get(&item.product_id) else {
                removed.push(RemovedItem {
                    product_id: item.product_id,
                    sku: item.sku.clone(),
                    name: item.name.clone(),
                    reason: RemovalReason::Missing,
                });
                continue;
            };
            let max = product.max_purchasable();
            if max == 0 {
                removed.push(RemovedItem {
                    product_id: item.product_id,
                    sku: item.sku.clone(),
                    name: item.name.clone(),
                    reason: RemovalReason::NoStock,
                });
                continue;
            }
            if item.qty > max {
                reduced.push(ReducedItem {
                    product_id: item.product_id,
                    sku: item.sku.clone(),
                    name: item.name.clone(),
                    from: item.qty,
                    to: max,
                });
                next_items.push(CartItem {
                    qty: max,
                    ..item.clone()
                });
            } else {
                next_items.push(item.clone());
            }
        }

        if removed.is_empty() && reduced.is_empty() {
            return None;
        }

        state.items = next_items;
        let snapshot = state.items.clone();
        drop(state);
        self.persist_snapshot(snapshot);

        Some(AdjustmentReport {
            trigger,
            removed,
            reduced,
        })
    }

    // ============ Pending report ============

    /// Publish a report for the UI. A newer report overwrites an
    /// unacknowledged one; exactly one report is live at a time.
    pub async fn publish(&self, report: AdjustmentReport) {
        self.state.write().await.pending = Some(report);
    }

    pub async fn pending_adjustments(&self) -> Option<AdjustmentReport> {
        self.state.read().await.pending.clone()
    }

    /// Acknowledge and clear the pending report (UI closes the dialog).
    pub async fn consume_pending_adjustments(&self) {
        self.state.write().await.pending = None;
    }

    fn persist_snapshot(&self, snapshot: Vec<CartItem>) {
        if let Some(persister) = &self.persister {
            persister.enqueue(snapshot);
        }
    }
}
