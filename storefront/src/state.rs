//! Composed storefront state
//!
//! Wires the catalog cache and the cart engine together: catalog changes
//! trigger cart reconciliation, and checkout runs through the adjustment
//! gate before the order message is built.

use std::sync::Arc;

use chrono::Utc;
use shared::{AdjustmentTrigger, CurrencyMode};

use crate::adapters::{CatalogSource, PersistentStore};
use crate::checkout::{self, CustomerInfo};
use crate::config::{self, Config};
use crate::error::CheckoutError;
use crate::stores::{CartStore, CatalogStore};

/// Top-level client state: one catalog cache, one cart.
pub struct Storefront {
    pub catalog: CatalogStore,
    pub cart: CartStore,
    store: Option<Arc<dyn PersistentStore>>,
}

impl Storefront {
    /// `store: None` runs the whole layer without persistence (catalog
    /// fetches directly, cart is volatile).
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Option<Arc<dyn PersistentStore>>,
        config: Config,
    ) -> Self {
        Self {
            catalog: CatalogStore::new(source, store.clone(), config.clone()),
            cart: CartStore::new(store.clone(), &config),
            store,
        }
    }

    /// Startup: restore both stores, run the refresh decision, reconcile
    /// the cart against whatever catalog came up.
    pub async fn init(&self) {
        self.cart.restore().await;
        let changed = self.catalog.restore().await;
        if changed {
            self.reconcile_cart(AdjustmentTrigger::Refresh).await;
        }
    }

    /// Run the staleness-aware refresh decision; reconcile on change.
    pub async fn refresh(&self, force: bool) {
        if self.catalog.load_all(force).await {
            self.reconcile_cart(AdjustmentTrigger::Refresh).await;
        }
    }

    /// Force a visible refetch; reconcile on change.
    pub async fn reload(&self) {
        if self.catalog.reload().await {
            self.reconcile_cart(AdjustmentTrigger::Refresh).await;
        }
    }

    async fn reconcile_cart(&self, trigger: AdjustmentTrigger) {
        if self.cart.is_empty().await {
            return;
        }
        let products = self.catalog.products().await;
        if let Some(report) = self.cart.reconcile_with_products(&products, trigger).await {
            tracing::info!(
                removed = report.removed.len(),
                reduced = report.reduced.len(),
                "Cart adjusted after catalog change"
            );
            self.cart.publish(report).await;
        }
    }

    /// Add a catalog product to the cart by id. Returns false when the
    /// product is unknown.
    pub async fn add_to_cart(&self, product_id: i64, qty: u32) -> bool {
        match self.catalog.find(product_id).await {
            Some(product) => {
                self.cart.add(&product, qty, None, false).await;
                true
            }
            None => false,
        }
    }

    /// Set a cart line's quantity, clamped to the product's current
    /// purchasable maximum when the product is known.
    pub async fn update_cart_qty(&self, product_id: i64, qty: u32) {
        let max = self
            .catalog
            .find(product_id)
            .await
            .map(|p| p.max_purchasable());
        self.cart.update(product_id, qty, max).await;
    }

    /// Checkout gate: reconcile against the current catalog first. Any
    /// adjustment blocks submission; the report is published for the UI
    /// and the order message is not built.
    pub async fn submit_order(&self, info: &CustomerInfo) -> Result<String, CheckoutError> {
        if self.cart.is_empty().await {
            return Err(CheckoutError::EmptyCart);
        }

        let products = self.catalog.products().await;
        if let Some(report) = self
            .cart
            .reconcile_with_products(&products, AdjustmentTrigger::Checkout)
            .await
        {
            tracing::info!(
                removed = report.removed.len(),
                reduced = report.reduced.len(),
                "Checkout blocked by cart adjustments"
            );
            self.cart.publish(report).await;
            return Err(CheckoutError::AdjustmentsPending);
        }

        let items = self.cart.items().await;
        let rate = self.catalog.exchange_rate().await;
        let mode = self.catalog.currency_mode().await;
        Ok(checkout::build_order_message(
            &items,
            &products,
            rate,
            mode,
            info,
            Utc::now(),
        ))
    }

    pub async fn set_currency_mode(&self, mode: CurrencyMode) {
        self.catalog.set_currency_mode(mode).await;
    }

    /// Remember the checkout form data between visits. Best-effort.
    pub async fn save_customer_info(&self, info: &CustomerInfo) {
        let Some(store) = &self.store else {
            return;
        };
        match serde_json::to_value(info) {
            Ok(value) => {
                if let Err(e) = store.set_value(config::KV_CUSTOMER_INFO, value).await {
                    tracing::warn!(error = %e, "Failed to persist customer info");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize customer info"),
        }
    }

    /// Previously saved checkout form data, if any.
    pub async fn load_customer_info(&self) -> Option<CustomerInfo> {
        let store = self.store.as_ref()?;
        match store.get_value(config::KV_CUSTOMER_INFO).await {
            Ok(Some(raw)) => serde_json::from_value(raw).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load customer info");
                None
            }
        }
    }
}
