//! Catalog cache store
//!
//! Single authoritative in-memory view of the product catalog and exchange
//! rate, backed by the persistent store and refreshed stale-while-revalidate:
//! consumers keep reading the current snapshot while a background fetch
//! replaces it. A visible fetch (empty cache) surfaces errors through the
//! `error` field; a background fetch swallows them and the prior data stands.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use shared::{CurrencyMode, Product};
use tokio::sync::RwLock;

use super::views::{self, FilterState};
use crate::adapters::{CatalogSource, PersistentStore};
use crate::config::{self, Config};

/// Persisted exchange-rate record
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RateRecord {
    rate: f64,
    #[serde(rename = "updatedAt")]
    updated_at: i64,
}

/// Legacy single-blob cache format, migrated one-shot at startup
#[derive(Debug, Clone, Deserialize)]
struct LegacyCache {
    #[serde(rename = "updatedAt")]
    updated_at: Option<i64>,
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Default)]
struct CatalogState {
    products: Arc<Vec<Product>>,
    last_updated: Option<DateTime<Utc>>,
    /// 0 means "unknown"
    exchange_rate: f64,
    rate_updated: Option<DateTime<Utc>>,
    loading: bool,
    error: Option<String>,
    currency_mode: CurrencyMode,
    filters: FilterState,
    /// Bumped on every product-list replacement; keys the view caches
    products_generation: u64,
    /// Bumped on every effective filter mutation
    filter_revision: u64,
    /// Single-fetch-in-flight guards per fetch category
    products_fetch_in_flight: bool,
    rate_fetch_in_flight: bool,
    // Memoized derived views
    filtered_cache: Option<((u64, u64), Arc<Vec<Product>>)>,
    discounted_cache: Option<(u64, Arc<Vec<Product>>)>,
    preorder_cache: Option<(u64, Arc<Vec<Product>>)>,
    value_tier_cache: Option<(u64, Arc<Vec<Product>>)>,
}

impl CatalogState {
    fn replace_products(&mut self, products: Vec<Product>, now: DateTime<Utc>) {
        self.products = Arc::new(products);
        self.last_updated = Some(now);
        self.products_generation += 1;
    }

    fn set_rate(&mut self, rate: f64, now: DateTime<Utc>) {
        self.exchange_rate = rate;
        self.rate_updated = Some(now);
    }
}

/// Catalog cache store
pub struct CatalogStore {
    source: Arc<dyn CatalogSource>,
    store: Option<Arc<dyn PersistentStore>>,
    config: Config,
    state: RwLock<CatalogState>,
}

impl CatalogStore {
    /// `store: None` models a context without persistence (e.g. server-side
    /// rendering): restore is skipped and the catalog fetches directly.
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Option<Arc<dyn PersistentStore>>,
        config: Config,
    ) -> Self {
        Self {
            source,
            store,
            config,
            state: RwLock::new(CatalogState::default()),
        }
    }

    // ============ Read accessors ============

    /// Current product snapshot, in source fetch order.
    pub async fn products(&self) -> Arc<Vec<Product>> {
        self.state.read().await.products.clone()
    }

    pub async fn find(&self, product_id: i64) -> Option<Product> {
        self.state
            .read()
            .await
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
    }

    pub async fn loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Exchange rate; 0 means unknown.
    pub async fn exchange_rate(&self) -> f64 {
        self.state.read().await.exchange_rate
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_updated
    }

    pub async fn rate_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.rate_updated
    }

    pub async fn currency_mode(&self) -> CurrencyMode {
        self.state.read().await.currency_mode
    }

    pub async fn set_currency_mode(&self, mode: CurrencyMode) {
        self.state.write().await.currency_mode = mode;
    }

    // ============ Filters and derived views ============

    pub async fn filters(&self) -> FilterState {
        self.state.read().await.filters.clone()
    }

    /// Mutate the filter state; the filter revision is bumped only when
    /// the mutation actually changed something.
    pub async fn with_filters(&self, mutate: impl FnOnce(&mut FilterState)) {
        let mut state = self.state.write().await;
        let before = state.filters.clone();
        mutate(&mut state.filters);
        if state.filters != before {
            state.filter_revision += 1;
        }
    }

    /// True only when no non-default filter or sort is active.
    pub async fn show_carousels(&self) -> bool {
        self.state.read().await.filters.is_default()
    }

    /// Filtered and sorted product view, memoized per
    /// (products generation, filter revision).
    pub async fn filtered(&self) -> Arc<Vec<Product>> {
        let mut state = self.state.write().await;
        let key = (state.products_generation, state.filter_revision);
        if let Some((cached_key, cached)) = &state.filtered_cache {
            if *cached_key == key {
                return cached.clone();
            }
        }
        let computed = Arc::new(views::filtered(&state.products, &state.filters));
        state.filtered_cache = Some((key, computed.clone()));
        computed
    }

    /// Discounted (non-preorder) products, memoized per products generation.
    pub async fn discounted(&self) -> Arc<Vec<Product>> {
        let mut state = self.state.write().await;
        let generation = state.products_generation;
        if let Some((cached_generation, cached)) = &state.discounted_cache {
            if *cached_generation == generation {
                return cached.clone();
            }
        }
        let computed = Arc::new(views::discounted(&state.products));
        state.discounted_cache = Some((generation, computed.clone()));
        computed
    }

    /// Preorder products, memoized per products generation.
    pub async fn preorder(&self) -> Arc<Vec<Product>> {
        let mut state = self.state.write().await;
        let generation = state.products_generation;
        if let Some((cached_generation, cached)) = &state.preorder_cache {
            if *cached_generation == generation {
                return cached.clone();
            }
        }
        let computed = Arc::new(views::preorder(&state.products));
        state.preorder_cache = Some((generation, computed.clone()));
        computed
    }

    /// Value-tier carousel products, memoized per products generation.
    pub async fn value_tier(&self) -> Arc<Vec<Product>> {
        let mut state = self.state.write().await;
        let generation = state.products_generation;
        if let Some((cached_generation, cached)) = &state.value_tier_cache {
            if *cached_generation == generation {
                return cached.clone();
            }
        }
        let computed = Arc::new(views::value_tier(&state.products));
        state.value_tier_cache = Some((generation, computed.clone()));
        computed
    }

    // ============ Load sequence ============

    /// Startup restore: populate from the persistent store when possible
    /// (with one-shot legacy migration), then run the refresh decision.
    ///
    /// Returns whether the in-memory product list changed.
    pub async fn restore(&self) -> bool {
        let Some(store) = self.store.clone() else {
            return self.fetch_visible().await;
        };

        let (products_res, last_updated_res, rate_res) = tokio::join!(
            store.get_all_products(),
            store.get_value(config::KV_LAST_UPDATED),
            store.get_value(config::KV_EXCHANGE_RATE),
        );

        let mut restored = false;
        match products_res {
            Ok(items) if !items.is_empty() => {
                let count = items.len();
                let last_updated = last_updated_res
                    .ok()
                    .flatten()
                    .and_then(|v| v.as_i64())
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
                let rate_record = rate_res
                    .ok()
                    .flatten()
                    .and_then(|v| serde_json::from_value::<RateRecord>(v).ok());

                let mut state = self.state.write().await;
                state.replace_products(items, Utc::now());
                state.last_updated = last_updated;
                if let Some(record) = rate_record {
                    state.exchange_rate = record.rate.max(0.0);
                    state.rate_updated = Utc.timestamp_millis_opt(record.updated_at).single();
                }
                drop(state);
                restored = true;
                tracing::info!(count, "Restored products from storage");
            }
            Ok(_) => {
                restored = self.migrate_legacy_cache(&store).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Product restore from storage failed");
            }
        }

        // Always run the refresh decision after restore
        let refreshed = self.load_all(false).await;
        restored || refreshed
    }

    /// One-shot migration from the legacy single-blob cache key.
    async fn migrate_legacy_cache(&self, store: &Arc<dyn PersistentStore>) -> bool {
        let raw = match store.get_value(config::KV_LEGACY_CACHE).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "Legacy cache read failed");
                return false;
            }
        };

        let legacy: LegacyCache = match serde_json::from_value(raw) {
            Ok(legacy) => legacy,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse legacy cache");
                return false;
            }
        };
        if legacy.products.is_empty() {
            return false;
        }

        let count = legacy.products.len();
        let updated_at = legacy
            .updated_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);

        {
            let mut state = self.state.write().await;
            state.replace_products(legacy.products.clone(), updated_at);
        }

        // Persist migrated data forward into the record store
        if let Err(e) = store.put_products(&legacy.products).await {
            tracing::warn!(error = %e, "Failed to persist migrated products");
        }
        if let Err(e) = store
            .set_value(
                config::KV_LAST_UPDATED,
                serde_json::json!(updated_at.timestamp_millis()),
            )
            .await
        {
            tracing::warn!(error = %e, "Failed to persist migrated timestamp");
        }

        tracing::info!(count, "Migrated legacy product cache into record store");
        true
    }

    // ============ Refresh decision ============

    /// Stale-while-revalidate refresh decision.
    ///
    /// Empty cache → visible fetch. Forced or stale cache → background
    /// fetch, current data keeps serving. Otherwise only the exchange rate
    /// is checked for staleness.
    ///
    /// Returns whether the product list changed.
    pub async fn load_all(&self, force: bool) -> bool {
        let (is_empty, age_ms) = {
            let state = self.state.read().await;
            let age_ms = state
                .last_updated
                .map(|t| (Utc::now() - t).num_milliseconds());
            (state.products.is_empty(), age_ms)
        };

        if is_empty {
            return self.fetch_visible().await;
        }

        let stale = age_ms.map_or(true, |ms| ms as i128 > self.config.catalog_ttl.as_millis() as i128);
        if force || stale {
            tracing::debug!(force, stale, "Catalog stale; refreshing in background");
            return self.fetch_background().await;
        }

        self.maybe_refresh_rate(false).await;
        false
    }

    /// Force a visible refetch, discarding the staleness decision.
    pub async fn reload(&self) -> bool {
        self.fetch_visible().await
    }

    // ============ Fetch paths ============

    /// Visible fetch: sets the loading flag and surfaces errors.
    async fn fetch_visible(&self) -> bool {
        {
            let mut state = self.state.write().await;
            if state.products_fetch_in_flight {
                tracing::debug!("Product fetch already in flight; skipping");
                return false;
            }
            state.products_fetch_in_flight = true;
            state.loading = true;
            state.error = None;
        }

        let (products_res, rate_res) = tokio::join!(
            self.source.fetch_products(),
            self.source.fetch_exchange_rate(),
        );
        let now = Utc::now();
        let rate = validate_rate(rate_res);

        match products_res {
            Ok(items) => {
                let count = items.len();
                {
                    let mut state = self.state.write().await;
                    state.products_fetch_in_flight = false;
                    state.loading = false;
                    state.replace_products(items, now);
                    if let Some(rate) = rate {
                        state.set_rate(rate, now);
                    }
                }
                self.persist_catalog().await;
                tracing::info!(count, "Catalog fetch (visible) complete");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Catalog fetch (visible) failed");
                let mut state = self.state.write().await;
                state.products_fetch_in_flight = false;
                state.loading = false;
                state.error = Some(e.to_string());
                false
            }
        }
    }

    /// Background fetch: loading flag untouched, failures swallowed.
    async fn fetch_background(&self) -> bool {
        {
            let mut state = self.state.write().await;
            if state.products_fetch_in_flight {
                tracing::debug!("Product fetch already in flight; skipping");
                return false;
            }
            state.products_fetch_in_flight = true;
        }

        let (products_res, rate_res) = tokio::join!(
            self.source.fetch_products(),
            self.source.fetch_exchange_rate(),
        );
        let now = Utc::now();
        let rate = validate_rate(rate_res);

        match products_res {
            Ok(items) => {
                let count = items.len();
                {
                    let mut state = self.state.write().await;
                    state.products_fetch_in_flight = false;
                    state.replace_products(items, now);
                    if let Some(rate) = rate {
                        state.set_rate(rate, now);
                    }
                }
                self.persist_catalog().await;
                tracing::info!(count, "Catalog background refresh complete");
                true
            }
            Err(e) => {
                // Prior data stands; staleness tolerance covers this window
                tracing::warn!(error = %e, "Catalog background refresh failed");
                self.state.write().await.products_fetch_in_flight = false;
                false
            }
        }
    }

    /// Refresh the exchange rate alone when stale or unknown.
    pub async fn maybe_refresh_rate(&self, force: bool) {
        {
            let state = self.state.read().await;
            let age_ms = state
                .rate_updated
                .map(|t| (Utc::now() - t).num_milliseconds());
            let stale =
                age_ms.map_or(true, |ms| ms as i128 > self.config.rate_ttl.as_millis() as i128);
            if !(force || stale || state.exchange_rate == 0.0) {
                return;
            }
        }
        {
            let mut state = self.state.write().await;
            if state.rate_fetch_in_flight {
                return;
            }
            state.rate_fetch_in_flight = true;
        }

        let rate_res = self.source.fetch_exchange_rate().await;
        let now = Utc::now();
        let rate = validate_rate(rate_res);

        {
            let mut state = self.state.write().await;
            state.rate_fetch_in_flight = false;
            if let Some(rate) = rate {
                state.set_rate(rate, now);
            }
        }

        if let Some(rate) = rate {
            tracing::info!(rate, "Exchange rate updated");
            self.persist_rate(rate, now).await;
        }
    }

    // ============ Persistence (best-effort) ============

    async fn persist_catalog(&self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let (products, last_updated, rate, rate_updated) = {
            let state = self.state.read().await;
            (
                state.products.clone(),
                state.last_updated,
                state.exchange_rate,
                state.rate_updated,
            )
        };

        if let Err(e) = store.put_products(&products).await {
            tracing::warn!(error = %e, "Failed to persist products");
        }
        if let Some(last_updated) = last_updated {
            if let Err(e) = store
                .set_value(
                    config::KV_LAST_UPDATED,
                    serde_json::json!(last_updated.timestamp_millis()),
                )
                .await
            {
                tracing::warn!(error = %e, "Failed to persist catalog timestamp");
            }
        }
        let record = RateRecord {
            rate,
            updated_at: rate_updated.map_or(0, |t| t.timestamp_millis()),
        };
        match serde_json::to_value(record) {
            Ok(value) => {
                if let Err(e) = store.set_value(config::KV_EXCHANGE_RATE, value).await {
                    tracing::warn!(error = %e, "Failed to persist exchange rate");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize exchange rate"),
        }
    }

    async fn persist_rate(&self, rate: f64, updated_at: DateTime<Utc>) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let record = RateRecord {
            rate,
            updated_at: updated_at.timestamp_millis(),
        };
        match serde_json::to_value(record) {
            Ok(value) => {
                if let Err(e) = store.set_value(config::KV_EXCHANGE_RATE, value).await {
                    tracing::warn!(error = %e, "Failed to persist exchange rate");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize exchange rate"),
        }
    }
}

/// Reduce a rate fetch result to a usable value. Errors, non-finite and
/// non-positive rates all mean "unknown": the previous known-good value
/// must be kept.
fn validate_rate(result: Result<f64, crate::error::SourceError>) -> Option<f64> {
    match result {
        Ok(rate) if rate.is_finite() && rate > 0.0 => Some(rate),
        Ok(rate) => {
            tracing::warn!(rate, "Exchange rate invalid or zero; keeping previous");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Exchange rate fetch failed; keeping previous");
            None
        }
    }
}
