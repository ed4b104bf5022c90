//! State-layer configuration
//!
//! All knobs can be overridden through environment variables:
//!
//! | Environment variable | Default | Description |
//! |----------------------|---------|-------------|
//! | CATALOG_TTL_SECS | 900 | Product cache staleness threshold |
//! | RATE_TTL_SECS | 900 | Exchange-rate staleness threshold |
//! | PERSIST_DEBOUNCE_MS | 300 | Write-behind coalescing window |

use std::time::Duration;

/// KV key for the products last-updated timestamp (epoch millis)
pub const KV_LAST_UPDATED: &str = "productos_lastUpdated";
/// KV key for the exchange-rate record `{rate, updatedAt}`
pub const KV_EXCHANGE_RATE: &str = "tasa_bcv";
/// KV key for the persisted cart snapshot
pub const KV_CART_ITEMS: &str = "cart_items_v1";
/// KV key for persisted customer info
pub const KV_CUSTOMER_INFO: &str = "customer_info_v1";
/// Legacy single-blob cache key, migrated one-shot at startup
pub const KV_LEGACY_CACHE: &str = "products_cache_v2";

/// State-layer configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Staleness threshold for the cached product list
    pub catalog_ttl: Duration,
    /// Staleness threshold for the cached exchange rate
    pub rate_ttl: Duration,
    /// Quiet window for the debounced cart write-behind
    pub persist_debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_ttl: Duration::from_secs(15 * 60),
            rate_ttl: Duration::from_secs(15 * 60),
            persist_debounce: Duration::from_millis(300),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            catalog_ttl: env_secs("CATALOG_TTL_SECS").unwrap_or(defaults.catalog_ttl),
            rate_ttl: env_secs("RATE_TTL_SECS").unwrap_or(defaults.rate_ttl),
            persist_debounce: env_millis("PERSIST_DEBOUNCE_MS").unwrap_or(defaults.persist_debounce),
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key).ok()?.parse().ok().map(Duration::from_secs)
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key).ok()?.parse().ok().map(Duration::from_millis)
}
