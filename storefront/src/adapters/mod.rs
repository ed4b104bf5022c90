//! External collaborator contracts
//!
//! The catalog source (remote product API) and the persistent store
//! (key-value + record persistence) are adapters behind async traits; the
//! stores never talk to a backend directly.

use async_trait::async_trait;
use serde_json::Value;
use shared::Product;

use crate::error::{PersistError, SourceError};

mod json_store;
mod memory;

pub use json_store::JsonFileStore;
pub use memory::{MemoryStore, StaticSource};

/// Remote catalog source.
///
/// `fetch_products` returns rows already ordered by descending popularity
/// then descending release date; the cache preserves that order and never
/// re-sorts on fetch.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError>;

    /// Current exchange rate. `0` or an invalid value means "unknown";
    /// callers must not let it overwrite a known-good rate.
    async fn fetch_exchange_rate(&self) -> Result<f64, SourceError>;
}

/// Async key-value and product-record persistence.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn put_products(&self, products: &[Product]) -> Result<(), PersistError>;
    async fn get_all_products(&self) -> Result<Vec<Product>, PersistError>;
    async fn clear_products(&self) -> Result<(), PersistError>;

    async fn set_value(&self, key: &str, value: Value) -> Result<(), PersistError>;
    async fn get_value(&self, key: &str) -> Result<Option<Value>, PersistError>;
}
