//! In-memory adapter implementations
//!
//! `StaticSource` and `MemoryStore` back tests, demos and contexts without
//! persistence (the server-side render path runs store-less).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use shared::Product;

use super::{CatalogSource, PersistentStore};
use crate::error::{PersistError, SourceError};

/// Catalog source serving a fixed, swappable product list.
#[derive(Default)]
pub struct StaticSource {
    products: Mutex<Vec<Product>>,
    rate: Mutex<f64>,
    fail_products: AtomicBool,
    fetch_count: AtomicU32,
}

impl StaticSource {
    pub fn new(products: Vec<Product>, rate: f64) -> Self {
        Self {
            products: Mutex::new(products),
            rate: Mutex::new(rate),
            fail_products: AtomicBool::new(false),
            fetch_count: AtomicU32::new(0),
        }
    }

    /// Replace the served product list (simulates upstream changes).
    pub fn set_products(&self, products: Vec<Product>) {
        if let Ok(mut guard) = self.products.lock() {
            *guard = products;
        }
    }

    /// Replace the served exchange rate.
    pub fn set_rate(&self, rate: f64) {
        if let Ok(mut guard) = self.rate.lock() {
            *guard = rate;
        }
    }

    /// Make subsequent product fetches fail.
    pub fn set_fail_products(&self, fail: bool) {
        self.fail_products.store(fail, Ordering::SeqCst);
    }

    /// How many product fetches were attempted.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_products.load(Ordering::SeqCst) {
            return Err(SourceError::Network("simulated outage".to_string()));
        }
        self.products
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| SourceError::Network("source poisoned".to_string()))
    }

    async fn fetch_exchange_rate(&self) -> Result<f64, SourceError> {
        self.rate
            .lock()
            .map(|guard| *guard)
            .map_err(|_| SourceError::Network("source poisoned".to_string()))
    }
}

/// Volatile `PersistentStore` backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    products: Mutex<Vec<Product>>,
    kv: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn put_products(&self, products: &[Product]) -> Result<(), PersistError> {
        let mut guard = self
            .products
            .lock()
            .map_err(|_| PersistError::Backend("store poisoned".to_string()))?;
        *guard = products.to_vec();
        Ok(())
    }

    async fn get_all_products(&self) -> Result<Vec<Product>, PersistError> {
        self.products
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| PersistError::Backend("store poisoned".to_string()))
    }

    async fn clear_products(&self) -> Result<(), PersistError> {
        let mut guard = self
            .products
            .lock()
            .map_err(|_| PersistError::Backend("store poisoned".to_string()))?;
        guard.clear();
        Ok(())
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<(), PersistError> {
        let mut guard = self
            .kv
            .lock()
            .map_err(|_| PersistError::Backend("store poisoned".to_string()))?;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<Value>, PersistError> {
        self.kv
            .lock()
            .map(|guard| guard.get(key).cloned())
            .map_err(|_| PersistError::Backend("store poisoned".to_string()))
    }
}
