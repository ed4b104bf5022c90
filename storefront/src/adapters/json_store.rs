//! JSON-file-backed persistent store
//!
//! Single JSON document holding the product records and the KV map,
//! loaded at startup and rewritten on every mutation. Suits desktop
//! clients where the cart and catalog snapshots are small.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::Product;
use tokio::sync::Mutex;

use super::PersistentStore;
use crate::error::PersistError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    products: Vec<Product>,
    kv: HashMap<String, Value>,
}

/// File-backed [`PersistentStore`].
pub struct JsonFileStore {
    file_path: PathBuf,
    data: Mutex<StoreFile>,
}

impl JsonFileStore {
    /// Load the store from `file_path`, starting empty if the file does
    /// not exist yet.
    pub async fn load(file_path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let file_path = file_path.as_ref().to_path_buf();

        let data = if file_path.exists() {
            let content = tokio::fs::read_to_string(&file_path).await?;
            serde_json::from_str(&content)?
        } else {
            StoreFile::default()
        };

        Ok(Self {
            file_path,
            data: Mutex::new(data),
        })
    }

    async fn save(&self, data: &StoreFile) -> Result<(), PersistError> {
        if let Some(parent) = self.file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(data)?;
        tokio::fs::write(&self.file_path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl PersistentStore for JsonFileStore {
    async fn put_products(&self, products: &[Product]) -> Result<(), PersistError> {
        let mut data = self.data.lock().await;
        data.products = products.to_vec();
        self.save(&data).await
    }

    async fn get_all_products(&self) -> Result<Vec<Product>, PersistError> {
        Ok(self.data.lock().await.products.clone())
    }

    async fn clear_products(&self) -> Result<(), PersistError> {
        let mut data = self.data.lock().await;
        data.products.clear();
        self.save(&data).await
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<(), PersistError> {
        let mut data = self.data.lock().await;
        data.kv.insert(key.to_string(), value);
        self.save(&data).await
    }

    async fn get_value(&self, key: &str) -> Result<Option<Value>, PersistError> {
        Ok(self.data.lock().await.kv.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = JsonFileStore::load(&path).await.unwrap();
            store
                .set_value("k", serde_json::json!({"rate": 36.5}))
                .await
                .unwrap();
        }

        let store = JsonFileStore::load(&path).await.unwrap();
        let value = store.get_value("k").await.unwrap().unwrap();
        assert_eq!(value["rate"], 36.5);
        assert!(store.get_value("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::load(dir.path().join("nope.json")).await.unwrap();
        assert!(store.get_all_products().await.unwrap().is_empty());
    }
}
