//! In-memory template store

use crate::{Result, StoreError, TemplateRecord, TemplateStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Template store held entirely in memory
///
/// Clones share the same underlying collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    records: Arc<RwLock<HashMap<String, TemplateRecord>>>,
    assets: Arc<RwLock<HashMap<String, HashMap<String, Vec<u8>>>>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl TemplateStore for MemoryTemplateStore {
    async fn put(&self, record: TemplateRecord) -> Result<()> {
        if record.name.is_empty() {
            return Err(StoreError::InvalidKey(record.name));
        }
        self.records.write().await.insert(record.name.clone(), record);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<TemplateRecord>> {
        Ok(self.records.read().await.get(name).cloned())
    }

    async fn get_all(&self) -> Result<Vec<TemplateRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        self.assets.write().await.remove(name);
        Ok(self.records.write().await.remove(name).is_some())
    }

    async fn put_assets(&self, name: &str, assets: Vec<(String, Vec<u8>)>) -> Result<()> {
        self.assets
            .write()
            .await
            .insert(name.to_string(), assets.into_iter().collect());
        Ok(())
    }

    async fn get_asset(&self, name: &str, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .assets
            .read()
            .await
            .get(name)
            .and_then(|blobs| blobs.get(path))
            .cloned())
    }

    async fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.records.read().await.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animpack::Manifest;

    fn record(name: &str) -> TemplateRecord {
        TemplateRecord::new(Manifest::new(name, "1.0.0", "Ada"))
    }

    #[tokio::test]
    async fn test_put_is_upsert() {
        let store = MemoryTemplateStore::new();
        store.put(record("Fade")).await.unwrap();
        store
            .put(record("Fade").with_sources(Some("v2".to_string()), None, None))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        let fade = store.get("Fade").await.unwrap().unwrap();
        assert_eq!(fade.index_html.as_deref(), Some("v2"));
        assert!(store.get("Missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_assets_and_delete() {
        let store = MemoryTemplateStore::new();
        store.put(record("Spin")).await.unwrap();
        store
            .put_assets("Spin", vec![("a.png".to_string(), vec![1, 2])])
            .await
            .unwrap();

        assert_eq!(store.get_asset("Spin", "a.png").await.unwrap(), Some(vec![1, 2]));
        assert!(store.delete("Spin").await.unwrap());
        assert!(!store.contains("Spin").await.unwrap());
        assert_eq!(store.get_asset("Spin", "a.png").await.unwrap(), None);
        assert!(!store.delete("Spin").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let store = MemoryTemplateStore::new();
        let err = store.put(record("")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
