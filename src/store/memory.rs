//! In-memory order store
//!
//! Mirrors the orders table semantics (primary key on `id`, rows kept in
//! id order) without a database. Used for development runs and tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{OrderReader, OrderWriter, StoredOrder};
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    rows: RwLock<BTreeMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `rows`. Later duplicates replace
    /// earlier ones.
    pub fn with_rows<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let rows = rows
            .into_iter()
            .map(|(id, data)| (id.into(), data.into()))
            .collect();
        Self {
            rows: RwLock::new(rows),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent insert fail with `StoreError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the stored payload for `id`.
    pub async fn row(&self, id: &str) -> Option<Vec<u8>> {
        self.rows.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl OrderReader for MemoryOrderStore {
    async fn scan_all(&self) -> Result<Vec<StoredOrder>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .map(|(id, data)| StoredOrder {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl OrderWriter for MemoryOrderStore {
    async fn insert(&self, id: &str, payload: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }

        let mut rows = self.rows.write().await;
        if rows.contains_key(id) {
            return Err(StoreError::Conflict(id.to_string()));
        }
        rows.insert(id.to_string(), payload.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_scan() {
        let store = MemoryOrderStore::new();
        store.insert("b", b"{}").await.unwrap();
        store.insert("a", b"[]").await.unwrap();

        let rows = store.scan_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a");
        assert_eq!(rows[0].data, b"[]");
        assert_eq!(store.row("b").await, Some(b"{}".to_vec()));
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let store = MemoryOrderStore::new();
        store.insert("a", b"first").await.unwrap();

        let result = store.insert("a", b"second").await;
        assert!(matches!(result, Err(StoreError::Conflict(id)) if id == "a"));
        assert_eq!(store.row("a").await, Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let store = MemoryOrderStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.insert("a", b"{}").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.is_empty().await);

        store.set_fail_writes(false);
        store.insert("a", b"{}").await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_with_rows() {
        let store = MemoryOrderStore::with_rows([("x", "1"), ("y", "2")]);
        assert_eq!(store.len().await, 2);
    }
}
