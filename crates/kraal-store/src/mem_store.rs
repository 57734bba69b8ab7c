use crate::{KvStore, StoreResult};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// In-memory store: the non-persistent fallback and the default test double.
#[derive(Clone, Default)]
pub struct MemStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemStore")
            .field("entries", &self.entries.read().unwrap().len())
            .finish()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemStore {
    async fn get_raw(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.read().unwrap().get(key).cloned())
    }

    async fn put_raw(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }
}
