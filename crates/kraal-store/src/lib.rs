//! Durable key-value persistence boundary plus filesystem and in-memory backends.

mod fs_store;
mod mem_store;

pub use fs_store::FsStore;
pub use mem_store::MemStore;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::{io, path::PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

/// Trait implemented by all keyed document stores.
///
/// Collections are small and rewritten whole, so the surface is a flat
/// get/put of opaque byte payloads with typed JSON helpers layered on top.
/// A missing key reads as `Ok(None)`, never an error.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
    async fn put_raw(&self, key: &str, bytes: &[u8]) -> StoreResult<()>;

    async fn get_doc<T: DeserializeOwned + Send>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_doc<T: Serialize + Sync>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.put_raw(key, &bytes).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn io_error(path: impl Into<PathBuf>, err: io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source: err,
    }
}
