use crate::{KvStore, StoreResult, io_error};
use async_trait::async_trait;
use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};

/// Filesystem-backed store: each key lives at `<root>/<key>.json`.
///
/// Writes land in a sibling temp file and are renamed over the target, so a
/// reader never observes a half-written collection. Writes from separate
/// processes sharing the same root are not serialized.
#[derive(Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl fmt::Debug for FsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsStore").field("root", &self.root).finish()
    }
}

impl FsStore {
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error(&root, e))?;
        Ok(Self { root })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    async fn replace(path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await.map_err(|e| io_error(&tmp, e))?;
        file.write_all(bytes).await.map_err(|e| io_error(&tmp, e))?;
        file.sync_all().await.map_err(|e| io_error(&tmp, e))?;
        drop(file);
        fs::rename(&tmp, path).await.map_err(|e| io_error(path, e))
    }
}

#[async_trait]
impl KvStore for FsStore {
    async fn get_raw(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.key_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(path, err)),
        }
    }

    async fn put_raw(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        Self::replace(&self.key_path(key), bytes).await
    }
}
