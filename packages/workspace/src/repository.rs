//! On-disk storage for the `draft` / `published` slots
//!
//! ```text
//! <data_dir>/documents/draft.json
//! <data_dir>/documents/published.json
//! ```
//!
//! Writes go to a temp file first and are renamed into place.

use folio_editor::DocumentKey;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored document '{key}' is corrupt: {source}")]
    Corrupt {
        key: DocumentKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("No draft to publish")]
    NoDraft,

    #[error("Invalid media name: {0}")]
    InvalidMediaName(String),
}

pub struct DocumentRepository {
    dir: PathBuf,
    /// Serialises writes so a publish never interleaves with a draft save
    write_lock: Mutex<()>,
}

impl DocumentRepository {
    /// Open (creating if needed) `<data_dir>/documents`
    pub async fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let dir = data_dir.join("documents");
        tokio::fs::create_dir_all(&dir).await?;

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path(&self, key: DocumentKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    /// Stored payload, or `None` if the slot was never written
    pub async fn get(&self, key: DocumentKey) -> Result<Option<Value>, StorageError> {
        let bytes = match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Corrupt { key, source })
    }

    pub async fn put(&self, key: DocumentKey, document: &Value) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.write(key, document).await
    }

    /// Copy `draft` verbatim into `published`
    pub async fn publish(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let draft = self.get(DocumentKey::Draft).await?.ok_or(StorageError::NoDraft)?;
        self.write(DocumentKey::Published, &draft).await
    }

    async fn write(&self, key: DocumentKey, document: &Value) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(document).map_err(StorageError::Encode)?;

        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(key = %key, bytes = bytes.len(), "Document written");
        Ok(())
    }
}
