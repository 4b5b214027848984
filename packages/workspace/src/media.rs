//! Uploaded media assets under `<data_dir>/media`

use crate::repository::StorageError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaEntry {
    pub name: String,
    pub size: u64,
    /// Public path the site can reference, e.g. `/media/logo.png`
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("media name pattern is valid")
    })
}

/// Flat file names only. Leading dots and path separators are rejected.
pub fn is_valid_media_name(name: &str) -> bool {
    name_pattern().is_match(name)
}

pub struct MediaLibrary {
    dir: PathBuf,
}

impl MediaLibrary {
    pub async fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let dir = data_dir.join("media");
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_media_name(name) {
            return Err(StorageError::InvalidMediaName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }

    /// All assets, sorted by name. Temp files from interrupted uploads are skipped.
    pub async fn list(&self) -> Result<Vec<MediaEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_valid_media_name(&name) || name.ends_with(".upload") {
                continue;
            }
            entries.push(to_entry(name, &metadata));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Store `bytes` under `name`, replacing any existing asset
    pub async fn put(&self, name: &str, bytes: &[u8]) -> Result<MediaEntry, StorageError> {
        let path = self.path(name)?;
        let tmp = self.dir.join(format!("{}.upload", name));

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        let metadata = tokio::fs::metadata(&path).await?;
        tracing::info!(name, size = metadata.len(), "Media stored");
        Ok(to_entry(name.to_string(), &metadata))
    }

    /// Returns `false` if there was nothing to delete
    pub async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let path = self.path(name)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(name, "Media deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn to_entry(name: String, metadata: &std::fs::Metadata) -> MediaEntry {
    MediaEntry {
        url: format!("/media/{}", name),
        size: metadata.len(),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        name,
    }
}
