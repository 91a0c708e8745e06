//! Ports to external collaborators
//!
//! The core never talks to a translation provider, a notification surface,
//! or browser storage directly; the embedding shell supplies these traits.

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::vocab::{Definition, WordItem};

#[derive(Error, Debug)]
pub enum PortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),
}

pub type Result<T> = std::result::Result<T, PortError>;

/// Detailed translation of a captured text, produced upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub alternative_translations: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Translation backend. The core issues a single call and reports the
/// outcome as-is; retry and provider fallback live outside.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<TranslationResult>;
}

/// Aggregated due-review event emitted by the scheduler, at most once
/// per tick
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDueNotification {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Words currently due, including ones already notified
    pub total_due: usize,
    /// Words that became due since the last notification
    pub new_count: usize,
    pub due_items: Vec<WordItem>,
    pub new_items: Vec<WordItem>,
}

/// Delivery surface for due-review notifications. Fire-and-forget: the
/// scheduler's bookkeeping never depends on delivery succeeding.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: ReviewDueNotification) -> Result<()>;
}

/// Small opaque key/value persistence, used for the notified-id set
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get_blob(&self, key: &str) -> Result<Option<String>>;
    async fn set_blob(&self, key: &str, value: String) -> Result<()>;
    async fn remove_blob(&self, key: &str) -> Result<()>;
}

/// File-backed blob store: one file per key under `<data_dir>/state/`
pub struct FileBlobStore {
    state_dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        let state_dir = data_dir.join("state");
        fs::create_dir_all(&state_dir)?;
        Ok(Self { state_dir })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.state_dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get_blob(&self, key: &str) -> Result<Option<String>> {
        let path = self.blob_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    async fn set_blob(&self, key: &str, value: String) -> Result<()> {
        fs::write(self.blob_path(key), value)?;
        Ok(())
    }

    async fn remove_blob(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// The persisted set of word ids already surfaced as due, keyed under
/// [`NotifiedSet::BLOB_KEY`]. Purely notification-dedup bookkeeping.
pub struct NotifiedSet;

impl NotifiedSet {
    pub const BLOB_KEY: &'static str = "notified_review_word_ids";

    pub async fn load(blobs: &dyn BlobStore) -> Result<std::collections::HashSet<Uuid>> {
        match blobs.get_blob(Self::BLOB_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(std::collections::HashSet::new()),
        }
    }

    pub async fn save(blobs: &dyn BlobStore, ids: &std::collections::HashSet<Uuid>) -> Result<()> {
        let raw = serde_json::to_string(&ids.iter().collect::<Vec<_>>())?;
        blobs.set_blob(Self::BLOB_KEY, raw).await
    }

    pub async fn clear(blobs: &dyn BlobStore) -> Result<()> {
        blobs.remove_blob(Self::BLOB_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_blob_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let blobs = FileBlobStore::new(dir.path().to_path_buf()).unwrap();

        assert!(blobs.get_blob("missing").await.unwrap().is_none());

        blobs.set_blob("k", "v1".to_string()).await.unwrap();
        assert_eq!(blobs.get_blob("k").await.unwrap().as_deref(), Some("v1"));

        blobs.set_blob("k", "v2".to_string()).await.unwrap();
        assert_eq!(blobs.get_blob("k").await.unwrap().as_deref(), Some("v2"));

        blobs.remove_blob("k").await.unwrap();
        assert!(blobs.get_blob("k").await.unwrap().is_none());
        // Removing again is fine
        blobs.remove_blob("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_notified_set_roundtrip() {
        let dir = TempDir::new().unwrap();
        let blobs = FileBlobStore::new(dir.path().to_path_buf()).unwrap();

        assert!(NotifiedSet::load(&blobs).await.unwrap().is_empty());

        let mut ids = HashSet::new();
        ids.insert(Uuid::new_v4());
        ids.insert(Uuid::new_v4());
        NotifiedSet::save(&blobs, &ids).await.unwrap();
        assert_eq!(NotifiedSet::load(&blobs).await.unwrap(), ids);

        NotifiedSet::clear(&blobs).await.unwrap();
        assert!(NotifiedSet::load(&blobs).await.unwrap().is_empty());
    }
}
