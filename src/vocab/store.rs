//! Persistent word store
//!
//! Layout under the data directory:
//! ```text
//! <data_dir>/words/
//! └── {word-id}.json   # One file per captured word
//! ```
//!
//! Secondary lookups (by original text, by creation time, by next review
//! time) go through an in-memory index that `open()` rebuilds from the
//! item files and every write maintains incrementally.
//!
//! Compound read-modify-write operations (`increase_encounter_count`,
//! `apply_review`, `update`) are serialized per word id through a lock
//! table, so concurrent callers targeting the same word queue up FIFO
//! while operations on different words proceed in parallel.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::memory::{transition, ReviewOutcome};
use super::models::{WordContext, WordItem, WordPatch};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Word not found: {0}")]
    NotFound(Uuid),

    #[error("Word already exists: {0}")]
    Conflict(Uuid),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Index record kept in memory for every stored word
#[derive(Debug, Clone)]
struct IndexEntry {
    original_text: String,
    created_at: DateTime<Utc>,
    next_review_at: DateTime<Utc>,
}

impl IndexEntry {
    fn of(item: &WordItem) -> Self {
        Self {
            original_text: item.original_text.clone(),
            created_at: item.created_at,
            next_review_at: item.next_review_at,
        }
    }
}

/// Storage manager for captured words
pub struct WordStore {
    words_dir: PathBuf,
    index: RwLock<HashMap<Uuid, IndexEntry>>,
    /// Per-id mutation locks; entries are created on first use
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl WordStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            words_dir: data_dir.join("words"),
            index: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("wordbook"))
            .ok_or(StoreError::DataDirNotFound)
    }

    fn word_path(&self, id: Uuid) -> PathBuf {
        self.words_dir.join(format!("{}.json", id))
    }

    /// Grab the mutation lock for one word id
    fn id_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(id).or_default().clone()
    }

    /// Drop the lock entry for a deleted word, unless another caller
    /// still holds a clone of it
    fn prune_lock(&self, id: Uuid) {
        let mut locks = self.locks.lock().unwrap();
        if locks.get(&id).map_or(false, |l| Arc::strong_count(l) == 1) {
            locks.remove(&id);
        }
    }

    /// Initialize the store: create directories and rebuild the index.
    /// Idempotent, safe to call repeatedly.
    pub fn open(&self) -> Result<()> {
        fs::create_dir_all(&self.words_dir)?;

        let mut index = HashMap::new();
        for entry in fs::read_dir(&self.words_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.extension().map_or(false, |ext| ext == "json") {
                continue;
            }
            match fs::read_to_string(&path).map_err(StoreError::Io).and_then(|content| {
                serde_json::from_str::<WordItem>(&content).map_err(StoreError::Json)
            }) {
                Ok(item) => {
                    index.insert(item.id, IndexEntry::of(&item));
                }
                Err(e) => {
                    log::warn!("Skipping unreadable word file {}: {}", path.display(), e);
                }
            }
        }

        let count = index.len();
        *self.index.write().unwrap() = index;
        log::info!("Word store opened with {} words", count);
        Ok(())
    }

    fn read_item(&self, id: Uuid) -> Result<WordItem> {
        let path = self.word_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id));
        }
        let content = fs::read_to_string(&path)?;
        let item: WordItem = serde_json::from_str(&content)?;
        Ok(item)
    }

    fn write_item(&self, item: &WordItem) -> Result<()> {
        let path = self.word_path(item.id);
        // Write to a sibling temp file and rename over the target, so a
        // reader racing this write never sees a truncated file. The temp
        // name has no `.json` extension, so `open()` ignores leftovers.
        let tmp = self.words_dir.join(format!("{}.json.tmp", item.id));
        fs::write(&tmp, serde_json::to_string_pretty(item)?)?;
        fs::rename(&tmp, &path)?;
        self.index.write().unwrap().insert(item.id, IndexEntry::of(item));
        Ok(())
    }

    /// Insert a brand-new word; fails if the id is already present
    pub fn add(&self, item: &WordItem) -> Result<()> {
        let lock = self.id_lock(item.id);
        let _guard = lock.lock().unwrap();

        if self.index.read().unwrap().contains_key(&item.id) || self.word_path(item.id).exists() {
            return Err(StoreError::Conflict(item.id));
        }
        self.write_item(item)
    }

    /// Point lookup by id
    pub fn get_by_id(&self, id: Uuid) -> Result<Option<WordItem>> {
        match self.read_item(id) {
            Ok(item) => Ok(Some(item)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Exact, case-sensitive lookup by original text. On duplicates the
    /// earliest-captured word wins.
    pub fn get_by_original_text(&self, text: &str) -> Result<Option<WordItem>> {
        let id = {
            let index = self.index.read().unwrap();
            index
                .iter()
                .filter(|(_, entry)| entry.original_text == text)
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(id, _)| *id)
        };

        match id {
            Some(id) => self.get_by_id(id),
            None => Ok(None),
        }
    }

    /// All words, newest captures first
    pub fn get_all(&self) -> Result<Vec<WordItem>> {
        let ids: Vec<Uuid> = self.index.read().unwrap().keys().copied().collect();

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            // A word removed between the index snapshot and the read is
            // silently excluded.
            if let Some(item) = self.get_by_id(id)? {
                items.push(item);
            }
        }

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// Words whose next review time has passed, soonest-due first
    pub fn get_due(&self, now: DateTime<Utc>) -> Result<Vec<WordItem>> {
        let ids: Vec<Uuid> = {
            let index = self.index.read().unwrap();
            index
                .iter()
                .filter(|(_, entry)| entry.next_review_at <= now)
                .map(|(id, _)| *id)
                .collect()
        };

        let mut due = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(item) = self.get_by_id(id)? {
                // The file may have been reviewed since the index snapshot
                if item.is_due(now) {
                    due.push(item);
                }
            }
        }

        due.sort_by(|a, b| a.next_review_at.cmp(&b.next_review_at));
        Ok(due)
    }

    /// Merge a partial update over a stored word
    pub fn update(&self, id: Uuid, patch: WordPatch) -> Result<WordItem> {
        let lock = self.id_lock(id);
        let _guard = lock.lock().unwrap();

        let mut item = self.read_item(id)?;
        patch.apply(&mut item);
        self.write_item(&item)?;
        Ok(item)
    }

    /// Delete one word. An absent id is a no-op.
    pub fn remove(&self, id: Uuid) -> Result<()> {
        let lock = self.id_lock(id);
        {
            let _guard = lock.lock().unwrap();

            let path = self.word_path(id);
            if path.exists() {
                fs::remove_file(&path)?;
            } else {
                log::debug!("remove: word {} not present", id);
            }
            self.index.write().unwrap().remove(&id);
        }
        drop(lock);
        self.prune_lock(id);
        Ok(())
    }

    /// Delete every word and reset the index
    pub fn clear_all(&self) -> Result<()> {
        let mut index = self.index.write().unwrap();

        for entry in fs::read_dir(&self.words_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                fs::remove_file(&path)?;
            }
        }

        let removed = index.len();
        index.clear();
        drop(index);

        // The deleted words' lock entries are no longer needed; keep
        // only the ones some caller still holds
        self.locks
            .lock()
            .unwrap()
            .retain(|_, l| Arc::strong_count(l) > 1);

        log::info!("Cleared {} words", removed);
        Ok(())
    }

    /// Record another encounter: bump the count, refresh the encounter
    /// time, and append the context unless an identical sentence is
    /// already stored. Atomic per id.
    pub fn increase_encounter_count(
        &self,
        id: Uuid,
        context_content: &str,
        source: &str,
    ) -> Result<WordItem> {
        let lock = self.id_lock(id);
        let _guard = lock.lock().unwrap();

        let now = Utc::now();
        let mut item = self.read_item(id)?;
        item.count += 1;
        item.last_encountered_at = now;

        if !item.contexts.iter().any(|c| c.content == context_content) {
            item.contexts.push(WordContext::new(
                source.to_string(),
                context_content.to_string(),
                now,
            ));
        }

        self.write_item(&item)?;
        Ok(item)
    }

    /// Apply a review outcome: advance or regress the memory state,
    /// reschedule, and append one history entry. Atomic per id.
    pub fn apply_review(&self, id: Uuid, outcome: ReviewOutcome) -> Result<WordItem> {
        let lock = self.id_lock(id);
        let _guard = lock.lock().unwrap();

        let now = Utc::now();
        let mut item = self.read_item(id)?;

        let from_state = item.state;
        let (next_state, next_interval) = transition(from_state, outcome);

        item.state = next_state;
        item.interval_ms = next_interval.num_milliseconds();
        item.next_review_at = now + next_interval;
        item.history.push(super::models::ReviewLogEntry {
            timestamp: now,
            result: outcome,
            from_state,
            to_state: next_state,
        });

        self.write_item(&item)?;
        Ok(item)
    }
}
