//! Learning store persisted as a bounded JSON array on disk.
//!
//! Writes go to a sibling temporary file which then replaces the store, so a
//! crash mid-write leaves the previous contents intact. A missing or corrupt
//! file reads as empty.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::PersistenceError;
use crate::domain::models::LearningStoreEntry;
use crate::domain::ports::LearningStore;

pub struct JsonFileLearningStore {
    path: PathBuf,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl JsonFileLearningStore {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read the store, surfacing I/O and parse errors. A missing file is
    /// an empty store.
    pub async fn try_load(&self) -> Result<Vec<LearningStoreEntry>, PersistenceError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<LearningStoreEntry> = serde_json::from_str(&contents)?;
        self.trim(&mut entries);
        Ok(entries)
    }

    /// Replace the store contents atomically.
    pub async fn try_save(&self, entries: &[LearningStoreEntry]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn trim(&self, entries: &mut Vec<LearningStoreEntry>) {
        let overflow = entries.len().saturating_sub(self.capacity);
        entries.drain(..overflow);
    }

    async fn load_or_empty(&self) -> Vec<LearningStoreEntry> {
        match self.try_load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "learning store unreadable, treating as empty");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl LearningStore for JsonFileLearningStore {
    async fn append(&self, entry: LearningStoreEntry) {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_or_empty().await;
        entries.push(entry);
        self.trim(&mut entries);
        match self.try_save(&entries).await {
            Ok(()) => debug!(entries = entries.len(), "learning store updated"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to persist learning entry"),
        }
    }

    async fn load_all(&self) -> Vec<LearningStoreEntry> {
        self.load_or_empty().await
    }
}
