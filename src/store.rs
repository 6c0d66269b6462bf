use crate::error::{Error, Result};
use crate::types::{BillSnapshot, MeetingRecord, PostedRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A key→record JSON document loaded fully into memory and written back
/// fully on save.
///
/// All four tracking documents use this: no partial updates, no locking,
/// not safe for two concurrent runs against the same files.
#[derive(Debug)]
pub struct JsonStore<T> {
    path: PathBuf,
    entries: BTreeMap<String, T>,
}

impl<T: Serialize + DeserializeOwned> JsonStore<T> {
    /// Open a store, reading the whole document. A missing file is an
    /// empty store, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Overwrite the whole document on disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json).map_err(|e| {
            Error::Store(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Posted items keyed by dedup key
pub type PostedStore = JsonStore<PostedRecord>;
/// Latest-action snapshots keyed by bill id
pub type SnapshotStore = JsonStore<BillSnapshot>;
/// Generated summaries keyed by bill id (with a ":signed" variant)
pub type SummaryStore = JsonStore<String>;
/// Meeting tracking keyed by event id
pub type MeetingStore = JsonStore<MeetingRecord>;
