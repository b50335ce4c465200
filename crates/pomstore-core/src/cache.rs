//! Effective-model resolution cache.
//!
//! Shared between the ingestion step (which evicts) and the effective filter
//! (which fills). The mutex guards only this cache's key-space, so unrelated
//! artifacts are never serialized on it.

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::models::ProjectModel;

pub const DEFAULT_MAX_ENTRIES: usize = 512;

pub struct ResolutionCache {
    max_entries: usize,
    entries: Mutex<IndexMap<String, ProjectModel>>,
}

impl ResolutionCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Return a clone of the cached model and mark it most recently used.
    pub fn get(&self, key: &str) -> Option<ProjectModel> {
        let mut entries = self.entries.lock();
        let model = entries.shift_remove(key)?;
        entries.insert(key.to_string(), model.clone());
        Some(model)
    }

    pub fn put(&self, key: String, model: ProjectModel) {
        let mut entries = self.entries.lock();
        entries.shift_remove(&key);
        entries.insert(key, model);
        while entries.len() > self.max_entries {
            entries.shift_remove_index(0);
        }
    }

    pub fn remove(&self, key: &str) -> Option<ProjectModel> {
        self.entries.lock().shift_remove(key)
    }

    /// Check-and-remove under a single lock acquisition. Returns whether an
    /// entry was present.
    pub fn evict(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(key) {
            entries.shift_remove(key);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
