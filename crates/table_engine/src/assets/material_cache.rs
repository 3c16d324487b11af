//! Material cache keyed by bundle path
//!
//! Deduplicates material loads for the lifetime of the scene. Entries
//! are never evicted; the key space is the small catalog of top
//! finishes. A path that is already being fetched is recorded as
//! pending so a second request resolves against the same in-flight
//! load instead of issuing another fetch.

use std::collections::HashMap;

use super::RequestToken;
use crate::scene::graph::MaterialKey;

/// State of one cached material path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialSlot {
    /// Load issued under this token, not yet completed
    Pending(RequestToken),
    /// Material installed in the scene graph under this key
    Loaded(MaterialKey),
}

/// Path -> material handle cache
#[derive(Default)]
pub struct MaterialCache {
    entries: HashMap<String, MaterialSlot>,
}

impl MaterialCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the state of a path
    pub fn get(&self, path: &str) -> Option<MaterialSlot> {
        self.entries.get(path).copied()
    }

    /// Handle for a path whose load has completed
    pub fn loaded_key(&self, path: &str) -> Option<MaterialKey> {
        match self.entries.get(path) {
            Some(MaterialSlot::Loaded(key)) => Some(*key),
            _ => None,
        }
    }

    /// Record that a load has been issued for `path`
    pub fn mark_pending(&mut self, path: &str, token: RequestToken) {
        self.entries.insert(path.to_string(), MaterialSlot::Pending(token));
    }

    /// Record a completed load
    ///
    /// Completions populate the cache even when the requesting update
    /// has been superseded; the cache never holds stale data, only the
    /// scene's *application* of it can be stale.
    pub fn insert_loaded(&mut self, path: &str, key: MaterialKey) {
        self.entries.insert(path.to_string(), MaterialSlot::Loaded(key));
    }

    /// Drop a pending entry after a failed load so a retry can re-issue
    pub fn clear_pending(&mut self, path: &str) {
        if let Some(MaterialSlot::Pending(_)) = self.entries.get(path) {
            self.entries.remove(path);
        }
    }

    /// Whether this key is shared through the cache
    ///
    /// Cache-shared materials must not be disposed when swapped off the
    /// tabletop.
    pub fn owns_key(&self, key: MaterialKey) -> bool {
        self.entries
            .values()
            .any(|slot| matches!(slot, MaterialSlot::Loaded(k) if *k == key))
    }

    /// Number of cached entries (pending included)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
