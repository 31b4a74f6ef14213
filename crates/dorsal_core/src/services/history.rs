//! Query history and favorites persistence.
//!
//! Two JSON files in the data directory: `query_history.json` and
//! `query_favorites.json`. History records at dispatch time, before the
//! outcome is known, so failed queries appear too. Persistence is
//! best-effort in the same way the config is; a corrupt file loads as an
//! empty list and self-heals on the next save.

use crate::error::DorsalError;
use crate::models::{FavoriteEntry, HistoryEntry};

use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Maximum entries kept in the query history.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Persistent store for query history and favorites.
pub struct HistoryStore {
    /// Data directory path
    data_dir: PathBuf,
}

impl HistoryStore {
    /// Open the store in the given data directory.
    pub fn open(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn history_path(&self) -> PathBuf {
        self.data_dir.join("query_history.json")
    }

    fn favorites_path(&self) -> PathBuf {
        self.data_dir.join("query_favorites.json")
    }

    // ========== History Operations ==========

    /// Record a dispatched query, newest first.
    ///
    /// An existing entry with the exact same SQL is removed before the new
    /// one is prepended, so reruns float to the top without duplicating.
    /// The list never exceeds [`MAX_HISTORY_ENTRIES`]. Returns the updated
    /// list.
    pub fn record_execution(
        &self,
        sql: impl Into<String>,
        database: Option<String>,
    ) -> Vec<HistoryEntry> {
        let entry = HistoryEntry::new(sql, database);
        tracing::debug!(
            query = entry.query_preview(80),
            database = entry.database.as_deref(),
            "Recording query"
        );
        let mut history = self.list_history();
        history.retain(|e| e.query != entry.query);
        history.insert(0, entry);
        history.truncate(MAX_HISTORY_ENTRIES);
        self.save_list(&self.history_path(), &history, "query history");
        history
    }

    /// Load the query history, newest first.
    pub fn list_history(&self) -> Vec<HistoryEntry> {
        self.load_list(&self.history_path(), "query history")
    }

    /// Remove one history entry by its position in the list.
    ///
    /// Returns the removed entry, or None when the index is out of range.
    pub fn delete_history_entry(&self, index: usize) -> Option<HistoryEntry> {
        let mut history = self.list_history();
        if index >= history.len() {
            return None;
        }
        let removed = history.remove(index);
        self.save_list(&self.history_path(), &history, "query history");
        Some(removed)
    }

    // ========== Favorite Operations ==========

    /// Save a named favorite query.
    ///
    /// Names are not required to be unique; saving under an existing name
    /// adds a second entry. Returns the created entry.
    pub fn add_favorite(
        &self,
        name: impl Into<String>,
        sql: impl Into<String>,
        database: Option<String>,
    ) -> FavoriteEntry {
        let entry = FavoriteEntry::new(name, sql, database);
        let mut favorites = self.list_favorites();
        favorites.push(entry.clone());
        self.save_list(&self.favorites_path(), &favorites, "query favorites");
        entry
    }

    /// Load the saved favorites, oldest first.
    pub fn list_favorites(&self) -> Vec<FavoriteEntry> {
        self.load_list(&self.favorites_path(), "query favorites")
    }

    // ========== Persistence ==========

    fn load_list<T: DeserializeOwned>(&self, path: &PathBuf, what: &str) -> Vec<T> {
        if !path.exists() {
            return Vec::new();
        }

        match std::fs::read_to_string(path)
            .map_err(DorsalError::from)
            .and_then(|raw| serde_json::from_str(&raw).map_err(DorsalError::from))
        {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "{what} unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    fn save_list<T: serde::Serialize>(&self, path: &PathBuf, entries: &[T], what: &str) {
        let result = serde_json::to_string_pretty(entries)
            .map_err(DorsalError::from)
            .and_then(|json| std::fs::write(path, json).map_err(DorsalError::from));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "Failed to save {what}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn records_newest_first() {
        let (_dir, store) = store();
        store.record_execution("SELECT 1", None);
        store.record_execution("SELECT 2", Some("demo".into()));

        let history = store.list_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "SELECT 2");
        assert_eq!(history[0].database.as_deref(), Some("demo"));
        assert_eq!(history[1].query, "SELECT 1");
    }

    #[test]
    fn rerun_dedups_and_promotes() {
        let (_dir, store) = store();
        store.record_execution("SELECT 1", None);
        store.record_execution("SELECT 2", None);
        store.record_execution("SELECT 1", None);

        let history = store.list_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "SELECT 1");
        assert_eq!(history[1].query, "SELECT 2");
    }

    #[test]
    fn history_is_capped() {
        let (_dir, store) = store();
        for i in 0..(MAX_HISTORY_ENTRIES + 5) {
            store.record_execution(format!("SELECT {i}"), None);
        }
        let history = store.list_history();
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history[0].query, format!("SELECT {}", MAX_HISTORY_ENTRIES + 4));
    }

    #[test]
    fn delete_by_index() {
        let (_dir, store) = store();
        store.record_execution("SELECT 1", None);
        store.record_execution("SELECT 2", None);

        let removed = store.delete_history_entry(1).unwrap();
        assert_eq!(removed.query, "SELECT 1");
        assert_eq!(store.list_history().len(), 1);

        assert!(store.delete_history_entry(5).is_none());
        assert_eq!(store.list_history().len(), 1);
    }

    #[test]
    fn favorites_allow_duplicate_names() {
        let (_dir, store) = store();
        store.add_favorite("counts", "SELECT count(*) FROM a", None);
        store.add_favorite("counts", "SELECT count(*) FROM b", Some("demo".into()));

        let favorites = store.list_favorites();
        assert_eq!(favorites.len(), 2);
        assert_eq!(favorites[0].name, "counts");
        assert_eq!(favorites[1].name, "counts");
        assert_ne!(favorites[0].query, favorites[1].query);
    }

    #[test]
    fn corrupt_files_read_as_empty() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("query_history.json"), "{broken").unwrap();
        std::fs::write(dir.path().join("query_favorites.json"), "42").unwrap();
        assert!(store.list_history().is_empty());
        assert!(store.list_favorites().is_empty());

        // Self-heals on the next save.
        store.record_execution("SELECT 1", None);
        assert_eq!(store.list_history().len(), 1);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = HistoryStore::open(dir.path().to_path_buf());
            store.record_execution("SELECT 1", None);
            store.add_favorite("one", "SELECT 1", None);
        }
        let store = HistoryStore::open(dir.path().to_path_buf());
        assert_eq!(store.list_history().len(), 1);
        assert_eq!(store.list_favorites().len(), 1);
    }
}
