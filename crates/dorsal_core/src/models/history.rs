//! Query history and favorites models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a previously executed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The executed SQL.
    pub query: String,
    /// Database the query ran against, when a database was selected.
    pub database: Option<String>,
    /// When the query was dispatched.
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create a history entry stamped with the current time.
    pub fn new(query: impl Into<String>, database: Option<String>) -> Self {
        Self { query: query.into(), database, timestamp: Utc::now() }
    }

    /// Get a truncated version of the SQL for display and logging.
    ///
    /// The cut is clamped back to a char boundary, so multi-byte SQL
    /// never splits mid-character.
    pub fn query_preview(&self, max_len: usize) -> &str {
        let mut end = max_len.min(self.query.len());
        while !self.query.is_char_boundary(end) {
            end -= 1;
        }
        &self.query[..end]
    }
}

/// A named, user-saved query.
///
/// Names are not unique; two favorites may share a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    /// User-chosen display name.
    pub name: String,
    /// The saved SQL.
    pub query: String,
    /// Database the query targets, when one was selected at save time.
    pub database: Option<String>,
    /// When the favorite was created.
    pub created_at: DateTime<Utc>,
}

impl FavoriteEntry {
    /// Create a favorite stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        query: impl Into<String>,
        database: Option<String>,
    ) -> Self {
        Self { name: name.into(), query: query.into(), database, created_at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_preview_truncates() {
        let entry = HistoryEntry::new("SELECT * FROM students", None);
        assert_eq!(entry.query_preview(6), "SELECT");
        assert_eq!(entry.query_preview(1000), "SELECT * FROM students");
    }

    #[test]
    fn query_preview_clamps_to_char_boundary() {
        // Byte 10 lands inside the two-byte 'é'.
        let entry = HistoryEntry::new("SELECT 'héllo'", None);
        assert_eq!(entry.query_preview(10), "SELECT 'h");
        assert_eq!(entry.query_preview(11), "SELECT 'hé");
    }
}
