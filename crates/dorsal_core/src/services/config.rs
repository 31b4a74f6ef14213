//! Configuration and recent-project persistence.
//!
//! Config load is total: whatever is on disk, the caller gets back a full
//! `Config` with every section and key populated. Corrupt or missing files
//! are repaired in place with defaults. Saves are best-effort; a failed
//! write is logged, never surfaced.
//!
//! # Data Directory Locations
//!
//! - **macOS**: `~/Library/Application Support/dev.dorsal.Dorsal`
//! - **Windows**: `%APPDATA%\dorsal\Dorsal`
//! - **Linux**: `~/.local/share/dorsal`
//! - **Debug builds**: `./dorsal_data` in current directory

use crate::error::DorsalError;
use crate::models::{Config, ProjectRecord};

use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Maximum entries kept in the recent-project list.
pub const MAX_RECENT_PROJECTS: usize = 10;

/// Get the default data directory for the application.
pub fn default_data_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from("./dorsal_data")
    }

    #[cfg(not(debug_assertions))]
    {
        dirs::data_dir()
            .map(|d| {
                #[cfg(target_os = "macos")]
                {
                    d.join("dev.dorsal.Dorsal")
                }
                #[cfg(target_os = "windows")]
                {
                    d.join("dorsal").join("Dorsal")
                }
                #[cfg(not(any(target_os = "macos", target_os = "windows")))]
                {
                    d.join("dorsal")
                }
            })
            .unwrap_or_else(|| PathBuf::from("./dorsal_data"))
    }
}

/// Initialize the data directory, creating it if needed.
pub fn init_data_dir(path: &PathBuf) -> Result<(), DorsalError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(DorsalError::storage(format!(
                "Data path exists but is not a directory: {}",
                path.display()
            )));
        }
        return Ok(());
    }

    std::fs::create_dir_all(path).map_err(|e| {
        DorsalError::storage(format!(
            "Failed to create data directory '{}': {}",
            path.display(),
            e
        ))
    })?;

    tracing::info!(path = %path.display(), "Created data directory");
    Ok(())
}

/// Persistent store for the application config and recent-project list.
///
/// Writers use last-writer-wins with no file locking. Safe for a single
/// active instance; multiple instances sharing a data directory can clobber
/// each other's writes.
pub struct ConfigStore {
    /// Data directory path
    data_dir: PathBuf,
}

impl ConfigStore {
    /// Open the store in the given data directory, creating it if needed.
    pub fn open(data_dir: PathBuf) -> Result<Self, DorsalError> {
        init_data_dir(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    fn projects_path(&self) -> PathBuf {
        self.data_dir.join("projects.json")
    }

    // ========== Config Operations ==========

    /// Load the application config. Never fails.
    ///
    /// A missing file is created with defaults. An unparseable or non-object
    /// file is logged, overwritten with defaults, and read back as defaults.
    /// A parseable file is merged section by section, key by key, into the
    /// defaults; a section that no longer deserializes falls back to that
    /// section's defaults.
    pub fn load(&self) -> Config {
        let path = self.config_path();

        if !path.exists() {
            let config = Config::default();
            self.save(&config);
            return config;
        }

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                let config = Config::default();
                self.save(&config);
                return config;
            }
        };

        let root = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Config is not an object, repairing with defaults");
                let config = Config::default();
                self.save(&config);
                return config;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Config unparseable, repairing with defaults");
                let config = Config::default();
                self.save(&config);
                return config;
            }
        };

        Config {
            connection: section_or_default(&root, "connection"),
            appearance: section_or_default(&root, "appearance"),
            editor: section_or_default(&root, "editor"),
            current_user: root
                .get("current_user")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Save the application config. Best-effort; failures are logged.
    pub fn save(&self, config: &Config) {
        if let Err(e) = self.write_json(&self.config_path(), config) {
            tracing::warn!(error = %e, "Failed to save config");
        }
    }

    // ========== Recent Project Operations ==========

    /// Load the recent-project list, most recently opened first.
    ///
    /// A corrupt or missing file reads as an empty list and self-heals on
    /// the next save.
    pub fn load_projects(&self) -> Vec<ProjectRecord> {
        let path = self.projects_path();
        if !path.exists() {
            return Vec::new();
        }

        match std::fs::read_to_string(&path)
            .map_err(DorsalError::from)
            .and_then(|raw| serde_json::from_str(&raw).map_err(DorsalError::from))
        {
            Ok(projects) => projects,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Recent projects unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Save the recent-project list. Best-effort; failures are logged.
    pub fn save_projects(&self, projects: &[ProjectRecord]) {
        if let Err(e) = self.write_json(&self.projects_path(), &projects) {
            tracing::warn!(error = %e, "Failed to save recent projects");
        }
    }

    /// Add a project to the recent list, promoting and capping.
    ///
    /// An existing entry for the same database is replaced and moved to the
    /// front; the list never exceeds [`MAX_RECENT_PROJECTS`] entries.
    /// Returns the updated list.
    pub fn add_recent_project(&self, project: ProjectRecord) -> Vec<ProjectRecord> {
        let mut projects = self.load_projects();
        projects.retain(|p| p.database != project.database);
        projects.insert(0, project);
        projects.truncate(MAX_RECENT_PROJECTS);
        self.save_projects(&projects);
        projects
    }

    fn write_json<T: serde::Serialize>(
        &self,
        path: &PathBuf,
        value: &T,
    ) -> Result<(), DorsalError> {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Deserialize one config section, falling back to its defaults when the
/// stored value is missing or no longer fits the schema.
fn section_or_default<T: DeserializeOwned + Default>(
    root: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> T {
    match root.get(key) {
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!(section = key, error = %e, "Config section invalid, using defaults");
            T::default()
        }),
        None => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_creates_defaults() {
        let (_dir, store) = store();
        let config = store.load();
        assert_eq!(config, Config::default());
        assert!(store.data_dir().join("config.json").exists());
    }

    #[test]
    fn unparseable_file_repairs_to_defaults() {
        let (_dir, store) = store();
        std::fs::write(store.data_dir().join("config.json"), "{not json").unwrap();
        let config = store.load();
        assert_eq!(config, Config::default());
        // File was repaired: a second load parses cleanly.
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn non_object_file_repairs_to_defaults() {
        let (_dir, store) = store();
        std::fs::write(store.data_dir().join("config.json"), "[1, 2, 3]").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let (_dir, store) = store();
        std::fs::write(
            store.data_dir().join("config.json"),
            r#"{
                "connection": { "host": "db.internal", "port": 5433 },
                "appearance": { "theme": "Dark" },
                "stale_section": { "x": 1 }
            }"#,
        )
        .unwrap();

        let config = store.load();
        assert_eq!(config.connection.host, "db.internal");
        assert_eq!(config.connection.port, 5433);
        assert_eq!(config.connection.username, "postgres");
        assert_eq!(config.appearance.theme, Theme::Dark);
        assert_eq!(config.appearance.font_size, 10);
        assert_eq!(config.editor, Default::default());
        assert!(config.current_user.is_empty());
    }

    #[test]
    fn mistyped_section_falls_back_to_section_defaults() {
        let (_dir, store) = store();
        std::fs::write(
            store.data_dir().join("config.json"),
            r#"{ "connection": { "port": "not-a-number" }, "current_user": "alice" }"#,
        )
        .unwrap();

        let config = store.load();
        assert_eq!(config.connection, Default::default());
        assert_eq!(config.current_user, "alice");
    }

    #[test]
    fn save_load_round_trip_is_idempotent() {
        let (_dir, store) = store();
        let mut config = store.load();
        config.connection.host = "example.org".to_string();
        config.current_user = "bob".to_string();
        store.save(&config);

        let reloaded = store.load();
        assert_eq!(reloaded, config);

        store.save(&reloaded);
        assert_eq!(store.load(), config);
    }

    #[test]
    fn recent_project_promotion_and_cap() {
        let (_dir, store) = store();

        for i in 0..12 {
            store.add_recent_project(ProjectRecord::new(
                format!("proj{i}"),
                format!("db{i}"),
                "localhost",
                5432,
                "postgres",
                "",
            ));
        }
        let projects = store.load_projects();
        assert_eq!(projects.len(), MAX_RECENT_PROJECTS);
        assert_eq!(projects[0].database, "db11");

        // Re-adding an existing database replaces and promotes it.
        let updated = store.add_recent_project(ProjectRecord::new(
            "renamed", "db5", "localhost", 5432, "postgres", "",
        ));
        assert_eq!(updated.len(), MAX_RECENT_PROJECTS);
        assert_eq!(updated[0].database, "db5");
        assert_eq!(updated[0].name, "renamed");
        assert_eq!(updated.iter().filter(|p| p.database == "db5").count(), 1);
    }

    #[test]
    fn corrupt_projects_file_reads_as_empty() {
        let (_dir, store) = store();
        std::fs::write(store.data_dir().join("projects.json"), "nonsense").unwrap();
        assert!(store.load_projects().is_empty());
    }
}
