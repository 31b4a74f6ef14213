//! Application configuration and recent-project models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Color theme, one of the known names.
///
/// Unknown names in a stored config deserialize to the default via `parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Blue,
}

impl Theme {
    /// Convert to string representation for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::Blue => "Blue",
        }
    }

    /// Parse from string representation.
    pub fn parse(s: &str) -> Self {
        match s {
            "Dark" => Self::Dark,
            "Blue" => Self::Blue,
            _ => Self::Light,
        }
    }
}

/// Default server connection parameters (the `connection` section).
///
/// The password is persisted in clear text, matching the existing config
/// artifact. Known weakness; see DESIGN.md.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_username() -> String {
    "postgres".to_string()
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: String::new(),
        }
    }
}

/// The `appearance` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppearanceSection {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
}

fn default_font_size() -> u32 {
    10
}

impl Default for AppearanceSection {
    fn default() -> Self {
        Self { theme: Theme::default(), font_size: default_font_size() }
    }
}

/// The `editor` section. Consumed only by the presentation layer, but the
/// core persists it alongside everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSection {
    #[serde(default = "default_true")]
    pub auto_complete: bool,
    #[serde(default = "default_true")]
    pub syntax_highlighting: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EditorSection {
    fn default() -> Self {
        Self { auto_complete: true, syntax_highlighting: true }
    }
}

/// Full application configuration.
///
/// Every section and every key is always present after load; missing keys
/// fill in from defaults and unknown keys are dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub appearance: AppearanceSection,
    #[serde(default)]
    pub editor: EditorSection,
    /// Last authenticated username, or empty before any login.
    #[serde(default)]
    pub current_user: String,
}

/// A recently opened project: a named connection target plus the database
/// it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Display name chosen at creation.
    pub name: String,
    /// Target database name. Unique key within the recency list.
    pub database: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// When this project was last opened.
    pub last_opened: DateTime<Utc>,
}

impl ProjectRecord {
    /// Create a project record stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        database: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            database: database.into(),
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            last_opened: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parse_falls_back_to_light() {
        assert_eq!(Theme::parse("Dark"), Theme::Dark);
        assert_eq!(Theme::parse("Solarized"), Theme::Light);
    }

    #[test]
    fn default_config_has_every_key() {
        let config = Config::default();
        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.port, 5432);
        assert_eq!(config.appearance.font_size, 10);
        assert!(config.editor.auto_complete);
        assert!(config.editor.syntax_highlighting);
        assert!(config.current_user.is_empty());
    }

    #[test]
    fn section_with_missing_keys_fills_defaults() {
        let section: ConnectionSection =
            serde_json::from_value(serde_json::json!({ "host": "db.internal" })).unwrap();
        assert_eq!(section.host, "db.internal");
        assert_eq!(section.port, 5432);
        assert_eq!(section.username, "postgres");
    }
}
