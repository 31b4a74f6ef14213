//! Data models for the Dorsal core.
//!
//! This module contains all core data structures:
//! - `config` - Config sections, Theme, ProjectRecord
//! - `session` - ConnectParams, SessionStatus
//! - `query` - Cell, TableResult, QueryOutcome
//! - `history` - HistoryEntry, FavoriteEntry

pub mod config;
pub mod history;
pub mod query;
pub mod session;

pub use config::{AppearanceSection, Config, ConnectionSection, EditorSection, ProjectRecord, Theme};
pub use history::{FavoriteEntry, HistoryEntry};
pub use query::{Cell, QueryOutcome, TableResult};
pub use session::{ConnectParams, SessionStatus};
