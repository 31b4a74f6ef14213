//! Core types and services for the Dorsal PostgreSQL admin tool.
//!
//! This crate provides the data-management layer behind the tool:
//!
//! - **error**: Error handling with typed connection-failure causes
//! - **models**: Data structures for config, sessions, queries, and history
//! - **services**: Config, credentials, session, query execution, history
//! - **state**: Application state and the command surface
//! - **logging**: Structured logging setup

pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

pub use error::DorsalError;
pub use models::{
    AppearanceSection, Cell, Config, ConnectParams, ConnectionSection, EditorSection,
    FavoriteEntry, HistoryEntry, ProjectRecord, QueryOutcome, SessionStatus, TableResult, Theme,
};
pub use services::{ConfigStore, CredentialStore, HistoryStore, QueryExecutor, SessionManager};
pub use state::AppState;
