//! Backend services for the Dorsal admin tool.
//!
//! This module contains all service layer abstractions:
//! - `config` - Application config and recent-project persistence
//! - `credentials` - Local operator accounts with hashed passwords
//! - `session` - Server session lifecycle and catalog introspection
//! - `query` - Single-statement execution against the active session
//! - `history` - Query history and favorites persistence

pub mod config;
pub mod credentials;
pub mod history;
pub mod query;
pub mod session;

pub use config::ConfigStore;
pub use credentials::CredentialStore;
pub use history::HistoryStore;
pub use query::QueryExecutor;
pub use session::SessionManager;
