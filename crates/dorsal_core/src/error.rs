//! Error types for the Dorsal core.
//!
//! One enum covers the whole taxonomy: configuration, authentication,
//! connection, query, and local storage failures. Connection failures keep
//! their cause (auth vs. network vs. unknown database) so callers can retry
//! with corrected parameters.

use thiserror::Error;

/// Main error type for the Dorsal core.
#[derive(Debug, Error)]
pub enum DorsalError {
    /// Configuration file could not be read or written.
    #[error("Config error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
    },

    /// Login rejected: unknown user or wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account creation rejected: the username is already taken.
    #[error("Username already exists: {username}")]
    DuplicateUsername {
        /// The conflicting username.
        username: String,
    },

    /// Server rejected the supplied credentials during connect.
    #[error("Authentication failed: {message}")]
    AuthFailed {
        /// Server-reported error message.
        message: String,
    },

    /// The server could not be reached at all.
    #[error("Server unreachable: {message}")]
    NetworkUnreachable {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connect named a database the server does not have.
    #[error("Unknown database: {message}")]
    UnknownDatabase {
        /// Server-reported error message.
        message: String,
    },

    /// Any other connection failure.
    #[error("Connection error: {message}")]
    Connection {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation requires an active session.
    #[error("Not connected to a database server")]
    NotConnected,

    /// Statement execution failed; the engine's message passes through verbatim.
    #[error("{message}")]
    Query {
        /// Engine error message.
        message: String,
        /// SQLSTATE code (e.g. "42P01"), when the engine reported one.
        code: Option<String>,
    },

    /// Local credential/metadata storage error.
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unexpected internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl DorsalError {
    // ========== Constructors ==========

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a new duplicate-username error.
    pub fn duplicate_username(username: impl Into<String>) -> Self {
        Self::DuplicateUsername { username: username.into() }
    }

    /// Create a new auth-failed connection error.
    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::AuthFailed { message: message.into() }
    }

    /// Create a new unreachable-server error.
    pub fn network_unreachable(message: impl Into<String>) -> Self {
        Self::NetworkUnreachable { message: message.into(), source: None }
    }

    /// Create a new unknown-database error.
    pub fn unknown_database(message: impl Into<String>) -> Self {
        Self::UnknownDatabase { message: message.into() }
    }

    /// Create a new generic connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Create a new query error.
    pub fn query(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Query { message: message.into(), code }
    }

    /// Create a new storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into(), source: None }
    }

    /// Create a new storage error with source.
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    // ========== Methods ==========

    /// Check if this error came from the connect path.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::AuthFailed { .. }
                | Self::NetworkUnreachable { .. }
                | Self::UnknownDatabase { .. }
                | Self::Connection { .. }
        )
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "Config",
            Self::InvalidCredentials | Self::DuplicateUsername { .. } => "Auth",
            Self::AuthFailed { .. }
            | Self::NetworkUnreachable { .. }
            | Self::UnknownDatabase { .. }
            | Self::Connection { .. }
            | Self::NotConnected => "Connection",
            Self::Query { .. } => "Query",
            Self::Storage { .. } => "Storage",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Get the SQLSTATE code, when the engine reported one.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Query { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

// ========== Error Conversions ==========

/// Map a SQLSTATE code onto the connect-failure taxonomy.
///
/// 28xxx is authentication, 3D000 is an unknown database, 08xxx is a
/// connection exception. Everything else stays a query error.
pub(crate) fn classify_sqlstate(code: &str, message: String) -> DorsalError {
    match code {
        "28P01" | "28000" => DorsalError::AuthFailed { message },
        "3D000" => DorsalError::UnknownDatabase { message },
        _ if code.starts_with("08") => {
            DorsalError::NetworkUnreachable { message, source: None }
        }
        _ => DorsalError::Query { message, code: Some(code.to_string()) },
    }
}

/// Convert from tokio_postgres::Error to DorsalError.
impl From<tokio_postgres::Error> for DorsalError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let code = db_err.code().code().to_string();
            let message = db_err.message().to_string();
            return classify_sqlstate(&code, message);
        }

        // No server-side details: the connection itself failed or dropped.
        if err.is_closed() {
            return DorsalError::NetworkUnreachable {
                message: "Connection closed".to_string(),
                source: Some(Box::new(err)),
            };
        }

        DorsalError::Connection { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

/// Convert from rusqlite::Error to DorsalError.
impl From<rusqlite::Error> for DorsalError {
    fn from(err: rusqlite::Error) -> Self {
        DorsalError::Storage { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

/// Convert from std::io::Error to DorsalError.
impl From<std::io::Error> for DorsalError {
    fn from(err: std::io::Error) -> Self {
        DorsalError::Storage { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

/// Convert from serde_json::Error to DorsalError.
impl From<serde_json::Error> for DorsalError {
    fn from(err: serde_json::Error) -> Self {
        DorsalError::Storage {
            message: format!("JSON error: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlstate_auth_codes_map_to_auth_failed() {
        for code in ["28P01", "28000"] {
            let err = classify_sqlstate(code, "password authentication failed".into());
            assert!(matches!(err, DorsalError::AuthFailed { .. }), "code {code}");
        }
    }

    #[test]
    fn sqlstate_unknown_database() {
        let err = classify_sqlstate("3D000", "database \"nope\" does not exist".into());
        assert!(matches!(err, DorsalError::UnknownDatabase { .. }));
    }

    #[test]
    fn sqlstate_connection_exception_class() {
        let err = classify_sqlstate("08006", "connection failure".into());
        assert!(matches!(err, DorsalError::NetworkUnreachable { .. }));
    }

    #[test]
    fn sqlstate_other_codes_stay_query_errors() {
        let err = classify_sqlstate("42P01", "relation \"t\" does not exist".into());
        match err {
            DorsalError::Query { code, .. } => assert_eq!(code.as_deref(), Some("42P01")),
            other => panic!("expected Query error, got {other:?}"),
        }
    }

    #[test]
    fn categories() {
        assert_eq!(DorsalError::InvalidCredentials.category(), "Auth");
        assert_eq!(DorsalError::NotConnected.category(), "Connection");
        assert_eq!(DorsalError::query("boom", None).category(), "Query");
    }
}
