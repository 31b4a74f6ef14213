//! Session lifecycle models.

use serde::{Deserialize, Serialize};

use super::config::{ConnectionSection, ProjectRecord};

/// Current state of the managed server session.
///
/// The lifecycle is `Disconnected -> Connecting -> Connected -> Disconnected`;
/// a failed connect lands back in `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No active connection
    #[default]
    Disconnected,
    /// Connection in progress
    Connecting,
    /// Active, healthy connection
    Connected,
}

impl SessionStatus {
    /// Check if the session is active.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if a connect is in progress.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Check if the session is disconnected.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

/// Parameters for opening a session against the managed server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
    /// Server hostname or IP.
    pub host: String,
    /// Server port (default 5432).
    pub port: u16,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl ConnectParams {
    /// Create connect parameters with required fields.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self { host: host.into(), port, username: username.into(), password: password.into() }
    }

    /// Get the display connection string (without password).
    pub fn display_url(&self) -> String {
        format!("postgresql://{}@{}:{}", self.username, self.host, self.port)
    }
}

impl From<&ConnectionSection> for ConnectParams {
    fn from(section: &ConnectionSection) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            username: section.username.clone(),
            password: section.password.clone(),
        }
    }
}

impl From<&ProjectRecord> for ConnectParams {
    fn from(project: &ProjectRecord) -> Self {
        Self {
            host: project.host.clone(),
            port: project.port,
            username: project.username.clone(),
            password: project.password.clone(),
        }
    }
}
