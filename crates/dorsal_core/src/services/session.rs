//! Server session lifecycle and catalog introspection.
//!
//! At most one live session exists at a time. A session is a
//! `tokio_postgres::Client` plus its spawned connection driver task;
//! reconnecting replaces the pair wholesale. Connect failures are split
//! into typed causes (bad credentials, unknown database, unreachable
//! server) so callers can retry with corrected parameters.

use crate::error::DorsalError;
use crate::models::{ConnectParams, QueryOutcome, SessionStatus, TableResult};
use crate::services::query::QueryExecutor;

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

/// Database used when connecting without an explicit target.
const MAINTENANCE_DATABASE: &str = "postgres";

/// Connect timeout for new sessions.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const SAMPLE_STUDENTS: [(&str, &str, i32, &str); 5] = [
    ("John Doe", "john@example.com", 20, "A"),
    ("Jane Smith", "jane@example.com", 19, "B"),
    ("Bob Johnson", "bob@example.com", 21, "A"),
    ("Alice Brown", "alice@example.com", 18, "C"),
    ("Charlie Wilson", "charlie@example.com", 22, "B"),
];

/// A live connection to the server.
struct ActiveSession {
    /// Client half of the tokio-postgres pair.
    client: Client,
    /// Driver task polling the connection half.
    driver: JoinHandle<()>,
    /// Parameters the session was opened with, kept for reconnects.
    params: ConnectParams,
    /// Explicitly selected database, if any.
    database: Option<String>,
}

/// Manages the single server session and its lifecycle.
///
/// Lifecycle is `Disconnected -> Connecting -> Connected`; a failed
/// connect lands back in `Disconnected`. Introspection and provisioning
/// operations require `Connected` and fail with
/// [`DorsalError::NotConnected`] otherwise.
///
/// One manager per connection; concurrent independent queries need
/// independent managers.
pub struct SessionManager {
    session: Option<ActiveSession>,
    status: SessionStatus,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    /// Create a manager with no active session.
    pub fn new() -> Self {
        Self { session: None, status: SessionStatus::Disconnected }
    }

    /// Get the current session status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Get the explicitly selected database of the active session, if any.
    pub fn current_database(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.database.as_deref())
    }

    /// Get the parameters the active session was opened with.
    pub fn current_params(&self) -> Option<&ConnectParams> {
        self.session.as_ref().map(|s| &s.params)
    }

    /// Get the active client, or `NotConnected`.
    pub fn client(&self) -> Result<&Client, DorsalError> {
        self.session
            .as_ref()
            .map(|s| &s.client)
            .ok_or(DorsalError::NotConnected)
    }

    // ========== Lifecycle ==========

    /// Open a session, replacing any active one.
    ///
    /// Connects to `database` when given, otherwise to the maintenance
    /// database. On failure the manager is left disconnected and the error
    /// carries the typed cause.
    pub async fn connect(
        &mut self,
        params: ConnectParams,
        database: Option<String>,
    ) -> Result<(), DorsalError> {
        if self.session.is_some() {
            tracing::debug!("Replacing active session");
            self.disconnect();
        }
        self.status = SessionStatus::Connecting;

        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&params.host);
        pg_config.port(params.port);
        pg_config.user(&params.username);
        pg_config.password(&params.password);
        pg_config.dbname(database.as_deref().unwrap_or(MAINTENANCE_DATABASE));
        pg_config.application_name("dorsal");
        pg_config.connect_timeout(CONNECT_TIMEOUT);

        match pg_config.connect(NoTls).await {
            Ok((client, connection)) => {
                let driver = tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::warn!(error = %e, "Server link closed with error");
                    }
                });

                tracing::info!(
                    url = %params.display_url(),
                    database = database.as_deref().unwrap_or(MAINTENANCE_DATABASE),
                    "Session opened"
                );
                self.session = Some(ActiveSession { client, driver, params, database });
                self.status = SessionStatus::Connected;
                Ok(())
            }
            Err(e) => {
                self.status = SessionStatus::Disconnected;
                Err(map_connect_error(e))
            }
        }
    }

    /// Close the active session. Idempotent from any state.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.driver.abort();
            tracing::info!(url = %session.params.display_url(), "Session closed");
        }
        self.status = SessionStatus::Disconnected;
    }

    // ========== Introspection ==========

    /// List databases on the server, excluding templates.
    pub async fn list_databases(&self) -> Result<Vec<String>, DorsalError> {
        let client = self.client()?;
        let rows = client
            .query(
                "SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname",
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| row.try_get(0).map_err(DorsalError::from))
            .collect()
    }

    /// List user tables in the current database's public schema.
    pub async fn list_tables(&self) -> Result<Vec<String>, DorsalError> {
        let client = self.client()?;
        let rows = client
            .query(
                "SELECT tablename FROM pg_catalog.pg_tables \
                 WHERE schemaname = 'public' ORDER BY tablename",
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| row.try_get(0).map_err(DorsalError::from))
            .collect()
    }

    /// Describe a table's columns in ordinal order.
    ///
    /// Columns of the result: name, type, nullable, key ("PRI" for primary
    /// key members), default. An unknown table yields an empty result, not
    /// an error.
    pub async fn describe_table(&self, table: &str) -> Result<TableResult, DorsalError> {
        let client = self.client()?;
        let sql = "SELECT c.column_name AS \"column\", \
                          c.data_type AS \"type\", \
                          c.is_nullable AS \"nullable\", \
                          CASE WHEN EXISTS ( \
                              SELECT 1 FROM information_schema.table_constraints tc \
                              JOIN information_schema.key_column_usage kcu \
                                ON kcu.constraint_name = tc.constraint_name \
                               AND kcu.table_schema = tc.table_schema \
                               AND kcu.table_name = tc.table_name \
                              WHERE tc.constraint_type = 'PRIMARY KEY' \
                                AND tc.table_schema = c.table_schema \
                                AND tc.table_name = c.table_name \
                                AND kcu.column_name = c.column_name \
                          ) THEN 'PRI' ELSE '' END AS \"key\", \
                          c.column_default AS \"default\" \
                   FROM information_schema.columns c \
                   WHERE c.table_schema = 'public' AND c.table_name = $1 \
                   ORDER BY c.ordinal_position";

        match QueryExecutor::execute_with_params(client, sql, &[&table]).await? {
            QueryOutcome::Table(table) => Ok(table),
            QueryOutcome::Mutation { .. } => {
                Err(DorsalError::internal("Table description returned no result set"))
            }
        }
    }

    // ========== Provisioning ==========

    /// Create a database if it does not already exist.
    ///
    /// Returns true when the database was created, false when it was
    /// already present. Safe to repeat.
    pub async fn create_database(&self, name: &str) -> Result<bool, DorsalError> {
        let client = self.client()?;

        // CREATE DATABASE has no IF NOT EXISTS, so check the catalog first.
        let existing = client
            .query("SELECT 1 FROM pg_database WHERE datname = $1", &[&name])
            .await?;
        if !existing.is_empty() {
            tracing::debug!(database = name, "Database already exists");
            return Ok(false);
        }

        client
            .execute(&format!("CREATE DATABASE {}", quote_ident(name)), &[])
            .await?;
        tracing::info!(database = name, "Database created");
        Ok(true)
    }

    /// Create the sample `students` table with seed rows in `database`.
    ///
    /// Reconnects to `database` when it is not the active one. Both the
    /// table creation and the seed inserts are guarded, so repeating this
    /// produces no duplicate objects or rows.
    pub async fn create_sample_schema(&mut self, database: &str) -> Result<(), DorsalError> {
        if self.current_database() != Some(database) {
            let params = self
                .session
                .as_ref()
                .map(|s| s.params.clone())
                .ok_or(DorsalError::NotConnected)?;
            self.connect(params, Some(database.to_string())).await?;
        }

        let client = self.client()?;
        QueryExecutor::execute(
            client,
            "CREATE TABLE IF NOT EXISTS students ( \
                 id SERIAL PRIMARY KEY, \
                 name VARCHAR(100) NOT NULL, \
                 email VARCHAR(100) UNIQUE, \
                 age INT, \
                 grade CHAR(1), \
                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP \
             )",
        )
        .await?;

        for (name, email, age, grade) in SAMPLE_STUDENTS {
            QueryExecutor::execute_with_params(
                client,
                "INSERT INTO students (name, email, age, grade) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (email) DO NOTHING",
                &[&name, &email, &age, &grade],
            )
            .await?;
        }

        tracing::info!(database, "Sample schema ready");
        Ok(())
    }
}

/// Quote an identifier for interpolation into DDL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Map a connect-path failure onto the typed causes.
///
/// Server-reported SQLSTATEs go through the shared classifier; errors with
/// no server details (refused, timed out, dropped) are unreachable-server.
fn map_connect_error(err: tokio_postgres::Error) -> DorsalError {
    if err.as_db_error().is_none() {
        let io_level = std::error::Error::source(&err)
            .map(|s| s.downcast_ref::<std::io::Error>().is_some())
            .unwrap_or(false);
        // Connect timeouts carry no io source and no public kind accessor.
        let timed_out = err.to_string().contains("timed out");
        if io_level || timed_out || err.is_closed() {
            return DorsalError::NetworkUnreachable {
                message: err.to_string(),
                source: Some(Box::new(err)),
            };
        }
    }
    DorsalError::from(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_manager_is_disconnected() {
        let manager = SessionManager::new();
        assert!(manager.status().is_disconnected());
        assert!(manager.current_database().is_none());
        assert!(matches!(manager.client(), Err(DorsalError::NotConnected)));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut manager = SessionManager::new();
        manager.disconnect();
        manager.disconnect();
        assert!(manager.status().is_disconnected());
    }

    #[tokio::test]
    async fn operations_require_connection() {
        let manager = SessionManager::new();
        assert!(matches!(
            manager.list_databases().await,
            Err(DorsalError::NotConnected)
        ));
        assert!(matches!(
            manager.list_tables().await,
            Err(DorsalError::NotConnected)
        ));
        assert!(matches!(
            manager.describe_table("students").await,
            Err(DorsalError::NotConnected)
        ));
        assert!(matches!(
            manager.create_database("demo").await,
            Err(DorsalError::NotConnected)
        ));

        let mut manager = manager;
        assert!(matches!(
            manager.create_sample_schema("demo").await,
            Err(DorsalError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn failed_connect_returns_to_disconnected() {
        let mut manager = SessionManager::new();
        // Port 1 is never a PostgreSQL server.
        let params = ConnectParams::new("127.0.0.1", 1, "postgres", "");
        let err = manager.connect(params, None).await.unwrap_err();
        assert!(err.is_connection_error(), "got {err:?}");
        assert!(manager.status().is_disconnected());
        assert!(matches!(manager.client(), Err(DorsalError::NotConnected)));
    }

    #[test]
    fn quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
