//! Application state: the command surface over the backend services.
//!
//! `AppState` composes the stores and the session manager explicitly; no
//! globals. Every operation returns a typed result, so a frontend can
//! render outcomes without parsing error strings. Long operations are
//! `async fn`s and run on the caller's runtime.

use crate::error::DorsalError;
use crate::models::{
    Config, ConnectParams, FavoriteEntry, HistoryEntry, ProjectRecord, QueryOutcome,
    SessionStatus, TableResult,
};
use crate::services::{
    config::default_data_dir, ConfigStore, CredentialStore, HistoryStore, QueryExecutor,
    SessionManager,
};

use std::path::PathBuf;

/// Central application state.
///
/// Owns the config, credential, and history stores plus the single server
/// session. Intended for one instance per process.
pub struct AppState {
    /// Config and recent-project persistence
    config_store: ConfigStore,
    /// In-memory copy of the loaded config
    config: Config,
    /// Local operator accounts
    credentials: CredentialStore,
    /// The managed server session
    session: SessionManager,
    /// Query history and favorites
    history: HistoryStore,
}

impl AppState {
    /// Create application state in the default data directory.
    pub fn new() -> Result<Self, DorsalError> {
        Self::with_data_dir(default_data_dir())
    }

    /// Create application state with a custom data directory (for testing).
    ///
    /// First run with no stored accounts bootstraps the well-known admin
    /// account and records it as the current user.
    pub fn with_data_dir(data_dir: PathBuf) -> Result<Self, DorsalError> {
        let config_store = ConfigStore::open(data_dir.clone())?;
        let mut config = config_store.load();
        let credentials = CredentialStore::open(&data_dir)?;
        let history = HistoryStore::open(data_dir.clone());

        if credentials.user_count()? == 0 {
            let user = credentials.bootstrap_admin()?;
            config.current_user = user;
            config_store.save(&config);
        }

        tracing::info!(data_dir = %data_dir.display(), "AppState initialized");

        Ok(Self {
            config_store,
            config,
            credentials,
            session: SessionManager::new(),
            history,
        })
    }

    // ========== Accounts ==========

    /// Log in a local operator.
    ///
    /// On success the username becomes the current user and the config is
    /// saved. A bad username and a bad password are indistinguishable.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), DorsalError> {
        if !self.credentials.authenticate(username, password)? {
            return Err(DorsalError::InvalidCredentials);
        }
        self.config.current_user = username.to_string();
        self.config_store.save(&self.config);
        tracing::info!(username, "User logged in");
        Ok(())
    }

    /// Create a new local operator account with the default role.
    pub fn create_account(&self, username: &str, password: &str) -> Result<(), DorsalError> {
        self.credentials
            .create_user(username, password, crate::services::credentials::DEFAULT_ROLE)
    }

    /// Get the current user's name; empty when nobody is logged in.
    pub fn current_user(&self) -> &str {
        &self.config.current_user
    }

    // ========== Session ==========

    /// Open a server session, replacing any active one.
    pub async fn connect(
        &mut self,
        params: ConnectParams,
        database: Option<String>,
    ) -> Result<(), DorsalError> {
        self.session.connect(params, database).await
    }

    /// Open a session to a project's database and promote it in the
    /// recent-project list.
    pub async fn open_project(&mut self, project: &ProjectRecord) -> Result<(), DorsalError> {
        let params = ConnectParams::from(project);
        self.session
            .connect(params, Some(project.database.clone()))
            .await?;

        let mut record = project.clone();
        record.last_opened = chrono::Utc::now();
        self.config_store.add_recent_project(record);
        Ok(())
    }

    /// Close the active session. Idempotent.
    pub fn disconnect(&mut self) {
        self.session.disconnect();
    }

    /// Get the current session status.
    pub fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    // ========== Queries ==========

    /// Execute one SQL statement on the active session.
    ///
    /// The statement is recorded in history at dispatch, before the outcome
    /// is known, so failed queries appear there too.
    pub async fn execute(&self, sql: &str) -> Result<QueryOutcome, DorsalError> {
        let client = self.session.client()?;
        self.history
            .record_execution(sql, self.session.current_database().map(String::from));
        QueryExecutor::execute(client, sql).await
    }

    /// List databases on the server.
    pub async fn list_databases(&self) -> Result<Vec<String>, DorsalError> {
        self.session.list_databases().await
    }

    /// List tables in the current database.
    pub async fn list_tables(&self) -> Result<Vec<String>, DorsalError> {
        self.session.list_tables().await
    }

    /// Describe a table's columns.
    pub async fn describe_table(&self, table: &str) -> Result<TableResult, DorsalError> {
        self.session.describe_table(table).await
    }

    /// Create a database if it does not exist. Returns true when created.
    pub async fn create_database(&self, name: &str) -> Result<bool, DorsalError> {
        self.session.create_database(name).await
    }

    /// Create the sample schema with seed data in the given database.
    pub async fn create_sample_schema(&mut self, database: &str) -> Result<(), DorsalError> {
        self.session.create_sample_schema(database).await
    }

    // ========== History and Favorites ==========

    /// Get the query history, newest first.
    pub fn query_history(&self) -> Vec<HistoryEntry> {
        self.history.list_history()
    }

    /// Remove one history entry by position. Returns the removed entry.
    pub fn delete_history_entry(&self, index: usize) -> Option<HistoryEntry> {
        self.history.delete_history_entry(index)
    }

    /// Save the given SQL as a named favorite, tagged with the current
    /// database.
    pub fn record_favorite(&self, name: &str, sql: &str) -> FavoriteEntry {
        self.history
            .add_favorite(name, sql, self.session.current_database().map(String::from))
    }

    /// Get the saved favorites.
    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        self.history.list_favorites()
    }

    // ========== Config ==========

    /// Get the current config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the config and save it.
    pub fn update_config(&mut self, config: Config) {
        self.config = config;
        self.config_store.save(&self.config);
    }

    /// Get the recent projects, most recently opened first.
    pub fn recent_projects(&self) -> Vec<ProjectRecord> {
        self.config_store.load_projects()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credentials::{BOOTSTRAP_ADMIN_PASSWORD, BOOTSTRAP_ADMIN_USER};
    use tempfile::tempdir;

    fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempdir().unwrap();
        let state = AppState::with_data_dir(dir.path().to_path_buf()).unwrap();
        (dir, state)
    }

    #[test]
    fn first_run_bootstraps_admin() {
        let (_dir, mut state) = state();
        assert_eq!(state.current_user(), BOOTSTRAP_ADMIN_USER);
        state
            .login(BOOTSTRAP_ADMIN_USER, BOOTSTRAP_ADMIN_PASSWORD)
            .unwrap();
    }

    #[test]
    fn second_run_does_not_rebootstrap() {
        let dir = tempdir().unwrap();
        {
            let mut state = AppState::with_data_dir(dir.path().to_path_buf()).unwrap();
            state.create_account("alice", "pw").unwrap();
            state.login("alice", "pw").unwrap();
        }
        let state = AppState::with_data_dir(dir.path().to_path_buf()).unwrap();
        // current_user stays what the last login set, not the bootstrap.
        assert_eq!(state.current_user(), "alice");
    }

    #[test]
    fn login_rejects_bad_credentials() {
        let (_dir, mut state) = state();
        let err = state.login("admin", "wrong").unwrap_err();
        assert!(matches!(err, DorsalError::InvalidCredentials));
        let err = state.login("ghost", "wrong").unwrap_err();
        assert!(matches!(err, DorsalError::InvalidCredentials));
        // Failed logins do not change the current user.
        assert_eq!(state.current_user(), BOOTSTRAP_ADMIN_USER);
    }

    #[test]
    fn account_lifecycle() {
        let (_dir, mut state) = state();
        state.create_account("bob", "hunter2").unwrap();
        let err = state.create_account("bob", "other").unwrap_err();
        assert!(matches!(err, DorsalError::DuplicateUsername { .. }));

        state.login("bob", "hunter2").unwrap();
        assert_eq!(state.current_user(), "bob");
    }

    #[tokio::test]
    async fn execute_without_session_records_nothing() {
        let (_dir, state) = state();
        let err = state.execute("SELECT 1").await.unwrap_err();
        assert!(matches!(err, DorsalError::NotConnected));
        assert!(state.query_history().is_empty());
    }

    #[test]
    fn favorites_are_recorded() {
        let (_dir, state) = state();
        state.record_favorite("counts", "SELECT count(*) FROM students");
        let favorites = state.favorites();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].name, "counts");
        assert!(favorites[0].database.is_none());
    }
}
