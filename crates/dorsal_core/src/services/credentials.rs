//! Local operator accounts backed by SQLite.
//!
//! Stores `{username, password_hash, role, created_at}` records in `users.db`
//! inside the data directory. Passwords are hashed with PBKDF2-HMAC-SHA256
//! and a per-user random salt; the stored format is
//! `pbkdf2-sha256$<iterations>$<salt-hex>$<digest-hex>`.
//!
//! First run with an empty table bootstraps a well-known `admin` account so
//! the tool is usable without setup. The bootstrap races through the table's
//! primary key: a concurrent duplicate insert means someone else already
//! bootstrapped, and is not an error.

use crate::error::DorsalError;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::Sha256;
use std::path::{Path, PathBuf};

/// Username of the bootstrap administrator account.
pub const BOOTSTRAP_ADMIN_USER: &str = "admin";

/// Initial password of the bootstrap administrator account.
pub const BOOTSTRAP_ADMIN_PASSWORD: &str = "admin";

/// Role assigned to accounts created without an explicit role.
pub const DEFAULT_ROLE: &str = "user";

/// PBKDF2 iteration count for new password hashes.
#[cfg(not(test))]
const PBKDF2_ITERATIONS: u32 = 600_000;

/// Reduced work factor so the unit suite stays fast. The stored format
/// encodes the count, so hashes verify regardless of the build profile.
#[cfg(test)]
const PBKDF2_ITERATIONS: u32 = 1_000;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Digest length in bytes (SHA-256).
const DIGEST_LEN: usize = 32;

/// SQLite-backed store of local operator accounts.
///
/// Thread-safe via internal Mutex, same as the metadata stores.
pub struct CredentialStore {
    /// Thread-safe SQLite connection
    connection: Mutex<Connection>,
}

impl CredentialStore {
    /// Open or create the credential store in the given data directory.
    pub fn open(data_dir: &Path) -> Result<Self, DorsalError> {
        Self::open_with_path(data_dir.join("users.db"))
    }

    /// Open the store at a specific database path (for testing).
    pub fn open_with_path(db_path: PathBuf) -> Result<Self, DorsalError> {
        let connection = Connection::open(&db_path).map_err(|e| {
            DorsalError::storage(format!(
                "Failed to open credential database '{}': {}",
                db_path.display(),
                e
            ))
        })?;

        connection
            .execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;
                ",
            )
            .map_err(|e| {
                DorsalError::storage(format!("Failed to configure credential database: {e}"))
            })?;

        let store = Self { connection: Mutex::new(connection) };
        store.initialize()?;

        tracing::info!(path = %db_path.display(), "Credential store opened");
        Ok(store)
    }

    /// Ensure the backing table exists. Idempotent.
    fn initialize(&self) -> Result<(), DorsalError> {
        let conn = self.connection.lock();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            ) STRICT",
            [],
        )
        .map_err(|e| DorsalError::storage(format!("Failed to create users table: {e}")))?;
        Ok(())
    }

    /// Count stored accounts.
    pub fn user_count(&self) -> Result<u64, DorsalError> {
        let conn = self.connection.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(|e| DorsalError::storage(format!("Failed to count users: {e}")))?;
        Ok(count as u64)
    }

    /// Check a username/password pair against the stored hash.
    ///
    /// Returns false for an unknown user or a non-matching password; an
    /// unknown user is never an error.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool, DorsalError> {
        let conn = self.connection.lock();
        let stored: Option<String> = conn
            .query_row(
                "SELECT password_hash FROM users WHERE username = ?",
                [username],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DorsalError::storage(format!("Failed to look up user: {e}")))?;

        match stored {
            Some(hash) => Ok(verify_password(password, &hash)),
            None => Ok(false),
        }
    }

    /// Create a new account with the given role.
    ///
    /// Fails with [`DorsalError::DuplicateUsername`] when the username is
    /// already taken.
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<(), DorsalError> {
        let conn = self.connection.lock();
        let hash = hash_password(password);

        match conn.execute(
            "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
            params![username, hash, role],
        ) {
            Ok(_) => {
                tracing::debug!(username, role, "User created");
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => {
                Err(DorsalError::duplicate_username(username))
            }
            Err(e) => Err(DorsalError::storage(format!("Failed to create user: {e}"))),
        }
    }

    /// Create the well-known administrator account when no accounts exist.
    ///
    /// Returns the admin username as the effective current user. Losing the
    /// insert race to another first-run process counts as success: the
    /// account exists either way.
    pub fn bootstrap_admin(&self) -> Result<String, DorsalError> {
        match self.create_user(BOOTSTRAP_ADMIN_USER, BOOTSTRAP_ADMIN_PASSWORD, "admin") {
            Ok(()) => {
                tracing::info!(username = BOOTSTRAP_ADMIN_USER, "Bootstrap admin created");
                Ok(BOOTSTRAP_ADMIN_USER.to_string())
            }
            Err(DorsalError::DuplicateUsername { .. }) => {
                tracing::debug!("Bootstrap admin already exists");
                Ok(BOOTSTRAP_ADMIN_USER.to_string())
            }
            Err(e) => Err(e),
        }
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ========== Password Hashing ==========

/// Hash a password with PBKDF2-HMAC-SHA256 and a fresh random salt.
pub fn hash_password(password: &str) -> String {
    use rand::RngCore;

    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let digest = derive(password, &salt, PBKDF2_ITERATIONS);
    format!(
        "pbkdf2-sha256${}${}${}",
        PBKDF2_ITERATIONS,
        hex::encode(salt),
        hex::encode(digest)
    )
}

/// Verify a password against a stored hash string.
///
/// Malformed stored hashes verify as false rather than erroring; a damaged
/// record reads as "wrong password".
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iters), Some(salt_hex), Some(digest_hex), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    if scheme != "pbkdf2-sha256" {
        return false;
    }
    let Ok(iterations) = iters.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };
    if expected.len() != DIGEST_LEN {
        return false;
    }

    derive(password, &salt, iterations)[..] == expected[..]
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; DIGEST_LEN] {
    let mut digest = [0u8; DIGEST_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut digest);
    digest
}
