//! Embedded persistence built on redb.
//!
//! One database file holds every persisted concern: runtime settings (the
//! durability log behind the in-memory cache), admin identities with their
//! token lookup table, and the append-only request log. redb gives ACID
//! transactions with a single writer at a time, which is what serializes the
//! first-run admin bootstrap.

pub mod credentials;
pub mod request_log;
pub mod settings;

use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;

use redb::TableDefinition;

pub use credentials::{AdminCredential, CredentialError, CredentialStore};
pub use request_log::{RequestLogEntry, RequestLogStore};
pub use settings::SettingsStore;

/// Settings rows: key -> JSON-encoded `SettingRow`.
pub(crate) const SETTINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

/// Admin identities: username -> JSON-encoded `AdminCredential`.
pub(crate) const ADMINS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("admins");

/// Bearer token lookup: token -> username. Kept in step with `admins`
/// inside the same write transaction.
pub(crate) const TOKENS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("admin_tokens");

/// Append-only request log: sequence number -> JSON-encoded entry.
pub(crate) const REQUEST_LOG_TABLE: TableDefinition<u64, &[u8]> =
    TableDefinition::new("request_log");

/// Opaque backing-store failure. The detail is for server-side logs only;
/// handlers map this to a generic 500.
#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub(crate) fn from_err(err: impl Display) -> Self {
        Self(err.to_string())
    }
}

/// Handle to the opened database, shared by the per-concern stores.
#[derive(Clone)]
pub struct Database {
    db: Arc<redb::Database>,
}

impl Database {
    /// Open or create the database file and make sure every table exists,
    /// so later read transactions never race table creation.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::from_err)?;
            }
        }

        let db = redb::Database::create(path).map_err(StoreError::from_err)?;

        let write_txn = db.begin_write().map_err(StoreError::from_err)?;
        {
            write_txn
                .open_table(SETTINGS_TABLE)
                .map_err(StoreError::from_err)?;
            write_txn
                .open_table(ADMINS_TABLE)
                .map_err(StoreError::from_err)?;
            write_txn
                .open_table(TOKENS_TABLE)
                .map_err(StoreError::from_err)?;
            write_txn
                .open_table(REQUEST_LOG_TABLE)
                .map_err(StoreError::from_err)?;
        }
        write_txn.commit().map_err(StoreError::from_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    pub(crate) fn handle(&self) -> Arc<redb::Database> {
        self.db.clone()
    }
}
