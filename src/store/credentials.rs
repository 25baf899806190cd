//! Persisted admin identities and the bearer-token lifecycle.
//!
//! A single admin account is the expected case but the store does not forbid
//! more. Passwords are argon2id-hashed before they reach the database; the
//! plaintext is never persisted or logged. Token lookup goes through a
//! secondary table that is updated in the same write transaction as the
//! identity row, so the two cannot diverge.

use std::sync::Arc;

use argon2::password_hash::{
    rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString,
};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::{StoreError, ADMINS_TABLE, TOKENS_TABLE};

/// Well-formed argon2id hash that matches no password. Verified against on
/// the unknown-username path so both credential failure modes cost the same.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("admin not found")]
    NotFound,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("token already exists")]
    DuplicateToken,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One admin identity row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredential {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<redb::Database>,
}

impl CredentialStore {
    pub fn new(db: &super::Database) -> Self {
        Self { db: db.handle() }
    }

    /// Create an admin identity. Username and token uniqueness are checked
    /// inside the write transaction, which redb serializes, so a concurrent
    /// first launch cannot slip past the existence check.
    pub fn create_admin(
        &self,
        username: &str,
        password: &str,
        token: &str,
    ) -> Result<AdminCredential, CredentialError> {
        let password_hash = hash_password(password)?;

        let write_txn = self.db.begin_write().map_err(StoreError::from_err)?;
        let record = {
            let mut admins = write_txn
                .open_table(ADMINS_TABLE)
                .map_err(StoreError::from_err)?;
            let mut tokens = write_txn
                .open_table(TOKENS_TABLE)
                .map_err(StoreError::from_err)?;

            if admins
                .get(username)
                .map_err(StoreError::from_err)?
                .is_some()
            {
                return Err(CredentialError::DuplicateUsername);
            }
            if tokens.get(token).map_err(StoreError::from_err)?.is_some() {
                return Err(CredentialError::DuplicateToken);
            }

            let id = admins.iter().map_err(StoreError::from_err)?.count() as u64 + 1;
            let record = AdminCredential {
                id,
                username: username.to_string(),
                password_hash,
                token: token.to_string(),
                created_at: Utc::now(),
                last_login: None,
            };

            let bytes = serde_json::to_vec(&record).map_err(StoreError::from_err)?;
            admins
                .insert(username, bytes.as_slice())
                .map_err(StoreError::from_err)?;
            tokens
                .insert(token, username)
                .map_err(StoreError::from_err)?;
            record
        };
        write_txn.commit().map_err(StoreError::from_err)?;

        Ok(record)
    }

    /// Validate a username/password pair. Unknown-username and wrong-password
    /// both return `InvalidCredentials`, and the unknown path still pays for
    /// one argon2 verification. A successful login updates `last_login`
    /// best-effort: a failed write is logged and swallowed.
    pub fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminCredential, CredentialError> {
        let Some(mut record) = self.fetch(username)? else {
            let _ = verify_password(DUMMY_HASH, password);
            return Err(CredentialError::InvalidCredentials);
        };

        if !verify_password(&record.password_hash, password)? {
            return Err(CredentialError::InvalidCredentials);
        }

        record.last_login = Some(Utc::now());
        if let Err(err) = self.persist(&record) {
            tracing::warn!(username = %record.username, error = %err, "failed to record last_login");
        }

        Ok(record)
    }

    /// Validate a bearer token. No expiry; rotation is the only revocation.
    pub fn validate_token(&self, token: &str) -> Result<AdminCredential, CredentialError> {
        let username = {
            let read_txn = self.db.begin_read().map_err(StoreError::from_err)?;
            let tokens = read_txn
                .open_table(TOKENS_TABLE)
                .map_err(StoreError::from_err)?;
            match tokens.get(token).map_err(StoreError::from_err)? {
                Some(value) => value.value().to_string(),
                None => return Err(CredentialError::InvalidToken),
            }
        };

        let record = self.fetch(&username)?.ok_or(CredentialError::InvalidToken)?;

        // Backstop for a stale lookup row.
        if !bool::from(record.token.as_bytes().ct_eq(token.as_bytes())) {
            return Err(CredentialError::InvalidToken);
        }

        Ok(record)
    }

    pub fn rotate_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<(), CredentialError> {
        let password_hash = hash_password(new_password)?;

        let write_txn = self.db.begin_write().map_err(StoreError::from_err)?;
        {
            let mut admins = write_txn
                .open_table(ADMINS_TABLE)
                .map_err(StoreError::from_err)?;

            let mut record = match admins.get(username).map_err(StoreError::from_err)? {
                Some(bytes) => decode(bytes.value())?,
                None => return Err(CredentialError::NotFound),
            };
            record.password_hash = password_hash;

            let bytes = serde_json::to_vec(&record).map_err(StoreError::from_err)?;
            admins
                .insert(username, bytes.as_slice())
                .map_err(StoreError::from_err)?;
        }
        write_txn.commit().map_err(StoreError::from_err)?;
        Ok(())
    }

    /// Replace the bearer token, re-pointing the lookup table in the same
    /// transaction. The old token stops validating as soon as this commits.
    pub fn rotate_token(&self, username: &str, new_token: &str) -> Result<(), CredentialError> {
        let write_txn = self.db.begin_write().map_err(StoreError::from_err)?;
        {
            let mut admins = write_txn
                .open_table(ADMINS_TABLE)
                .map_err(StoreError::from_err)?;
            let mut tokens = write_txn
                .open_table(TOKENS_TABLE)
                .map_err(StoreError::from_err)?;

            let mut record = match admins.get(username).map_err(StoreError::from_err)? {
                Some(bytes) => decode(bytes.value())?,
                None => return Err(CredentialError::NotFound),
            };

            if let Some(owner) = tokens.get(new_token).map_err(StoreError::from_err)? {
                if owner.value() != username {
                    return Err(CredentialError::DuplicateToken);
                }
            }

            tokens
                .remove(record.token.as_str())
                .map_err(StoreError::from_err)?;
            tokens
                .insert(new_token, username)
                .map_err(StoreError::from_err)?;

            record.token = new_token.to_string();
            let bytes = serde_json::to_vec(&record).map_err(StoreError::from_err)?;
            admins
                .insert(username, bytes.as_slice())
                .map_err(StoreError::from_err)?;
        }
        write_txn.commit().map_err(StoreError::from_err)?;
        Ok(())
    }

    pub fn admin_exists(&self) -> Result<bool, CredentialError> {
        let read_txn = self.db.begin_read().map_err(StoreError::from_err)?;
        let admins = read_txn
            .open_table(ADMINS_TABLE)
            .map_err(StoreError::from_err)?;
        let mut iter = admins.iter().map_err(StoreError::from_err)?;
        let exists = iter.next().is_some();
        Ok(exists)
    }

    fn fetch(&self, username: &str) -> Result<Option<AdminCredential>, CredentialError> {
        let read_txn = self.db.begin_read().map_err(StoreError::from_err)?;
        let admins = read_txn
            .open_table(ADMINS_TABLE)
            .map_err(StoreError::from_err)?;

        match admins.get(username).map_err(StoreError::from_err)? {
            Some(bytes) => Ok(Some(decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn persist(&self, record: &AdminCredential) -> Result<(), CredentialError> {
        let bytes = serde_json::to_vec(record).map_err(StoreError::from_err)?;

        let write_txn = self.db.begin_write().map_err(StoreError::from_err)?;
        {
            let mut admins = write_txn
                .open_table(ADMINS_TABLE)
                .map_err(StoreError::from_err)?;
            admins
                .insert(record.username.as_str(), bytes.as_slice())
                .map_err(StoreError::from_err)?;
        }
        write_txn.commit().map_err(StoreError::from_err)?;
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<AdminCredential, CredentialError> {
    serde_json::from_slice(bytes).map_err(|err| StoreError::from_err(err).into())
}

fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| CredentialError::Hash(err.to_string()))?;
    Ok(hash.to_string())
}

fn verify_password(expected_hash: &str, candidate: &str) -> Result<bool, CredentialError> {
    let parsed =
        PasswordHash::new(expected_hash).map_err(|err| CredentialError::Hash(err.to_string()))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(err) => Err(CredentialError::Hash(err.to_string())),
    }
}
