//! First-run admin bootstrap.
//!
//! If no admin identity exists, one is created from configured values or
//! freshly generated secrets, and a human-readable credentials file is
//! written to the config directory for the operator. The file write is
//! best-effort; its failure never aborts startup.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::config::ServerConfig;
use crate::store::{CredentialError, CredentialStore};

/// Create the admin identity if none exists yet.
///
/// The check and the create both run against the store's serialized write
/// path; if a concurrent first launch still wins the race, the resulting
/// duplicate error is logged and treated as success — the store kept
/// exactly one admin.
pub fn ensure_admin(config: &ServerConfig, credentials: &CredentialStore) -> anyhow::Result<()> {
    if credentials.admin_exists()? {
        return Ok(());
    }

    let username = config
        .admin_user
        .clone()
        .unwrap_or_else(|| "administrator".to_string());
    let password = config
        .admin_password
        .clone()
        .unwrap_or_else(|| generate_secret(32));
    let token = config
        .admin_token
        .clone()
        .unwrap_or_else(|| generate_secret(48));

    match credentials.create_admin(&username, &password, &token) {
        Ok(_) => {
            tracing::info!(username = %username, "admin account created");
            match write_credentials_file(config, &username, &token) {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "admin credentials saved");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to save admin credentials file");
                }
            }
        }
        Err(CredentialError::DuplicateUsername | CredentialError::DuplicateToken) => {
            tracing::warn!("admin already created by a concurrent launch");
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

/// Random alphanumeric secret of the given length.
pub fn generate_secret(length: usize) -> String {
    let mut rng = rand::rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

fn write_credentials_file(
    config: &ServerConfig,
    username: &str,
    token: &str,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(&config.config_dir)?;

    let base_url = config.base_url();
    let content = format!(
        "Quotes API - ADMIN CREDENTIALS\n\
         ========================================\n\
         API ACCESS:\n\
         \x20 URL:      {base_url}/api/v1/admin\n\
         \x20 Header:   Authorization: Bearer {token}\n\
         \n\
         CREDENTIALS:\n\
         \x20 Username: {username}\n\
         \x20 Token:    {token}\n\
         \n\
         Created: {created}\n\
         ========================================\n",
        created = Utc::now().format("%Y-%m-%d %H:%M:%S"),
    );

    let path = config.config_dir.join("admin-credentials.txt");
    fs::write(&path, content)?;
    Ok(path)
}
