//! Durability log for runtime settings.
//!
//! Values are persisted as raw strings alongside their update timestamp; the
//! in-memory [`SettingsCache`](crate::settings::SettingsCache) is the typed
//! authority and rebuilds itself from this store on startup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::{StoreError, SETTINGS_TABLE};

#[derive(Debug, Serialize, Deserialize)]
struct SettingRow {
    value: String,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SettingsStore {
    db: Arc<redb::Database>,
}

impl SettingsStore {
    pub fn new(db: &super::Database) -> Self {
        Self { db: db.handle() }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::from_err)?;
        let table = read_txn
            .open_table(SETTINGS_TABLE)
            .map_err(StoreError::from_err)?;

        match table.get(key).map_err(StoreError::from_err)? {
            Some(bytes) => {
                let row: SettingRow =
                    serde_json::from_slice(bytes.value()).map_err(StoreError::from_err)?;
                Ok(Some(row.value))
            }
            None => Ok(None),
        }
    }

    /// Upsert; refreshes the row's `updated_at`.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let row = SettingRow {
            value: value.to_string(),
            updated_at: Utc::now(),
        };
        let bytes = serde_json::to_vec(&row).map_err(StoreError::from_err)?;

        let write_txn = self.db.begin_write().map_err(StoreError::from_err)?;
        {
            let mut table = write_txn
                .open_table(SETTINGS_TABLE)
                .map_err(StoreError::from_err)?;
            table
                .insert(key, bytes.as_slice())
                .map_err(StoreError::from_err)?;
        }
        write_txn.commit().map_err(StoreError::from_err)?;
        Ok(())
    }

    /// Remove a key. Returns whether a row existed.
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write().map_err(StoreError::from_err)?;
        let existed = {
            let mut table = write_txn
                .open_table(SETTINGS_TABLE)
                .map_err(StoreError::from_err)?;
            let existed = table.remove(key).map_err(StoreError::from_err)?.is_some();
            existed
        };
        write_txn.commit().map_err(StoreError::from_err)?;
        Ok(existed)
    }

    /// Every persisted key/value pair.
    pub fn all(&self) -> Result<Vec<(String, String)>, StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::from_err)?;
        let table = read_txn
            .open_table(SETTINGS_TABLE)
            .map_err(StoreError::from_err)?;

        let mut rows = Vec::new();
        for item in table.iter().map_err(StoreError::from_err)? {
            let (key, bytes) = item.map_err(StoreError::from_err)?;
            let row: SettingRow =
                serde_json::from_slice(bytes.value()).map_err(StoreError::from_err)?;
            rows.push((key.value().to_string(), row.value));
        }
        Ok(rows)
    }
}
