//! Append-only request log for observability.
//!
//! Rows are written best-effort from the logging middleware and read by
//! nothing in the serving path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::{StoreError, REQUEST_LOG_TABLE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub endpoint: String,
    pub method: String,
    pub ip_address: String,
    pub user_agent: String,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RequestLogStore {
    db: Arc<redb::Database>,
}

impl RequestLogStore {
    pub fn new(db: &super::Database) -> Self {
        Self { db: db.handle() }
    }

    pub fn append(&self, entry: &RequestLogEntry) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(entry).map_err(StoreError::from_err)?;

        let write_txn = self.db.begin_write().map_err(StoreError::from_err)?;
        {
            let mut table = write_txn
                .open_table(REQUEST_LOG_TABLE)
                .map_err(StoreError::from_err)?;
            let next = table
                .last()
                .map_err(StoreError::from_err)?
                .map(|(key, _)| key.value() + 1)
                .unwrap_or(1);
            table
                .insert(next, bytes.as_slice())
                .map_err(StoreError::from_err)?;
        }
        write_txn.commit().map_err(StoreError::from_err)?;
        Ok(())
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::from_err)?;
        let table = read_txn
            .open_table(REQUEST_LOG_TABLE)
            .map_err(StoreError::from_err)?;
        Ok(table.iter().map_err(StoreError::from_err)?.count() as u64)
    }
}
