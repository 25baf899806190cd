//! Runtime-tunable server settings.
//!
//! The cache is the typed authority over settings values; the redb-backed
//! [`SettingsStore`] is its durability log. Reads are served from memory
//! under a read lock; a write persists to the store first and only then
//! updates the map, both under the write lock, so a failed store write
//! leaves the cache untouched and a snapshot never observes half a write.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::RwLock;

use crate::store::{SettingsStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("setting not found: {0}")]
    KeyNotFound(String),

    #[error("setting {key} is not {expected}")]
    Type { key: String, expected: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Typed view of a setting. The backing store keeps plain strings; the type
/// is decided by shape when a value enters the cache, and extraction is
/// explicit and checked so a mismatched value fails that read with a typed
/// error instead of poisoning the whole cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    List(Vec<String>),
    Str(String),
}

impl SettingValue {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(value) = raw.parse::<i64>() {
            return Self::Int(value);
        }
        if raw.contains(',') {
            return Self::List(raw.split(',').map(|part| part.trim().to_string()).collect());
        }
        Self::Str(raw.to_string())
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::List(values) => write!(f, "{}", values.join(",")),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

pub struct SettingsCache {
    map: RwLock<HashMap<String, SettingValue>>,
    store: SettingsStore,
}

impl SettingsCache {
    /// Build the cache: defaults first, then every persisted row on top
    /// (the store is the source of truth across restarts).
    pub fn bootstrap(store: SettingsStore) -> Result<Self, SettingsError> {
        let mut map = defaults();
        for (key, value) in store.all()? {
            map.insert(key, SettingValue::parse(&value));
        }
        Ok(Self {
            map: RwLock::new(map),
            store,
        })
    }

    pub fn get(&self, key: &str) -> Result<SettingValue, SettingsError> {
        let map = self.map.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.get(key)
            .cloned()
            .ok_or_else(|| SettingsError::KeyNotFound(key.to_string()))
    }

    /// Upsert. Last writer wins; the store write happens before the map
    /// update so a store failure changes nothing in memory.
    pub fn set(&self, key: &str, raw: &str) -> Result<(), SettingsError> {
        let mut map = self.map.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.store.set(key, raw)?;
        map.insert(key.to_string(), SettingValue::parse(raw));
        Ok(())
    }

    /// Remove a key from both cache and store. Existence is judged against
    /// the cache, which also covers bootstrap defaults that were never
    /// persisted.
    pub fn delete(&self, key: &str) -> Result<(), SettingsError> {
        let mut map = self.map.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !map.contains_key(key) {
            return Err(SettingsError::KeyNotFound(key.to_string()));
        }
        self.store.delete(key)?;
        map.remove(key);
        Ok(())
    }

    /// Consistent snapshot of every setting.
    pub fn get_all(&self) -> BTreeMap<String, SettingValue> {
        let map = self.map.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, SettingsError> {
        match self.get(key)? {
            SettingValue::Bool(value) => Ok(value),
            _ => Err(SettingsError::Type {
                key: key.to_string(),
                expected: "a boolean",
            }),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64, SettingsError> {
        match self.get(key)? {
            SettingValue::Int(value) => Ok(value),
            _ => Err(SettingsError::Type {
                key: key.to_string(),
                expected: "an integer",
            }),
        }
    }

    /// A bare string counts as a one-element list so a single CORS origin
    /// round-trips through the string representation.
    pub fn get_list(&self, key: &str) -> Result<Vec<String>, SettingsError> {
        match self.get(key)? {
            SettingValue::List(values) => Ok(values),
            SettingValue::Str(value) => Ok(vec![value]),
            _ => Err(SettingsError::Type {
                key: key.to_string(),
                expected: "a list",
            }),
        }
    }
}

fn defaults() -> HashMap<String, SettingValue> {
    let mut map = HashMap::new();

    // CORS (default: allow all)
    map.insert("server.cors_enabled".to_string(), SettingValue::Bool(true));
    map.insert(
        "server.cors_origins".to_string(),
        SettingValue::Str("*".to_string()),
    );
    map.insert(
        "server.cors_methods".to_string(),
        SettingValue::List(
            ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ),
    );
    map.insert(
        "server.cors_headers".to_string(),
        SettingValue::List(
            ["Content-Type", "Authorization"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ),
    );
    map.insert(
        "server.cors_credentials".to_string(),
        SettingValue::Bool(false),
    );

    // Rate limiting (default: enabled; admin tier is the most restrictive)
    map.insert("rate.enabled".to_string(), SettingValue::Bool(true));
    map.insert("rate.global_rps".to_string(), SettingValue::Int(100));
    map.insert("rate.global_burst".to_string(), SettingValue::Int(200));
    map.insert("rate.api_rps".to_string(), SettingValue::Int(50));
    map.insert("rate.api_burst".to_string(), SettingValue::Int(100));
    map.insert("rate.admin_rps".to_string(), SettingValue::Int(10));
    map.insert("rate.admin_burst".to_string(), SettingValue::Int(20));

    map
}
