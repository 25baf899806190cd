//! Integration tests for the persisted stores: settings lifecycle over the
//! durability log and the admin credential lifecycle.

use std::sync::Arc;
use std::thread;

use quotes_api::settings::{SettingValue, SettingsCache, SettingsError};
use quotes_api::store::{CredentialError, CredentialStore, Database, SettingsStore};
use tempfile::NamedTempFile;

fn open_db() -> (NamedTempFile, Database) {
    let file = NamedTempFile::new().expect("temp file");
    let db = Database::open(file.path()).expect("open database");
    (file, db)
}

#[test]
fn settings_set_get_overwrite_delete_cycle() {
    let (_file, db) = open_db();
    let cache = SettingsCache::bootstrap(SettingsStore::new(&db)).expect("bootstrap");

    cache.set("k", "v").expect("set");
    assert_eq!(cache.get("k").unwrap(), SettingValue::Str("v".to_string()));

    cache.set("k", "v2").expect("overwrite");
    assert_eq!(cache.get("k").unwrap(), SettingValue::Str("v2".to_string()));

    cache.delete("k").expect("delete");
    assert!(matches!(cache.get("k"), Err(SettingsError::KeyNotFound(_))));
    assert!(matches!(
        cache.delete("k"),
        Err(SettingsError::KeyNotFound(_))
    ));
}

#[test]
fn settings_delete_of_never_set_key_fails() {
    let (_file, db) = open_db();
    let cache = SettingsCache::bootstrap(SettingsStore::new(&db)).expect("bootstrap");

    assert!(matches!(
        cache.delete("never.was"),
        Err(SettingsError::KeyNotFound(_))
    ));
}

#[test]
fn concurrent_sets_on_distinct_keys_keep_snapshots_consistent() {
    let (_file, db) = open_db();
    let cache = Arc::new(SettingsCache::bootstrap(SettingsStore::new(&db)).expect("bootstrap"));

    let mut handles = Vec::new();
    for worker in 0..8 {
        let cache = cache.clone();
        handles.push(thread::spawn(move || {
            for round in 0..10 {
                let key = format!("worker{worker}.round{round}");
                cache.set(&key, "done").expect("concurrent set");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let snapshot = cache.get_all();
    for worker in 0..8 {
        for round in 0..10 {
            let key = format!("worker{worker}.round{round}");
            assert_eq!(
                snapshot.get(&key),
                Some(&SettingValue::Str("done".to_string())),
                "missing or corrupt entry for {key}"
            );
        }
    }
    // unrelated bootstrap defaults are untouched
    assert_eq!(
        snapshot.get("rate.enabled"),
        Some(&SettingValue::Bool(true))
    );
}

#[test]
fn settings_survive_restart_via_backing_store() {
    let (_file, db) = open_db();

    {
        let cache = SettingsCache::bootstrap(SettingsStore::new(&db)).expect("first boot");
        cache.set("server.cors_origins", "https://example.com").unwrap();
        cache.set("custom.flag", "true").unwrap();
    }

    let cache = SettingsCache::bootstrap(SettingsStore::new(&db)).expect("second boot");
    assert_eq!(
        cache.get_list("server.cors_origins").unwrap(),
        vec!["https://example.com"]
    );
    assert!(cache.get_bool("custom.flag").unwrap());
}

#[test]
fn admin_lifecycle_create_validate_rotate() {
    let (_file, db) = open_db();
    let store = CredentialStore::new(&db);

    assert!(!store.admin_exists().unwrap());
    store
        .create_admin("admin", "correct horse", "token-1")
        .expect("create admin");
    assert!(store.admin_exists().unwrap());

    // password validation succeeds and stamps last_login
    let admin = store
        .validate_credentials("admin", "correct horse")
        .expect("valid credentials");
    assert_eq!(admin.username, "admin");
    assert!(admin.last_login.is_some());

    // the stamp is persisted
    let again = store
        .validate_credentials("admin", "correct horse")
        .expect("valid credentials");
    assert!(again.last_login.is_some());

    // token validation
    let by_token = store.validate_token("token-1").expect("valid token");
    assert_eq!(by_token.username, "admin");

    // rotation revokes the old token atomically
    store.rotate_token("admin", "token-2").expect("rotate token");
    assert!(matches!(
        store.validate_token("token-1"),
        Err(CredentialError::InvalidToken)
    ));
    assert_eq!(store.validate_token("token-2").unwrap().username, "admin");

    // password rotation
    store
        .rotate_password("admin", "new passphrase")
        .expect("rotate password");
    assert!(matches!(
        store.validate_credentials("admin", "correct horse"),
        Err(CredentialError::InvalidCredentials)
    ));
    assert!(store
        .validate_credentials("admin", "new passphrase")
        .is_ok());
}

#[test]
fn wrong_password_and_unknown_user_fail_identically() {
    let (_file, db) = open_db();
    let store = CredentialStore::new(&db);
    store.create_admin("admin", "pw", "tok").unwrap();

    let wrong_password = store.validate_credentials("admin", "nope");
    let unknown_user = store.validate_credentials("ghost", "pw");

    assert!(matches!(
        wrong_password,
        Err(CredentialError::InvalidCredentials)
    ));
    assert!(matches!(
        unknown_user,
        Err(CredentialError::InvalidCredentials)
    ));
}

#[test]
fn duplicate_username_and_token_are_rejected() {
    let (_file, db) = open_db();
    let store = CredentialStore::new(&db);
    store.create_admin("admin", "pw", "tok").unwrap();

    assert!(matches!(
        store.create_admin("admin", "pw2", "tok2"),
        Err(CredentialError::DuplicateUsername)
    ));
    assert!(matches!(
        store.create_admin("other", "pw2", "tok"),
        Err(CredentialError::DuplicateToken)
    ));

    // the losing create left nothing behind
    assert!(matches!(
        store.validate_token("tok2"),
        Err(CredentialError::InvalidToken)
    ));
}

#[test]
fn rotate_for_unknown_username_fails() {
    let (_file, db) = open_db();
    let store = CredentialStore::new(&db);

    assert!(matches!(
        store.rotate_password("ghost", "pw"),
        Err(CredentialError::NotFound)
    ));
    assert!(matches!(
        store.rotate_token("ghost", "tok"),
        Err(CredentialError::NotFound)
    ));
}

#[test]
fn rotating_to_the_current_token_is_allowed() {
    let (_file, db) = open_db();
    let store = CredentialStore::new(&db);
    store.create_admin("admin", "pw", "tok").unwrap();

    store.rotate_token("admin", "tok").expect("no-op rotation");
    assert!(store.validate_token("tok").is_ok());
}
