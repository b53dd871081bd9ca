//! Integration tests for credential persistence.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tokenkeep::{
    CredentialStore, Credentials, DEFAULT_STORE_KEY, MemoryStore, SecureStorage, create_store,
};

fn bundles() -> Vec<Credentials> {
    vec![
        Credentials::new("access-only"),
        Credentials::new("with-refresh").with_refresh_token("R1"),
        Credentials::new("full")
            .with_token_type("DPoP")
            .with_id_token("eyJhbGciOi.id.token")
            .with_refresh_token("R2")
            .with_expiry(Utc.with_ymd_and_hms(2031, 1, 2, 3, 4, 5).unwrap())
            .with_scope("openid offline_access"),
        Credentials::new("sub-second").expires_in(Duration::milliseconds(1234)),
        Credentials::new("unicode ✓ token").with_refresh_token("r\u{e9}fresh"),
    ]
}

#[test]
fn test_round_trip_preserves_every_field() {
    let store = CredentialStore::new(MemoryStore::new());

    for bundle in bundles() {
        assert!(store.store(&bundle));
        assert_eq!(store.retrieve(), Some(bundle));
    }
}

#[test]
fn test_retrieve_is_idempotent() {
    let store = CredentialStore::new(MemoryStore::new());
    assert_eq!(store.retrieve(), store.retrieve());

    assert!(store.store(&bundles()[2]));
    let first = store.retrieve();
    let second = store.retrieve();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_store_holds_one_bundle_per_key() {
    let storage = Arc::new(MemoryStore::new());
    let store = CredentialStore::new(Arc::clone(&storage));

    for bundle in bundles() {
        assert!(store.store(&bundle));
    }

    assert_eq!(storage.len(), 1);
    assert!(storage.exists(DEFAULT_STORE_KEY).unwrap());
    assert_eq!(store.retrieve(), bundles().pop());
}

#[test]
fn test_bundle_written_by_one_store_read_by_another() {
    let storage = Arc::new(MemoryStore::new());
    let writer = CredentialStore::with_key(Arc::clone(&storage), "shared");
    let reader = CredentialStore::with_key(Arc::clone(&storage), "shared");

    let bundle = bundles().remove(2);
    assert!(writer.store(&bundle));
    assert_eq!(reader.retrieve(), Some(bundle));

    assert!(reader.clear());
    assert!(writer.retrieve().is_none());
}

#[test]
fn test_created_store_backs_credential_store() {
    let store = CredentialStore::new(create_store(false, "tokenkeep-it"));
    let bundle = bundles().remove(1);

    assert!(store.store(&bundle));
    assert_eq!(store.retrieve(), Some(bundle));
}

#[test]
fn test_keyring_preferring_store_round_trips() {
    let store = CredentialStore::with_key(create_store(true, "tokenkeep-it"), "round-trip");
    let bundle = bundles().remove(2);

    assert!(store.store(&bundle));
    assert_eq!(store.retrieve(), Some(bundle));
    assert!(store.clear());
    assert!(store.retrieve().is_none());
}
