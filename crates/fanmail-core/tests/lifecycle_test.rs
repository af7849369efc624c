//! Key lifecycle against the reference key directory.
//!
//! Rotation must be idempotent while the key is fresh, rotate exactly once
//! when stale, leave the store untouched when registration fails, and
//! serialize concurrent callers.

use std::{collections::BTreeSet, time::Duration};

use fanmail_core::{ChaoticKeyStore, KeyStatus, KeyStore, LifecycleError, MemoryKeyStore};
use fanmail_harness::World;
use fanmail_proto::{Alias, LookupRequest};

const MAX_AGE: Duration = Duration::from_secs(3600);

fn alias(name: &str) -> Alias {
    Alias::new(name).unwrap()
}

#[tokio::test]
async fn fresh_key_makes_second_call_a_noop() {
    let mut world = World::new(31);
    let alice = world.device("alice").unwrap();
    let manager = alice.lifecycle();

    let first = manager.ensure_fresh_key(MAX_AGE).await.unwrap();
    let second = manager.ensure_fresh_key(MAX_AGE).await.unwrap();

    assert!(matches!(first, KeyStatus::Rotated { previous: None, .. }));
    assert_eq!(second, KeyStatus::Fresh { key_id: first.current() });
    assert_eq!(alice.store.all_key_ids().unwrap().len(), 1);
    assert_eq!(world.directory().history(&alias("alice")).len(), 1);
}

#[tokio::test]
async fn stale_key_rotates_exactly_once() {
    let mut world = World::new(32);
    let alice = world.device("alice").unwrap();
    let manager = alice.lifecycle();
    let old = manager.ensure_fresh_key(MAX_AGE).await.unwrap().current();

    // created_at = now - max_age - 1
    world.env().advance(MAX_AGE + Duration::from_millis(1));

    let status = manager.ensure_fresh_key(MAX_AGE).await.unwrap();
    let KeyStatus::Rotated { previous, current } = status else {
        panic!("expected rotation, got {status:?}");
    };
    assert_eq!(previous, Some(old));
    assert_ne!(current, old);

    assert_eq!(manager.ensure_fresh_key(MAX_AGE).await.unwrap(), KeyStatus::Fresh {
        key_id: current
    });
    assert_eq!(alice.store.all_key_ids().unwrap(), BTreeSet::from([old, current]));

    // The directory now serves only the new key for this device
    let response = world.directory().lookup(&LookupRequest { subject: alias("alice") });
    assert_eq!(response.entries.len(), 1);
    assert_eq!(response.entries[0].key_id, current);
}

#[tokio::test]
async fn failed_registration_leaves_store_unchanged() {
    let mut world = World::new(33);
    let alice = world.device("alice").unwrap();
    let manager = alice.lifecycle();
    let old = manager.ensure_fresh_key(MAX_AGE).await.unwrap().current();
    world.env().advance(MAX_AGE * 2);

    alice.directory.register.set_failing(true);
    let result = manager.ensure_fresh_key(MAX_AGE).await;

    assert!(matches!(result, Err(LifecycleError::RotationFailed(_))));
    assert_eq!(alice.store.latest().unwrap().unwrap().key_id, old);
    assert_eq!(alice.store.all_key_ids().unwrap(), BTreeSet::from([old]));

    // Retry starts from the same stale state and succeeds once the directory is back
    alice.directory.register.set_failing(false);
    let status = manager.ensure_fresh_key(MAX_AGE).await.unwrap();
    assert!(matches!(status, KeyStatus::Rotated { previous: Some(p), .. } if p == old));
}

#[tokio::test]
async fn first_rotation_failure_leaves_no_key() {
    let mut world = World::new(34);
    let alice = world.device("alice").unwrap();
    alice.directory.register.set_failing(true);

    let result = alice.lifecycle().ensure_fresh_key(MAX_AGE).await;

    assert!(result.unwrap_err().is_transient());
    assert!(alice.store.latest().unwrap().is_none());
}

#[tokio::test]
async fn concurrent_callers_rotate_once() {
    let mut world = World::new(35);
    let alice = world.device("alice").unwrap();
    let manager = alice.lifecycle();
    let other = manager.clone();

    let (a, b) =
        tokio::join!(manager.ensure_fresh_key(MAX_AGE), other.ensure_fresh_key(MAX_AGE));
    let (a, b) = (a.unwrap(), b.unwrap());

    let rotations = [a, b].iter().filter(|s| matches!(s, KeyStatus::Rotated { .. })).count();
    assert_eq!(rotations, 1);
    assert_eq!(a.current(), b.current());
    assert_eq!(alice.store.all_key_ids().unwrap().len(), 1);
    assert_eq!(alice.directory.register.calls(), 1);
}

#[tokio::test]
async fn independent_managers_on_one_store_rotate_once() {
    let mut world = World::new(36);
    let alice = world.device("alice").unwrap();
    let first_tab = alice.lifecycle();
    let second_tab = alice.lifecycle();
    let initial = first_tab.ensure_fresh_key(MAX_AGE).await.unwrap().current();

    world.env().advance(MAX_AGE);
    let (a, b) =
        tokio::join!(first_tab.ensure_fresh_key(MAX_AGE), second_tab.ensure_fresh_key(MAX_AGE));
    let (a, b) = (a.unwrap(), b.unwrap());

    let rotations = [a, b].iter().filter(|s| matches!(s, KeyStatus::Rotated { .. })).count();
    assert_eq!(rotations, 1);
    assert_eq!(a.current(), b.current());
    assert_ne!(a.current(), initial);
    assert_eq!(alice.store.all_key_ids().unwrap(), BTreeSet::from([initial, a.current()]));
    assert_eq!(alice.directory.register.calls(), 2);
}

#[tokio::test]
async fn prune_never_removes_latest() {
    let mut world = World::new(36);
    let alice = world.device("alice").unwrap();
    let manager = alice.lifecycle();

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(manager.ensure_fresh_key(MAX_AGE).await.unwrap().current());
        world.env().advance(MAX_AGE);
    }

    let removed = manager.prune(Duration::ZERO).await.unwrap();

    assert_eq!(removed.into_iter().collect::<BTreeSet<_>>(), BTreeSet::from([ids[0], ids[1]]));
    assert_eq!(alice.store.all_key_ids().unwrap(), BTreeSet::from([ids[2]]));
    assert!(manager.prune(Duration::ZERO).await.unwrap().is_empty());
}

#[tokio::test]
async fn prune_respects_retention_age() {
    let mut world = World::new(37);
    let alice = world.device("alice").unwrap();
    let manager = alice.lifecycle();

    let old = manager.ensure_fresh_key(MAX_AGE).await.unwrap().current();
    world.env().advance(MAX_AGE);
    manager.ensure_fresh_key(MAX_AGE).await.unwrap();

    // old is exactly MAX_AGE old
    assert!(manager.prune(MAX_AGE * 2).await.unwrap().is_empty());
    assert_eq!(manager.prune(MAX_AGE).await.unwrap(), vec![old]);
}

#[tokio::test]
async fn chaotic_storage_never_holds_unregistered_keys() {
    let mut world = World::new(38);
    let store = ChaoticKeyStore::with_seed(MemoryKeyStore::new(), 0.3, 0xC0FFEE);

    // Identity creation may itself hit an injected failure
    let alice = loop {
        if let Ok(device) = world.device_with_store("alice", store.clone()) {
            break device;
        }
    };
    let manager = alice.lifecycle();

    let mut successes = 0;
    for _ in 0..40 {
        match manager.ensure_fresh_key(MAX_AGE).await {
            Ok(_) => successes += 1,
            Err(err) => assert!(matches!(err, LifecycleError::Storage(_))),
        }
        world.env().advance(MAX_AGE);
    }
    assert!(successes > 0);

    // Every locally held key was registered before it was persisted
    let published: BTreeSet<_> =
        world.directory().history(&alias("alice")).into_iter().map(|e| e.key_id).collect();
    let held = store.inner().all_key_ids().unwrap();
    assert!(held.is_subset(&published));
}
