//! End-to-end usage of a one-to-many map: unique usernames on the left,
//! shared group ids on the right.

use nexus_bimap::{BiMap, ConflictPolicy, Error, Relations, Right, SideConfig, SideId, SideKind};

type Members = BiMap<String, i32>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn members() -> Members {
    BiMap::new(SideConfig::unique_ordered(), SideConfig::multi_hashed())
}

fn names_in(map: &Members, group: i32) -> Vec<String> {
    map.right().find(&group).map(|e| e.value().clone()).collect()
}

// =============================================================================
// Insert, reject, erase
// =============================================================================

#[test]
fn duplicate_username_is_rejected() {
    init_logging();
    let mut map = members();

    map.insert("alice".into(), 1).unwrap();
    map.insert("bob".into(), 1).unwrap();
    let err = map.insert("alice".into(), 2).unwrap_err();

    assert_eq!(err, Error::DuplicateKey { side: SideId::Left });
    assert_eq!(map.len(), 2);
    assert_eq!(names_in(&map, 1), vec!["alice".to_string(), "bob".to_string()]);
    assert_eq!(map.right().count(&2), 0);
    assert!(map.check_invariants());
}

#[test]
fn erase_by_left_key_is_visible_from_right() {
    init_logging();
    let mut map = members();
    map.insert("alice".into(), 1).unwrap();
    map.insert("bob".into(), 1).unwrap();

    assert_eq!(map.left_mut().erase(&"alice".to_string()), 1);

    assert_eq!(map.len(), 1);
    assert_eq!(names_in(&map, 1), vec!["bob".to_string()]);
    assert!(map.check_invariants());
}

#[test]
fn erase_group_from_right() {
    init_logging();
    let mut map = members();
    for (name, group) in [("alice", 1), ("bob", 2), ("carol", 1), ("dave", 3)] {
        map.insert(name.into(), group).unwrap();
    }

    assert_eq!(map.right_mut().erase(&1), 2);
    let left: Vec<_> = map.left().iter().map(|e| e.key().clone()).collect();
    assert_eq!(left, vec!["bob".to_string(), "dave".to_string()]);
    assert_eq!(map.right_mut().erase(&1), 0);
}

// =============================================================================
// Moving members between groups
// =============================================================================

#[test]
fn move_member_between_groups() {
    init_logging();
    let mut map = members();
    let alice = map.insert("alice".into(), 1).unwrap();
    map.insert("bob".into(), 2).unwrap();

    assert_eq!(map.right_mut().rebind(alice, 2), Ok(1));

    assert_eq!(map.right().count(&1), 0);
    assert_eq!(map.right().count(&2), 2);
    assert_eq!(
        map.left().get(&"alice".to_string()).map(|e| *e.value()),
        Some(2)
    );
    assert!(map.contains(alice));
    assert!(map.check_invariants());
}

#[test]
fn rename_member() {
    init_logging();
    let mut map = members();
    let alice = map.insert_with("alice".into(), 1, ()).unwrap();
    map.insert("bob".into(), 1).unwrap();

    assert_eq!(
        map.rebind_left(alice, "bob".into()),
        Err(Error::DuplicateKey { side: SideId::Left })
    );
    assert_eq!(map.rebind_left(alice, "ann".into()), Ok("alice".to_string()));

    let first = map.left().first().map(|e| e.key().clone());
    assert_eq!(first, Some("ann".to_string()));
    assert_eq!(map.payload(alice), Some(&()));
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn range_over_usernames() {
    let mut map = members();
    for (name, group) in [("alice", 1), ("bob", 2), ("carol", 3), ("dave", 4), ("erin", 5)] {
        map.insert(name.into(), group).unwrap();
    }

    let b = "b".to_string();
    let d = "d".to_string();
    let groups: Vec<_> = map
        .left()
        .range(
            core::ops::Bound::Included(&b),
            core::ops::Bound::Excluded(&d),
        )
        .unwrap()
        .map(|e| *e.value())
        .collect();
    assert_eq!(groups, vec![2, 3]);

    // The right side is hashed, so it has no order to range over.
    assert!(matches!(
        map.right()
            .range(core::ops::Bound::Unbounded, core::ops::Bound::Unbounded),
        Err(Error::Unsupported {
            side: SideId::Right,
            kind: SideKind::MultiHashed,
            ..
        })
    ));
}

#[test]
fn project_from_right_lookup_to_creation_order() {
    let mut map = members();
    map.insert("carol".into(), 7).unwrap();
    let bob = map.insert("bob".into(), 8).unwrap();
    map.insert("alice".into(), 9).unwrap();

    let hit = map.right().get(&8).unwrap();
    assert_eq!(hit.handle(), bob);

    let mut cursor = map.project::<Relations>(hit.handle()).unwrap();
    cursor.move_next();
    assert_eq!(cursor.relation().map(|r| r.left().as_str()), Some("alice"));

    // Back onto the right side, landing where we started.
    let back = map.project::<Right>(bob).unwrap();
    assert_eq!(back.key(), Some(&8));
}

// =============================================================================
// Bounded cache
// =============================================================================

#[test]
fn bounded_evicting_session_table() {
    init_logging();
    let mut sessions: BiMap<u64, String> =
        BiMap::builder(SideConfig::unique_hashed(), SideConfig::unique_ordered())
            .max_len(2)
            .on_conflict(ConflictPolicy::Evict)
            .build();

    sessions.insert(1, "alice".into()).unwrap();
    sessions.insert(2, "bob".into()).unwrap();

    // Same user logs in again: the old session is evicted.
    sessions.insert(3, "alice".into()).unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(!sessions.left().contains_key(&1));
    assert_eq!(
        sessions.right().get(&"alice".to_string()).map(|e| *e.value()),
        Some(3)
    );

    // A brand new user with no conflict does not fit.
    assert_eq!(
        sessions.insert(4, "carol".into()),
        Err(Error::CapacityExceeded { max: 2 })
    );
    assert!(sessions.check_invariants());
}

#[test]
fn bulk_load_is_all_or_nothing() {
    init_logging();
    let err = Members::from_relations(
        SideConfig::unique_ordered(),
        SideConfig::multi_hashed(),
        [("alice".to_string(), 1), ("bob".to_string(), 1), ("alice".to_string(), 2)],
    )
    .unwrap_err();
    assert_eq!(err.position, 2);
    assert_eq!(err.error, Error::DuplicateKey { side: SideId::Left });

    let map = Members::from_relations(
        SideConfig::unique_ordered(),
        SideConfig::multi_hashed(),
        [("alice".to_string(), 1), ("bob".to_string(), 1)],
    )
    .unwrap();
    assert_eq!(map.len(), 2);
}
