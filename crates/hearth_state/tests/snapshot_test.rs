//! # Snapshot Round-Trip Tests
//!
//! A snapshot written to disk and read back reproduces the key set, the tag
//! sets and the relation graph.

use hearth_domain::{vocab, EntityKey, Relation, Semantics, Subpart};
use hearth_state::{
    BoundingBox, GeometryBackend, ObjectSpec, ProxyGeometry, SceneState, StateError,
};

fn temp_state_path() -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_solve_state_{id}.json"))
}

fn furnished_state() -> SceneState {
    let mut geo = ProxyGeometry::new();
    let mut state = SceneState::new();

    let kitchen = state.next_key("kitchen");
    let handle = geo.spawn_box("kitchen", BoundingBox::new([0.0; 3], [4.0, 3.0, 2.8]));
    state
        .insert(
            kitchen.clone(),
            ObjectSpec::new()
                .with_geometry(handle)
                .with_tags([Semantics::Room, Semantics::Kitchen]),
        )
        .unwrap();

    let table = state.next_key("table");
    state
        .insert(
            table.clone(),
            ObjectSpec::new()
                .with_tags([Semantics::Object, Semantics::Table])
                .with_relation(vocab::bottom_on_floor(), kitchen.clone()),
        )
        .unwrap();

    let cup = state.next_key("tableware");
    state
        .insert(
            cup,
            ObjectSpec::new()
                .with_tags([Semantics::Object, Semantics::Tableware])
                .with_tags([Subpart::Visible])
                .with_relation(vocab::bottom_on_top(), table)
                .with_relation(Relation::Touching, kitchen),
        )
        .unwrap();
    state
}

#[test]
fn test_snapshot_round_trip_in_memory() {
    let state = furnished_state();
    let snapshot = state.snapshot();
    let restored = SceneState::from_snapshot(&snapshot).unwrap();

    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(restored.len(), 3);
    for (key, spec) in state.iter() {
        let other = restored.get(key).unwrap();
        assert_eq!(other.tags, spec.tags);
        assert_eq!(other.relations, spec.relations);
        assert!(other.geometry.is_none());
    }
}

#[test]
fn test_snapshot_round_trip_through_json() {
    let path = temp_state_path();
    let state = furnished_state();
    state.write_json(&path).unwrap();

    let restored = SceneState::read_json(&path).unwrap();
    assert_eq!(restored.snapshot(), state.snapshot());
    assert_eq!(
        restored.parents_of(&EntityKey::new("tableware_0002")),
        vec![EntityKey::new("table_0001"), EntityKey::new("kitchen_0000")]
    );

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_removed_keys_stay_retired_after_reload() {
    let path = temp_state_path();
    let mut state = furnished_state();
    let cup = EntityKey::new("tableware_0002");
    state.remove(&cup).unwrap();
    state.write_json(&path).unwrap();

    let mut restored = SceneState::read_json(&path).unwrap();
    assert!(matches!(
        restored.insert(cup.clone(), ObjectSpec::new().with_tags([Semantics::Object])),
        Err(StateError::DuplicateKey(key)) if key == cup
    ));
    assert_eq!(restored.next_key("tableware"), EntityKey::new("tableware_0003"));

    let mut malformed = restored.snapshot();
    malformed.retired.insert(EntityKey::new("kitchen_0000"));
    assert!(SceneState::from_snapshot(&malformed).is_err());

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_read_missing_file_reports_path() {
    let path = temp_state_path();
    let err = SceneState::read_json(&path).unwrap_err();
    assert!(err.to_string().contains("snapshot io failed"));
}
