//! # Configuration Loading Tests
//!
//! Merging of named files, overrides, passthrough keys and the shipped
//! configs folder.

use std::fs;
use std::path::{Path, PathBuf};

use hearth::{ComposeConfig, ConfigError};
use hearth_domain::{Semantics, TagSet};

fn temp_configs(name: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("test_configs_{name}_{id}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

#[test]
fn test_later_files_and_overrides_win() {
    let dir = temp_configs("merge");
    fs::write(
        dir.join("a.toml"),
        "solve_steps_large = 10\nadd_bottle = false\n[render]\nsamples = 16\nexposure = 1.0\n",
    )
    .unwrap();
    fs::write(dir.join("b.toml"), "solve_steps_large = 20\n[render]\nsamples = 32\n").unwrap();

    let config = ComposeConfig::load(
        &dir,
        &names(&["a", "b.toml"]),
        &names(&["solve_steps_small=3", "restrict_parent_objs=[\"Table\", \"Desk\"]"]),
    )
    .unwrap();

    assert_eq!(config.solve_steps_large, 20);
    assert_eq!(config.solve_steps_small, 3);
    assert!(!config.add_bottle);

    let render = config.extra.get("render").and_then(toml::Value::as_table).unwrap();
    assert_eq!(render.get("samples"), Some(&toml::Value::Integer(32)));
    assert_eq!(render.get("exposure"), Some(&toml::Value::Float(1.0)));

    let restrictions = config.restrictions().unwrap();
    assert_eq!(
        restrictions.parent_objs,
        Some(TagSet::of([Semantics::Table, Semantics::Desk]))
    );
    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_missing_file_names_the_path() {
    let dir = temp_configs("missing");
    let err = ComposeConfig::load(&dir, &names(&["nowhere"]), &[]).unwrap_err();
    match err {
        ConfigError::Io { path, .. } => assert!(path.ends_with("nowhere.toml")),
        other => panic!("unexpected error: {other}"),
    }
    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_malformed_file_and_override() {
    let dir = temp_configs("malformed");
    fs::write(dir.join("bad.toml"), "solve_steps_large = = 3\n").unwrap();
    assert!(matches!(
        ComposeConfig::load(&dir, &names(&["bad"]), &[]),
        Err(ConfigError::Parse { .. })
    ));
    assert!(matches!(
        ComposeConfig::load(&dir, &[], &names(&["no_equals_sign"])),
        Err(ConfigError::Override(_))
    ));
    assert!(matches!(
        ComposeConfig::load(&dir, &[], &names(&["abort_unsatisfied_large=maybe"])),
        Err(ConfigError::Invalid(_))
    ));
    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_shipped_configs_load() {
    let folder = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");
    let base = ComposeConfig::load(&folder, &names(&["base"]), &[]).unwrap();
    assert!(base.add_bottle);
    assert!(base
        .stage_chances()
        .contains(&("lights_off".to_string(), 0.0)));

    let preview =
        ComposeConfig::load(&folder, &names(&["base", "fast_solve", "topview"]), &[]).unwrap();
    assert!(preview.topview);
    assert!(!preview.add_bottle);
    assert_eq!(preview.solve_max_rooms, Some(1));
    assert!(preview.solve_steps_large < base.solve_steps_large);
}
