//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Layers: defaults → global file → local file → `PAGETREE_*` env vars.
//! Each layer only replaces the keys it specifies.
//!
//! Note: these tests use temp files only and never touch the real global config.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use pagetree::application::ApplicationError;
use pagetree::config::{local_config_path, Settings};
use pagetree::domain::DEFAULT_SLUG_MAX_LENGTH;

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn given_no_files_when_load_from_then_defaults() {
    let settings = Settings::load_from(None, None).expect("load settings");

    assert_eq!(settings.slug_max_length, DEFAULT_SLUG_MAX_LENGTH);
    assert!(settings.cache.enabled);
    assert!(settings.gating.enforce);
    assert!(settings.store_path.ends_with("pagetree.json"));
}

#[test]
fn given_global_and_local_when_load_from_then_local_wins_per_key() {
    let dir = TempDir::new().unwrap();
    let global = write_config(
        &dir,
        "global.toml",
        r#"
slug_max_length = 30

[cache]
enabled = false

[gating]
enforce = false
"#,
    );
    let local = write_config(
        &dir,
        "local.toml",
        r#"
[gating]
enforce = true
"#,
    );

    let settings = Settings::load_from(Some(&global), Some(&local)).expect("load settings");

    assert_eq!(settings.slug_max_length, 30, "global value survives");
    assert!(!settings.cache.enabled, "global value survives");
    assert!(settings.gating.enforce, "local overrides global");
}

#[test]
fn given_store_path_with_tilde_when_load_from_then_expanded() {
    let dir = TempDir::new().unwrap();
    let local = write_config(&dir, "local.toml", r#"store_path = "~/tree.json""#);

    let settings = Settings::load_from(None, Some(&local)).expect("load settings");

    assert!(!settings.store_path.starts_with("~"));
    assert!(settings.store_path.ends_with("tree.json"));
}

#[test]
fn given_zero_slug_length_when_load_from_then_config_error() {
    let dir = TempDir::new().unwrap();
    let local = write_config(&dir, "local.toml", "slug_max_length = 0");

    let result = Settings::load_from(None, Some(&local));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_invalid_toml_when_load_from_then_config_error() {
    let dir = TempDir::new().unwrap();
    let local = write_config(&dir, "local.toml", "slug_max_length = [");

    let result = Settings::load_from(None, Some(&local));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_missing_explicit_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = Settings::load(Some(&missing));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_settings_when_rendering_toml_then_reloads_identically() {
    let dir = TempDir::new().unwrap();
    let original = Settings::load_from(None, None).expect("load settings");
    let path = write_config(&dir, "roundtrip.toml", &original.to_toml().unwrap());

    let reloaded = Settings::load_from(None, Some(&path)).expect("reload settings");

    assert_eq!(reloaded, original);
}

#[test]
fn given_template_when_parsing_then_valid_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "template.toml", &Settings::template());

    assert!(Settings::load_from(None, Some(&path)).is_ok());
}

#[test]
fn given_directory_when_local_config_path_then_dotfile() {
    let dir = TempDir::new().unwrap();

    assert_eq!(local_config_path(dir.path()), dir.path().join(".pagetree.toml"));
}
