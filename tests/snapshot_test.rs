//! Tests for JSON snapshot persistence

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use pagetree::config::Settings;
use pagetree::domain::{GateState, UserId, VisitStatus};
use pagetree::infrastructure::di::ServiceContainer;
use pagetree::infrastructure::{InfraError, StoreSnapshot};
use pagetree::util::testing;

fn settings_at(path: &Path) -> Settings {
    Settings {
        store_path: path.to_path_buf(),
        ..Settings::default()
    }
}

#[test]
fn given_missing_snapshot_when_loading_then_empty_store() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();

    let c = ServiceContainer::load(settings_at(&dir.path().join("store.json"))).unwrap();

    assert!(c.hierarchy.list().is_empty());
}

#[test]
fn given_saved_store_when_loading_then_ids_blocks_and_progress_survive() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("store.json");
    let user = UserId::known("alice");

    let (hierarchy, intro, outro) = {
        let c = ServiceContainer::load(settings_at(&path)).unwrap();
        let h = c.hierarchy.create_hierarchy("Course", "/course/").unwrap();
        let root = c.hierarchy.root(h).unwrap();
        let intro = c.hierarchy.add_child(root, "Intro", None).unwrap();
        let outro = c.hierarchy.add_child(root, "Outro", None).unwrap();
        c.hierarchy.set_unlocked(outro, true).unwrap();
        c.hierarchy
            .append_block(intro, "welcome", "", "text", &json!({"body": "Hello"}))
            .unwrap();
        c.gating
            .visit(&user, intro, true, VisitStatus::Complete)
            .unwrap();
        c.save().unwrap();
        (h, intro, outro)
    };

    let c = ServiceContainer::load(settings_at(&path)).unwrap();

    assert_eq!(c.hierarchy.resolve("course").unwrap(), hierarchy);
    assert_eq!(c.hierarchy.resolve_section(hierarchy, "intro").unwrap(), intro);
    assert!(c.gating.unlocked(outro).unwrap());
    let blocks = c.hierarchy.blocks(intro).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].context.get("body").map(String::as_str), Some("Hello"));
    assert_eq!(c.gating.gate_state(&user, intro).unwrap(), GateState::Visited);
    assert_eq!(c.gating.user_location(&user, hierarchy).unwrap(), intro);
    assert_eq!(
        c.gating.visits(&user, hierarchy).unwrap()[0].status,
        VisitStatus::Complete
    );
}

#[test]
fn given_lowered_slug_limit_when_loading_then_existing_slugs_kept() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");

    let (hierarchy, section) = {
        let c = ServiceContainer::load(settings_at(&path)).unwrap();
        let h = c.hierarchy.create_hierarchy("Course", "/").unwrap();
        let root = c.hierarchy.root(h).unwrap();
        let s = c
            .hierarchy
            .add_child(root, "Introduction to the material", None)
            .unwrap();
        c.save().unwrap();
        (h, s)
    };

    let narrow = Settings {
        slug_max_length: 10,
        ..settings_at(&path)
    };
    let c = ServiceContainer::load(narrow).unwrap();

    assert_eq!(
        c.hierarchy
            .resolve_section(hierarchy, "introduction-to-the-material")
            .unwrap(),
        section
    );
    let root = c.hierarchy.root(hierarchy).unwrap();
    let added = c.hierarchy.add_child(root, "Another long label", None).unwrap();
    assert_eq!(
        c.hierarchy.resolve_section(hierarchy, "another-lo").unwrap(),
        added
    );
}

#[test]
fn given_save_when_writing_then_only_snapshot_file_remains() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let c = ServiceContainer::load(settings_at(&path)).unwrap();
    c.hierarchy.create_hierarchy("Course", "/").unwrap();

    c.save().unwrap();
    c.save().unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("store.json")]);
    let snapshot: StoreSnapshot =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.hierarchies.len(), 1);
    assert!(snapshot.hierarchies[0].id.is_some());
}

#[test]
fn given_unknown_version_when_loading_then_error() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, r#"{"version": 99, "hierarchies": []}"#).unwrap();

    let result = ServiceContainer::load(settings_at(&path));

    assert!(result.is_err());
}

#[test]
fn given_corrupt_snapshot_when_loading_then_serialization_error() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{ corrupt").unwrap();

    let result = ServiceContainer::load(settings_at(&path));

    assert!(matches!(result, Err(InfraError::Serialization { .. })));
}
