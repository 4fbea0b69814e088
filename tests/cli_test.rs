//! End-to-end tests: parse a command line and run it against a temp snapshot

use std::path::Path;

use clap::Parser;
use tempfile::TempDir;

use pagetree::cli::{execute_command, Cli, CliError};
use pagetree::exitcode;
use pagetree::util::testing;

fn run(store: &Path, args: &[&str]) -> Result<i32, CliError> {
    let store = store.to_string_lossy().to_string();
    let mut argv = vec!["pagetree", "--store", store.as_str()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("valid command line");
    execute_command(&cli)
}

fn seed(store: &Path) {
    assert_eq!(run(store, &["hierarchy", "create", "Course"]).unwrap(), exitcode::OK);
    for label in ["A", "B", "C"] {
        assert_eq!(
            run(store, &["section", "add", "course", "--label", label]).unwrap(),
            exitcode::OK
        );
    }
}

#[test]
fn given_cli_definition_when_debug_asserting_then_valid() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}

#[test]
fn given_created_sections_when_flattening_then_persisted_across_runs() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");

    seed(&store);

    assert!(store.exists());
    assert_eq!(run(&store, &["nav", "flatten", "course"]).unwrap(), exitcode::OK);
    assert_eq!(run(&store, &["nav", "next", "course", "a"]).unwrap(), exitcode::OK);
}

#[test]
fn given_skipped_section_when_visiting_then_denied_exit_code() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    seed(&store);

    let denied = run(&store, &["--user", "alice", "visit", "course", "b"]).unwrap();
    let first = run(&store, &["--user", "alice", "visit", "course", "a"]).unwrap();
    let allowed = run(&store, &["--user", "alice", "access", "course", "b"]).unwrap();
    let bypass = run(&store, &["--user", "alice", "access", "course", "c", "--no-enforce"]).unwrap();

    assert_eq!(denied, exitcode::DENIED);
    assert_eq!(first, exitcode::OK);
    assert_eq!(allowed, exitcode::OK);
    assert_eq!(bypass, exitcode::OK);
}

#[test]
fn given_unknown_section_when_visiting_then_noinput() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    seed(&store);

    let err = run(&store, &["visit", "course", "missing"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_exported_file_when_importing_under_new_name_then_succeeds() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    let export = dir.path().join("course.json");
    seed(&store);

    run(&store, &["hierarchy", "export", "course", "--output", &export.to_string_lossy()]).unwrap();
    let duplicate = run(&store, &["hierarchy", "import", &export.to_string_lossy()]).unwrap_err();
    let copied = run(&store, &["hierarchy", "copy", "course", "Course v2"]).unwrap();

    assert_eq!(duplicate.exit_code(), exitcode::DATAERR);
    assert_eq!(copied, exitcode::OK);
    assert_eq!(run(&store, &["nav", "flatten", "course-v2"]).unwrap(), exitcode::OK);
}

#[test]
fn given_root_when_deleting_then_usage_error() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store.json");
    seed(&store);

    let err = run(&store, &["section", "delete", "course"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_no_command_when_executing_then_usage_error() {
    let cli = Cli::try_parse_from(["pagetree"]).unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}
