//! CLI integration tests for favs
//!
//! Each test runs the binary against its own temporary data directory,
//! workspace and empty config file, so runs never touch user state.

use predicates::prelude::*;
use std::fs;
use std::ffi::OsStr;
use std::path::PathBuf;
use tempfile::TempDir;

/// Isolated data directory, workspace and config for one test
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("ws")).unwrap();
        fs::create_dir_all(dir.path().join("outside")).unwrap();
        fs::write(dir.path().join("config.toml"), "").unwrap();
        Self { dir }
    }

    fn workspace(&self) -> PathBuf {
        self.dir.path().join("ws")
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// Creates a file inside the workspace
    fn ws_file(&self, name: &str) -> PathBuf {
        let path = self.workspace().join(name);
        fs::write(&path, name).unwrap();
        path
    }

    /// Creates a file outside the workspace
    fn outside_file(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("outside").join(name);
        fs::write(&path, name).unwrap();
        path
    }

    fn persisted(&self) -> String {
        fs::read_to_string(self.data_dir().join("entries.prefs")).unwrap()
    }

    /// Get a command instance for the favs binary
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("favs"));
        cmd.env_remove("RUST_LOG")
            .env_remove("FAVS_CONFIG")
            .env_remove("FAVS_DATA_DIR")
            .env_remove("FAVS_WORKSPACE")
            .arg("--config")
            .arg(self.dir.path().join("config.toml"))
            .arg("--data-dir")
            .arg(self.data_dir())
            .arg("--workspace")
            .arg(self.workspace());
        cmd
    }

    fn add<P: AsRef<OsStr>>(&self, paths: &[P]) {
        self.cmd().arg("add").args(paths).assert().success();
    }

    fn list_json(&self) -> Vec<serde_json::Value> {
        let output = self
            .cmd()
            .args(["list", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn labels(&self) -> Vec<String> {
        self.list_json()
            .iter()
            .map(|entry| entry["label"].as_str().unwrap().to_string())
            .collect()
    }
}

// =============================================================================
// Listing and adding
// =============================================================================

#[test]
fn test_list_empty() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No favorites"));
}

#[test]
fn test_add_keeps_order() {
    let fx = Fixture::new();
    let a = fx.ws_file("a.txt");
    let b = fx.ws_file("b.txt");
    let c = fx.ws_file("c.txt");

    fx.cmd()
        .arg("add")
        .args([&a, &b, &c])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 3 favorite(s)"));

    assert_eq!(fx.labels(), vec!["a.txt", "b.txt", "c.txt"]);

    fx.cmd()
        .arg("add")
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("No new favorites"));

    assert_eq!(fx.labels(), vec!["a.txt", "b.txt", "c.txt"]);
}

#[test]
fn test_equivalent_paths_are_one_favorite() {
    let fx = Fixture::new();
    let a = fx.outside_file("a.txt");
    let dotted = fx.dir.path().join("outside").join(".").join("a.txt");

    fx.add(&[&a]);
    fx.cmd()
        .arg("add")
        .arg(&dotted)
        .assert()
        .success()
        .stdout(predicate::str::contains("No new favorites"));

    assert_eq!(fx.list_json().len(), 1);
}

#[test]
fn test_add_classifies_workspace_members() {
    let fx = Fixture::new();
    let inside = fx.ws_file("inside.txt");
    let outside = fx.outside_file("outside.txt");

    fx.add(&[&inside, &outside]);

    let entries = fx.list_json();
    assert_eq!(entries[0]["workspace_member"], true);
    assert_eq!(entries[0]["workspace_path"], "/inside.txt");
    assert_eq!(entries[1]["workspace_member"], false);
    assert!(entries[1]["workspace_path"].is_null());
    assert_eq!(entries[1]["status"], "OK");
}

#[test]
fn test_add_missing_path_is_marked_missing() {
    let fx = Fixture::new();
    let ghost = fx.dir.path().join("outside").join("ghost.txt");

    fx.add(&[&ghost]);

    let entries = fx.list_json();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "MISSING");
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_persisted_format() {
    let fx = Fixture::new();
    let a = fx.outside_file("a.txt");

    fx.add(&[&a]);

    let expected = format!(
        "[{{\"path\":\"{}\",\"workspace\":false,\"workspacePath\":null,\"label\":\"a.txt\",\"comment\":null,\"status\":\"OK\"}}]",
        a.display()
    );
    assert_eq!(fx.persisted(), expected);
}

#[test]
fn test_corrupt_store_starts_empty() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.data_dir()).unwrap();
    fs::write(fx.data_dir().join("entries.prefs"), "[{\"path\":").unwrap();

    fx.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No favorites"));

    let a = fx.ws_file("a.txt");
    fx.add(&[&a]);
    assert_eq!(fx.labels(), vec!["a.txt"]);
}

#[test]
fn test_repeated_commands_do_not_change_persisted_text() {
    let fx = Fixture::new();
    let a = fx.ws_file("a.txt");
    let b = fx.outside_file("b.txt");
    fx.add(&[&a, &b]);

    let first = fx.persisted();
    fx.cmd().arg("list").assert().success();
    fx.cmd().arg("check").assert().success();
    assert_eq!(fx.persisted(), first);
}

// =============================================================================
// Reordering, comments and removal
// =============================================================================

#[test]
fn test_move_after_target() {
    let fx = Fixture::new();
    let paths: Vec<_> = ["a", "b", "c", "d"].iter().map(|n| fx.ws_file(n)).collect();
    fx.cmd().arg("add").args(&paths).assert().success();

    fx.cmd()
        .args(["move"])
        .arg(&paths[0])
        .arg(&paths[2])
        .arg("--after")
        .arg(&paths[1])
        .assert()
        .success();

    assert_eq!(fx.labels(), vec!["b", "a", "c", "d"]);
}

#[test]
fn test_move_before_target_and_to_end() {
    let fx = Fixture::new();
    let paths: Vec<_> = ["a", "b", "c", "d"].iter().map(|n| fx.ws_file(n)).collect();
    fx.cmd().arg("add").args(&paths).assert().success();

    fx.cmd()
        .arg("move")
        .arg(&paths[0])
        .arg(&paths[2])
        .arg("--before")
        .arg(&paths[1])
        .assert()
        .success();
    assert_eq!(fx.labels(), vec!["a", "c", "b", "d"]);

    fx.cmd()
        .arg("move")
        .arg(&paths[0])
        .arg(&paths[2])
        .assert()
        .success();
    assert_eq!(fx.labels(), vec!["b", "d", "a", "c"]);
}

#[test]
fn test_move_rejects_unknown_target() {
    let fx = Fixture::new();
    let a = fx.ws_file("a");
    fx.add(&[&a]);

    fx.cmd()
        .arg("move")
        .arg(&a)
        .arg("--after")
        .arg(fx.workspace().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a favorite"));
}

#[test]
fn test_comment_set_and_clear() {
    let fx = Fixture::new();
    let a = fx.ws_file("a.txt");
    fx.add(&[&a]);

    fx.cmd()
        .arg("comment")
        .arg(&a)
        .arg("review \"this\"")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated comment"));
    assert_eq!(fx.list_json()[0]["comment"], "review \"this\"");
    assert!(fx.persisted().contains(r#""comment":"review \"this\"""#));

    fx.cmd()
        .arg("comment")
        .arg(&a)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared comment"));
    assert!(fx.list_json()[0]["comment"].is_null());
}

#[test]
fn test_comment_requires_favorite() {
    let fx = Fixture::new();
    let a = fx.ws_file("a.txt");

    fx.cmd()
        .arg("comment")
        .arg(&a)
        .arg("hello")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a favorite"));
}

#[test]
fn test_remove() {
    let fx = Fixture::new();
    let a = fx.ws_file("a.txt");
    let b = fx.ws_file("b.txt");
    fx.add(&[&a, &b]);

    fx.cmd()
        .arg("remove")
        .arg(&a)
        .arg(fx.workspace().join("unknown.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 favorite(s)"))
        .stderr(predicate::str::contains("Not a favorite"));

    assert_eq!(fx.labels(), vec!["b.txt"]);
}

// =============================================================================
// Status checks
// =============================================================================

#[test]
fn test_check_reports_missing_and_recovers() {
    let fx = Fixture::new();
    let a = fx.ws_file("a.txt");
    let b = fx.outside_file("b.txt");
    fx.add(&[&a, &b]);

    fs::remove_file(&b).unwrap();

    fx.cmd()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 2 favorite(s) missing"));
    assert!(fx.persisted().contains("\"status\":\"MISSING\""));

    fs::write(&b, "back").unwrap();

    fx.cmd()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("All 2 favorite(s) present"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_prints_effective_settings() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[storage]"))
        .stdout(predicate::str::contains("key = \"entries\""))
        .stdout(predicate::str::contains("batch_millis = 250"));
}

#[test]
fn test_config_file_sets_preference_key() {
    let fx = Fixture::new();
    fs::write(
        fx.dir.path().join("config.toml"),
        "[storage]\nkey = \"pinned\"\n",
    )
    .unwrap();
    let a = fx.ws_file("a.txt");

    fx.add(&[&a]);

    assert!(fx.data_dir().join("pinned.prefs").is_file());
    assert!(!fx.data_dir().join("entries.prefs").exists());
}

#[test]
fn test_invalid_config_fails() {
    let fx = Fixture::new();
    fs::write(fx.dir.path().join("config.toml"), "[watch]\nbatch_millis = \"soon\"\n").unwrap();

    fx.cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}
