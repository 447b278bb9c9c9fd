//! Pipeline integration tests against an in-memory API fake.
//!
//! Git steps stay disabled here; the git adapter has its own integration
//! tests against a real throwaway repository.

use std::cell::RefCell;
use std::path::PathBuf;

use serde_json::{json, Map, Value};
use tempfile::TempDir;

use rmmsync_api::{ApiError, RemoteApi};
use rmmsync_core::{Config, RecordKind, ScriptId, ScriptRecord, Toggles};
use rmmsync_engine::pipeline;

/// Serves canned listings; records update calls.
struct FakeApi {
    scripts: Vec<Value>,
    snippets: Vec<Value>,
    bodies: Vec<(i64, Value)>,
    updates: RefCell<Vec<(ScriptId, Map<String, Value>)>>,
}

impl FakeApi {
    fn new(scripts: Vec<Value>, snippets: Vec<Value>, bodies: Vec<(i64, Value)>) -> Self {
        Self {
            scripts,
            snippets,
            bodies,
            updates: RefCell::new(Vec::new()),
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }
}

impl RemoteApi for FakeApi {
    fn check_read_access(&self) -> Result<(), ApiError> {
        Ok(())
    }

    fn list_scripts(&self) -> Result<Vec<ScriptRecord>, ApiError> {
        Ok(self
            .scripts
            .iter()
            .cloned()
            .map(|e| ScriptRecord::from_listing(e, RecordKind::Script).unwrap())
            .collect())
    }

    fn list_snippets(&self) -> Result<Vec<ScriptRecord>, ApiError> {
        Ok(self
            .snippets
            .iter()
            .cloned()
            .map(|e| ScriptRecord::from_listing(e, RecordKind::Snippet).unwrap())
            .collect())
    }

    fn fetch_script_body(&self, id: ScriptId) -> Result<Value, ApiError> {
        self.bodies
            .iter()
            .find(|(bid, _)| *bid == id.0)
            .map(|(_, body)| body.clone())
            .ok_or(ApiError::Status {
                url: format!("/scripts/{id}/download/"),
                status: 404,
                body: String::new(),
            })
    }

    fn update_script(&self, id: ScriptId, payload: Map<String, Value>) -> Result<(), ApiError> {
        self.updates.borrow_mut().push((id, payload));
        Ok(())
    }

    fn update_snippet(&self, id: ScriptId, payload: Map<String, Value>) -> Result<(), ApiError> {
        self.updates.borrow_mut().push((id, payload));
        Ok(())
    }
}

fn config_for(root: &TempDir) -> Config {
    Config {
        api_base: "https://api.example.com".to_string(),
        api_token: "test-token-000".to_string(),
        repo_path: root.path().to_path_buf(),
        branch: "master".to_string(),
        toggles: Toggles {
            git_pull: false,
            git_push: false,
            writeback: true,
            write_to_file: true,
        },
    }
}

fn cleanup_api() -> FakeApi {
    FakeApi::new(
        vec![json!({
            "id": 7,
            "name": "Cleanup",
            "category": "Maintenance",
            "shell": "powershell",
            "script_type": "userdefined",
        })],
        Vec::new(),
        vec![(7, json!({ "code": "Write-Host 1" }))],
    )
}

#[test]
fn materializes_content_and_sidecar() {
    let root = TempDir::new().unwrap();
    let api = cleanup_api();

    let report = pipeline::run(&config_for(&root), &api).expect("run");
    assert_eq!(report.exported, 2);

    let content = root.path().join("scripts/Maintenance/Cleanup.ps1");
    assert_eq!(std::fs::read_to_string(&content).unwrap(), "Write-Host 1");

    let sidecar = root.path().join("scriptsraw/Maintenance/7 - Cleanup.json");
    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&sidecar).unwrap()).unwrap();
    assert_eq!(doc["code"], json!("Write-Host 1"));
    assert_eq!(doc["id"], json!(7));
    assert_eq!(doc["category"], json!("Maintenance"));
}

#[test]
fn second_run_is_a_complete_noop() {
    let root = TempDir::new().unwrap();
    let api = cleanup_api();
    let config = config_for(&root);

    pipeline::run(&config, &api).expect("first run");
    let content = root.path().join("scripts/Maintenance/Cleanup.ps1");
    let mtime_before = std::fs::metadata(&content).unwrap().modified().unwrap();

    std::thread::sleep(std::time::Duration::from_millis(1100));
    let report = pipeline::run(&config, &api).expect("second run");

    assert_eq!(report.writeback.mismatched, 0);
    assert_eq!(report.pruned_files(), 0);
    assert!(api.updates.borrow().is_empty());
    let mtime_after = std::fs::metadata(&content).unwrap().modified().unwrap();
    assert_eq!(mtime_before, mtime_after, "unchanged file was rewritten");
}

#[test]
fn local_edit_is_pushed_before_refetch() {
    let root = TempDir::new().unwrap();
    let api = cleanup_api();
    let config = config_for(&root);
    pipeline::run(&config, &api).expect("first run");

    let content = root.path().join("scripts/Maintenance/Cleanup.ps1");
    std::fs::write(&content, "Write-Host 2").unwrap();

    let report = pipeline::run(&config, &api).expect("second run");
    assert_eq!(report.writeback.mismatched, 1);
    assert_eq!(report.writeback.updated, 1);

    let updates = api.updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, ScriptId(7));
    assert_eq!(updates[0].1.get("code"), Some(&json!("Write-Host 2")));
}

#[test]
fn empty_fetch_skips_prune() {
    let root = TempDir::new().unwrap();
    let config = config_for(&root);

    // A populated mirror, then an API that suddenly returns nothing.
    pipeline::run(&config, &cleanup_api()).expect("seed run");
    let content = root.path().join("scripts/Maintenance/Cleanup.ps1");
    assert!(content.exists());

    let report = pipeline::run(&config, &FakeApi::empty()).expect("outage run");
    assert!(report.prune_skipped);
    assert_eq!(report.pruned_files(), 0);
    assert!(content.exists(), "outage must not wipe the mirror");
}

#[test]
fn records_dropped_from_the_api_are_pruned() {
    let root = TempDir::new().unwrap();
    let config = config_for(&root);
    pipeline::run(&config, &cleanup_api()).expect("seed run");

    // Same instance, different surviving script.
    let api = FakeApi::new(
        vec![json!({
            "id": 8,
            "name": "Audit",
            "shell": "python",
            "script_type": "userdefined",
        })],
        Vec::new(),
        vec![(8, json!({ "code": "print(1)" }))],
    );
    let report = pipeline::run(&config, &api).expect("second run");

    assert!(!report.prune_skipped);
    assert!(report.pruned_files() >= 2, "old content + sidecar removed");
    assert!(!root.path().join("scripts/Maintenance/Cleanup.ps1").exists());
    assert!(!root
        .path()
        .join("scriptsraw/Maintenance/7 - Cleanup.json")
        .exists());
    assert!(root.path().join("scripts/Audit.py").exists());
}

#[test]
fn category_change_moves_the_record_within_one_run() {
    let root = TempDir::new().unwrap();
    let config = config_for(&root);
    pipeline::run(&config, &cleanup_api()).expect("seed run");

    let api = FakeApi::new(
        vec![json!({
            "id": 7,
            "name": "Cleanup",
            "category": "Ops",
            "shell": "powershell",
            "script_type": "userdefined",
        })],
        Vec::new(),
        vec![(7, json!({ "code": "Write-Host 1" }))],
    );
    pipeline::run(&config, &api).expect("rename run");

    assert!(root.path().join("scripts/Ops/Cleanup.ps1").exists());
    assert!(!root.path().join("scripts/Maintenance").exists());
}

#[test]
fn non_user_defined_scripts_are_never_materialized() {
    let root = TempDir::new().unwrap();
    let api = FakeApi::new(
        vec![json!({
            "id": 50,
            "name": "Builtin",
            "shell": "powershell",
            "script_type": "builtin",
        })],
        Vec::new(),
        vec![(50, json!({ "code": "x" }))],
    );

    let report = pipeline::run(&config_for(&root), &api).expect("run");
    assert_eq!(report.exported, 0);
    assert!(!root.path().join("scripts/Builtin.ps1").exists());
}

#[test]
fn shell_tally_counts_scripts_but_not_snippets() {
    let root = TempDir::new().unwrap();
    let api = FakeApi::new(
        vec![
            json!({ "id": 1, "name": "A", "shell": "python", "script_type": "userdefined" }),
            json!({ "id": 2, "name": "B", "shell": "python", "script_type": "userdefined" }),
            json!({ "id": 3, "name": "C", "shell": "powershell", "script_type": "userdefined" }),
        ],
        vec![json!({ "id": 9, "name": "Snip", "shell": "python", "code": "pass" })],
        vec![
            (1, json!({ "code": "1" })),
            (2, json!({ "code": "2" })),
            (3, json!({ "code": "3" })),
        ],
    );

    let report = pipeline::run(&config_for(&root), &api).expect("run");
    assert_eq!(report.shell_summary.get("python"), Some(&2));
    assert_eq!(report.shell_summary.get("powershell"), Some(&1));
    assert_eq!(report.shell_summary.values().sum::<usize>(), 3);
    assert!(root.path().join("snippets/Snip.py").exists());
}

#[test]
fn failed_body_fetch_skips_the_record_only() {
    let root = TempDir::new().unwrap();
    let api = FakeApi::new(
        vec![
            json!({ "id": 1, "name": "Good", "shell": "shell", "script_type": "userdefined" }),
            json!({ "id": 2, "name": "Bad", "shell": "shell", "script_type": "userdefined" }),
        ],
        Vec::new(),
        vec![(1, json!({ "code": "echo ok" }))], // no body for id 2
    );

    let report = pipeline::run(&config_for(&root), &api).expect("run");
    assert!(root.path().join("scripts/Good.sh").exists());
    assert!(!root.path().join("scripts/Bad.sh").exists());
    assert_eq!(report.skipped_records.len(), 1);
}

#[test]
fn write_to_file_disabled_runs_dry() {
    let root = TempDir::new().unwrap();
    let mut config = config_for(&root);
    config.toggles.write_to_file = false;
    config.toggles.writeback = false;

    let report = pipeline::run(&config, &cleanup_api()).expect("run");
    assert_eq!(report.exported, 2, "comparisons still happen");
    assert!(!root.path().join("scripts/Maintenance").exists());
}
