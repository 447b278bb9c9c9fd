//! The reconciliation pipeline.
//!
//! Fixed step order per run:
//!
//! 1. Git pull (force) — the Git remote becomes the working tree.
//! 2. Writeback — local edits detected by hash divergence are PUT to the
//!    API *before* the listing is re-fetched (the ordering invariant).
//! 3. Fetch & materialize — user-defined scripts, then snippets.
//! 4. Prune — obsolete files removed, guarded against an empty fetch.
//! 5. Git push — commit with a synthesized message, push.
//!
//! Each step honors its toggle; with write-to-file disabled every mutation
//! degrades to a simulate-and-log pass while reads and comparisons still
//! run.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::Value;

use rmmsync_api::RemoteApi;
use rmmsync_core::{merge_payload, Config, RecordKind, ScriptRecord};
use rmmsync_git::{GitRepo, PushOutcome};

use crate::error::EngineError;
use crate::store::{Mirror, PruneReport, RAW_COMMIT_EXCLUDES};
use crate::writeback::{write_modifications_to_api, WritebackTally};

/// Everything one run did, for the final report.
#[derive(Debug)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub writeback: WritebackTally,
    /// Files (content + sidecar) produced by the fetch step.
    pub exported: usize,
    /// Per-shell tally for user-defined scripts (snippets excluded).
    pub shell_summary: BTreeMap<String, usize>,
    /// Per-item fetch problems; the records were skipped, the run went on.
    pub skipped_records: Vec<String>,
    pub prune: Vec<PruneReport>,
    /// `true` when the prune step was skipped by the empty-set guard.
    pub prune_skipped: bool,
    pub push: Option<PushOutcome>,
    /// Push failure is reported, not fatal: the API writebacks it trails
    /// are already applied and a re-run converges.
    pub push_error: Option<String>,
}

impl RunReport {
    pub fn pruned_files(&self) -> usize {
        self.prune.iter().map(|r| r.deleted.len()).sum()
    }
}

/// Execute one full sync run. Assumes the preflight gate already passed.
pub fn run(config: &Config, api: &dyn RemoteApi) -> Result<RunReport, EngineError> {
    let started_at = Utc::now();
    let toggles = config.toggles;
    let mirror = Mirror::new(&config.repo_path);
    let repo = GitRepo::new(&config.repo_path, &config.branch);
    mirror.ensure_layout()?;

    let mut report = RunReport {
        started_at,
        writeback: WritebackTally::default(),
        exported: 0,
        shell_summary: BTreeMap::new(),
        skipped_records: Vec::new(),
        prune: Vec::new(),
        prune_skipped: false,
        push: None,
        push_error: None,
    };

    // Step 1: bring the working tree in line with the Git remote.
    log::info!("===== Step 1: Git Pull =====");
    if toggles.git_pull {
        log::info!("Branch to pull: '{}'", config.branch);
        repo.pull()?;
    } else {
        log::info!("Git pull is disabled.");
    }

    // Step 2: push local edits upstream before they can be overwritten.
    log::info!("===== Step 2: Write Modifications to API =====");
    report.writeback = write_modifications_to_api(&mirror, api, toggles.writeback)?;

    // Step 3: fetch listings and materialize to disk.
    log::info!("===== Step 3: Fetch and Process Scripts and Snippets =====");
    let mut current: HashSet<PathBuf> = HashSet::new();

    log::info!("Fetching scripts...");
    let scripts: Vec<ScriptRecord> = api
        .list_scripts()?
        .into_iter()
        .filter(ScriptRecord::is_user_defined)
        .collect();
    process_records(&mirror, api, &scripts, toggles.write_to_file, &mut current, &mut report)?;

    log::info!("Fetching snippets...");
    let snippets = api.list_snippets()?;
    process_records(&mirror, api, &snippets, toggles.write_to_file, &mut current, &mut report)?;

    report.exported = current.len();
    log::info!("Total number of scripts exported: {}", report.exported);
    for (shell, count) in &report.shell_summary {
        log::info!("{shell}: {count}");
    }

    // Step 4: drop whatever the API no longer knows about.
    log::info!("Remove any obsolete files");
    if current.is_empty() {
        report.prune_skipped = true;
    }
    report.prune = mirror.prune_obsolete(&current, toggles.write_to_file)?;

    // Step 5: commit and push the mirror changes.
    log::info!("===== Step 4: Git Push =====");
    if toggles.git_push {
        match repo.push(&RAW_COMMIT_EXCLUDES) {
            Ok(outcome) => report.push = Some(outcome),
            Err(err) => {
                log::error!("Git push failed: {err}");
                report.push_error = Some(err.to_string());
            }
        }
    } else {
        log::info!("Git push is disabled.");
    }

    Ok(report)
}

/// Materialize one listing's records, accumulating the current-run set and
/// the shell tally. Per-record failures are noted and skipped.
fn process_records(
    mirror: &Mirror,
    api: &dyn RemoteApi,
    records: &[ScriptRecord],
    write: bool,
    current: &mut HashSet<PathBuf>,
    report: &mut RunReport,
) -> Result<(), EngineError> {
    let label = records.first().map(|r| r.kind.label()).unwrap_or("record");
    log::info!("Processing {label}s...");

    for record in records {
        let (code, payload) = match record.kind {
            RecordKind::Snippet => {
                let Some(code) = record.code.clone() else {
                    report
                        .skipped_records
                        .push(format!("snippet {} has no body in the listing", record.id));
                    continue;
                };
                (code, record.listing.clone())
            }
            RecordKind::Script => {
                let download = match api.fetch_script_body(record.id) {
                    Ok(download) => download,
                    Err(err) => {
                        log::warn!("failed to fetch body for script {}: {err}", record.id);
                        report
                            .skipped_records
                            .push(format!("script {} body fetch failed: {err}", record.id));
                        continue;
                    }
                };
                let Some(code) = download.get("code").and_then(Value::as_str).map(String::from)
                else {
                    report
                        .skipped_records
                        .push(format!("script {} download had no code field", record.id));
                    continue;
                };
                (code, merge_payload(download, &record.listing))
            }
        };

        let pair = mirror.materialize(record, &code, &payload, write)?;
        current.insert(pair.content_rel);
        current.insert(pair.sidecar_rel);

        if record.kind == RecordKind::Script {
            *report
                .shell_summary
                .entry(record.shell.to_string())
                .or_insert(0) += 1;
        }
    }

    Ok(())
}
