//! Step 2 — push local edits back to the API.
//!
//! A local edit is detected purely by hash divergence: the sidecar stores
//! the last body the API served, so whenever
//! `SHA256(content file) != SHA256(sidecar.code)` someone edited the
//! content file (directly or through Git) and the API must be updated
//! before the fetch step overwrites the edit.

use std::path::Path;

use serde_json::Value;
use similar::TextDiff;

use rmmsync_api::RemoteApi;
use rmmsync_core::{RecordKind, Sidecar};

use crate::error::EngineError;
use crate::store::{build_stem_index, hash_file, normalize_stem, sha256_hex, walk_files, Mirror};

/// Counters reported after the writeback pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritebackTally {
    /// Sidecar JSON files visited.
    pub checked: usize,
    /// Sidecars with a matching content file.
    pub matched: usize,
    /// Matches whose hashes diverged.
    pub mismatched: usize,
    /// Mismatches successfully PUT to the API.
    pub updated: usize,
    /// Sidecars skipped: no match, unreadable, or a failed PUT.
    pub skipped: usize,
}

/// Compare every sidecar with its content file and push divergent bodies
/// upstream. With writeback disabled the comparison still runs and the
/// would-be payload is previewed, but nothing is sent.
pub fn write_modifications_to_api(
    mirror: &Mirror,
    api: &dyn RemoteApi,
    writeback_enabled: bool,
) -> Result<WritebackTally, EngineError> {
    log::info!("Comparing script files with JSON files...");
    let mut tally = WritebackTally::default();

    for kind in [RecordKind::Script, RecordKind::Snippet] {
        let raw_dir = mirror.raw_dir(kind);
        if !raw_dir.exists() {
            continue;
        }
        // One index per section instead of a content-tree scan per sidecar.
        let index = build_stem_index(&mirror.content_dir(kind))?;

        for sidecar_path in walk_files(&raw_dir)? {
            if sidecar_path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            tally.checked += 1;

            let Some(stem) = sidecar_path.file_stem().and_then(|s| s.to_str()) else {
                tally.skipped += 1;
                continue;
            };
            let Some(content_path) = index.get(&normalize_stem(stem)) else {
                log::info!(
                    "No match for {}: {}",
                    kind.label(),
                    sidecar_path.display()
                );
                tally.skipped += 1;
                continue;
            };

            log::debug!(
                "Matched {}: {} <-> {}",
                kind.label(),
                content_path.display(),
                sidecar_path.display()
            );
            tally.matched += 1;

            if let Err(skip_reason) = reconcile_pair(
                api,
                kind,
                content_path,
                &sidecar_path,
                writeback_enabled,
                &mut tally,
            )? {
                log::warn!("{skip_reason}");
                tally.skipped += 1;
            }
        }
    }

    log::info!("Comparison complete:");
    log::info!("Total files checked: {}", tally.checked);
    log::info!("Total matches: {}", tally.matched);
    log::info!("Total mismatches: {}", tally.mismatched);
    log::info!("Total updates: {}", tally.updated);
    log::info!("Total skipped: {}", tally.skipped);
    Ok(tally)
}

/// Handle one matched pair. The outer `Result` is fatal I/O walking state;
/// the inner `Result<(), String>` is a per-item skip with its reason.
fn reconcile_pair(
    api: &dyn RemoteApi,
    kind: RecordKind,
    content_path: &Path,
    sidecar_path: &Path,
    writeback_enabled: bool,
    tally: &mut WritebackTally,
) -> Result<Result<(), String>, EngineError> {
    let Some(content_hash) = hash_file(content_path)? else {
        return Ok(Err(format!(
            "content file vanished mid-run: {}",
            content_path.display()
        )));
    };

    let sidecar = match Sidecar::load(sidecar_path) {
        Ok(sidecar) => sidecar,
        Err(err) => {
            return Ok(Err(format!(
                "error reading JSON file {}: {err}",
                sidecar_path.display()
            )))
        }
    };

    if content_hash == sha256_hex(sidecar.code.as_bytes()) {
        return Ok(Ok(()));
    }
    tally.mismatched += 1;

    let edited = match std::fs::read_to_string(content_path) {
        Ok(text) => text,
        Err(err) => {
            return Ok(Err(format!(
                "error reading script file {}: {err}",
                content_path.display()
            )))
        }
    };

    log::info!(
        "Local edit detected for {} {} ({})",
        kind.label(),
        sidecar.id,
        content_path.display()
    );
    log_diff_preview(&sidecar.code, &edited);

    let mut payload = sidecar.payload.clone();
    payload.insert("code".to_string(), Value::String(edited));

    if !writeback_enabled {
        log::info!(
            "Simulated push for {} {} (writeback disabled)",
            kind.label(),
            sidecar.id
        );
        return Ok(Ok(()));
    }

    log::info!("Updating API for {} {}...", kind.label(), sidecar.id);
    let outcome = match kind {
        RecordKind::Script => api.update_script(sidecar.id, payload),
        RecordKind::Snippet => api.update_snippet(sidecar.id, payload),
    };
    match outcome {
        Ok(()) => {
            tally.updated += 1;
            Ok(Ok(()))
        }
        Err(err) => Ok(Err(format!(
            "failed to update {} {}: {err}",
            kind.label(),
            sidecar.id
        ))),
    }
}

/// Unified diff of the last-known API body against the local edit,
/// truncated so a rewritten script does not flood the log.
fn log_diff_preview(api_body: &str, local_body: &str) {
    const MAX_LINES: usize = 40;
    let diff = TextDiff::from_lines(api_body, local_body)
        .unified_diff()
        .header("api", "local")
        .context_radius(3)
        .to_string();
    for line in diff.lines().take(MAX_LINES) {
        log::info!("{line}");
    }
    if diff.lines().count() > MAX_LINES {
        log::info!("… diff truncated");
    }
}
