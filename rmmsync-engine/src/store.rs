//! Content store adapter — the on-disk mirror of the remote script library.
//!
//! Layout under the repository root:
//!
//! ```text
//! scripts/      <category>/<name>.<ext>         editable script bodies
//! scriptsraw/   <category>/<id> - <name>.json   raw API sidecars
//! snippets/     <category>/<name>.<ext>
//! snippetsraw/  <category>/<id> - <name>.json
//! ```
//!
//! All writes are hash-gated (byte-identical content is never rewritten, so
//! repeated runs stay invisible to Git) and atomic (`.tmp` + rename).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use rmmsync_core::{sanitize_filename, RecordKind, ScriptRecord};

use crate::error::{io_err, EngineError};

pub const SCRIPTS_DIR: &str = "scripts";
pub const SCRIPTS_RAW_DIR: &str = "scriptsraw";
pub const SNIPPETS_DIR: &str = "snippets";
pub const SNIPPETS_RAW_DIR: &str = "snippetsraw";

/// Raw-sidecar prefixes excluded from commit message summaries.
pub const RAW_COMMIT_EXCLUDES: [&str; 2] = ["scriptsraw/", "snippetsraw/"];

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hex SHA-256 of a file's bytes; `None` when the file does not exist.
pub fn hash_file(path: &Path) -> Result<Option<String>, EngineError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(sha256_hex(&bytes))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

// ---------------------------------------------------------------------------
// Write results
// ---------------------------------------------------------------------------

/// Outcome of one materialized file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Content changed or the file did not exist; it was written.
    Written,
    /// On-disk bytes already match; nothing touched.
    Unchanged,
    /// Write-to-file disabled; the write was only reported.
    Simulated,
}

/// The two relative paths one record materializes to, with their outcomes.
#[derive(Debug, Clone)]
pub struct MaterializedPair {
    /// Path of the content file, relative to its section directory.
    pub content_rel: PathBuf,
    /// Path of the sidecar, relative to its raw section directory.
    pub sidecar_rel: PathBuf,
    pub content_outcome: SaveOutcome,
    pub sidecar_outcome: SaveOutcome,
}

/// Result of pruning one managed directory.
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    pub deleted: Vec<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Mirror
// ---------------------------------------------------------------------------

/// The filesystem mirror rooted at the Git checkout.
#[derive(Debug, Clone)]
pub struct Mirror {
    root: PathBuf,
}

impl Mirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn content_dir(&self, kind: RecordKind) -> PathBuf {
        match kind {
            RecordKind::Script => self.root.join(SCRIPTS_DIR),
            RecordKind::Snippet => self.root.join(SNIPPETS_DIR),
        }
    }

    pub fn raw_dir(&self, kind: RecordKind) -> PathBuf {
        match kind {
            RecordKind::Script => self.root.join(SCRIPTS_RAW_DIR),
            RecordKind::Snippet => self.root.join(SNIPPETS_RAW_DIR),
        }
    }

    /// All four managed directories.
    pub fn managed_dirs(&self) -> [PathBuf; 4] {
        [
            self.root.join(SCRIPTS_DIR),
            self.root.join(SCRIPTS_RAW_DIR),
            self.root.join(SNIPPETS_DIR),
            self.root.join(SNIPPETS_RAW_DIR),
        ]
    }

    /// Create the root and the four managed directories. Doubles as the
    /// write-permission probe during preflight.
    pub fn ensure_layout(&self) -> Result<(), EngineError> {
        for dir in self.managed_dirs() {
            std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
        Ok(())
    }

    /// Write one record's content file and raw sidecar.
    ///
    /// Paths derive from the sanitized display name and category; `id` only
    /// appears in the sidecar filename, which is what keeps renames from
    /// creating duplicates (the old path falls out of the current set and is
    /// pruned).
    pub fn materialize(
        &self,
        record: &ScriptRecord,
        code: &str,
        payload: &Map<String, Value>,
        write: bool,
    ) -> Result<MaterializedPair, EngineError> {
        let name = sanitize_filename(&record.name);
        if name.was_modified() {
            log::info!(
                "Removed from file name: {} ({})",
                name.removed_display(),
                record.name
            );
        }
        let category = record.category.as_deref().map(sanitize_filename);
        if let Some(cat) = &category {
            if cat.was_modified() {
                log::info!("Removed from category name: {}", cat.removed_display());
            }
        }

        let subdir: Option<&str> = category
            .as_ref()
            .map(|c| c.name.as_str())
            .filter(|c| !c.is_empty());
        let content_name = format!("{}{}", name.name, record.shell.extension());
        let sidecar_name = format!("{} - {}.json", record.id, name.name);

        let content_rel = match subdir {
            Some(cat) => PathBuf::from(cat).join(&content_name),
            None => PathBuf::from(&content_name),
        };
        let sidecar_rel = match subdir {
            Some(cat) => PathBuf::from(cat).join(&sidecar_name),
            None => PathBuf::from(&sidecar_name),
        };

        let content_path = self.content_dir(record.kind).join(&content_rel);
        let sidecar_path = self.raw_dir(record.kind).join(&sidecar_rel);
        let sidecar_json = serde_json::to_string_pretty(&Value::Object(payload.clone()))?;

        let content_outcome = save_file(&content_path, code.as_bytes(), write)?;
        let sidecar_outcome = save_file(&sidecar_path, sidecar_json.as_bytes(), write)?;

        Ok(MaterializedPair {
            content_rel,
            sidecar_rel,
            content_outcome,
            sidecar_outcome,
        })
    }

    /// Delete every file under `dir` whose section-relative path is not in
    /// `current`, then drop directories left empty. Simulated when `write`
    /// is false.
    pub fn prune_dir(
        &self,
        dir: &Path,
        current: &HashSet<PathBuf>,
        write: bool,
    ) -> Result<PruneReport, EngineError> {
        log::info!("Cleaning {}...", dir.display());
        let mut report = PruneReport::default();
        if !dir.exists() {
            return Ok(report);
        }

        for file in walk_files(dir)? {
            let rel = file.strip_prefix(dir).unwrap_or(&file).to_path_buf();
            if current.contains(&rel) {
                continue;
            }
            if write {
                std::fs::remove_file(&file).map_err(|e| io_err(&file, e))?;
                log::info!("Deleted file no longer in the API: {}", file.display());
            } else {
                log::info!(
                    "Simulated deletion of file no longer in the API: {}",
                    file.display()
                );
            }
            report.deleted.push(rel);
        }

        // Deepest-first so nested empty chains collapse in one pass.
        let mut dirs = walk_dirs(dir)?;
        dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
        for sub in dirs {
            let empty = std::fs::read_dir(&sub)
                .map_err(|e| io_err(&sub, e))?
                .next()
                .is_none();
            if !empty {
                continue;
            }
            if write {
                std::fs::remove_dir(&sub).map_err(|e| io_err(&sub, e))?;
                log::info!("Removed empty directory: {}", sub.display());
            } else {
                log::info!("Simulated removal of empty directory: {}", sub.display());
            }
            report
                .removed_dirs
                .push(sub.strip_prefix(dir).unwrap_or(&sub).to_path_buf());
        }

        Ok(report)
    }

    /// Prune all four managed directories against the current-run set.
    ///
    /// Safety invariant: an empty `current` set means the fetch step
    /// produced nothing (API outage, auth regression) and pruning would
    /// wipe the entire mirror — so it is skipped outright.
    pub fn prune_obsolete(
        &self,
        current: &HashSet<PathBuf>,
        write: bool,
    ) -> Result<Vec<PruneReport>, EngineError> {
        if current.is_empty() {
            log::warn!("Current script set is empty; skipping obsolete-file cleanup.");
            return Ok(Vec::new());
        }
        self.managed_dirs()
            .iter()
            .map(|dir| self.prune_dir(dir, current, write))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Atomic, hash-gated file writes
// ---------------------------------------------------------------------------

/// Write `content` to `path` unless the on-disk bytes already match.
///
/// Real writes go through `<path>.sync.tmp` + rename.
pub fn save_file(path: &Path, content: &[u8], write: bool) -> Result<SaveOutcome, EngineError> {
    if let Some(existing) = hash_file(path)? {
        if existing == sha256_hex(content) {
            log::debug!("unchanged: {}", path.display());
            return Ok(SaveOutcome::Unchanged);
        }
    }

    if !write {
        log::info!("File would be saved (simulation): {}", path.display());
        return Ok(SaveOutcome::Simulated);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.sync.tmp", path.display()));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, err));
    }
    log::info!("File saved: {}", path.display());
    Ok(SaveOutcome::Written)
}

// ---------------------------------------------------------------------------
// Tree walking and stem matching
// ---------------------------------------------------------------------------

/// All files under `dir`, recursively.
pub fn walk_files(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).map_err(|e| io_err(&current, e))? {
            let entry = entry.map_err(|e| io_err(&current, e))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn walk_dirs(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut dirs = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).map_err(|e| io_err(&current, e))? {
            let entry = entry.map_err(|e| io_err(&current, e))?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path.clone());
                stack.push(path);
            }
        }
    }
    Ok(dirs)
}

/// Lowercased stem of a sidecar filename with the `"<id> - "` prefix
/// stripped, so it matches its content file's stem.
pub fn normalize_stem(stem: &str) -> String {
    let rest = stem.trim_start_matches(|c: char| c.is_ascii_digit());
    let stripped = if rest.len() < stem.len() {
        rest.strip_prefix(" - ").unwrap_or(stem)
    } else {
        stem
    };
    stripped.to_lowercase()
}

/// Map from lowercased file stem to path, built once per run so sidecar
/// matching is a lookup instead of a directory scan per sidecar.
pub fn build_stem_index(dir: &Path) -> Result<HashMap<String, PathBuf>, EngineError> {
    let mut index = HashMap::new();
    if !dir.exists() {
        return Ok(index);
    }
    for file in walk_files(dir)? {
        if let Some(stem) = file.file_stem().and_then(|s| s.to_str()) {
            // First match wins on collisions, same as a scan would find.
            index.entry(stem.to_lowercase()).or_insert(file);
        }
    }
    Ok(index)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
