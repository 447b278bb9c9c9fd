//! Domain types for the script mirror.
//!
//! The remote API owns these records; the local mirror and the Git repository
//! are caches. `id` is the only key that is stable across syncs — names and
//! categories may change and only move the on-disk materialization.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{io_err, ModelError};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable numeric identifier assigned by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptId(pub i64);

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for ScriptId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Shell kinds
// ---------------------------------------------------------------------------

/// Interpreter declared by the remote record; decides the file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellKind {
    Powershell,
    Python,
    Cmd,
    Shell,
    Nushell,
    /// Anything the mirror does not recognize; keeps the raw name so the
    /// shell tally stays honest.
    Other(String),
}

impl ShellKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "powershell" => Self::Powershell,
            "python" => Self::Python,
            "cmd" => Self::Cmd,
            "shell" => Self::Shell,
            "nushell" => Self::Nushell,
            other => Self::Other(other.to_string()),
        }
    }

    /// File extension for the materialized content file, dot included.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Powershell => ".ps1",
            Self::Python => ".py",
            Self::Cmd => ".bat",
            Self::Shell => ".sh",
            Self::Nushell => ".nu",
            Self::Other(_) => ".txt",
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Powershell => write!(f, "powershell"),
            Self::Python => write!(f, "python"),
            Self::Cmd => write!(f, "cmd"),
            Self::Shell => write!(f, "shell"),
            Self::Nushell => write!(f, "nushell"),
            Self::Other(name) if name.is_empty() => write!(f, "unknown"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Whether a record is a full script or an inline snippet.
///
/// Snippets carry their body in the listing response; scripts need a
/// secondary download call, and the two kinds update through different
/// endpoints with different body field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Script,
    Snippet,
}

impl RecordKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Snippet => "snippet",
        }
    }
}

/// One script or snippet as returned by the listing endpoint.
///
/// The typed fields are what the sync logic keys on; `listing` keeps the
/// full raw entry for the sidecar merge so unknown fields survive a
/// round-trip untouched.
#[derive(Debug, Clone)]
pub struct ScriptRecord {
    pub id: ScriptId,
    pub name: String,
    pub category: Option<String>,
    pub shell: ShellKind,
    pub kind: RecordKind,
    /// Inline body; present for snippets, absent for scripts.
    pub code: Option<String>,
    /// `script_type` from the listing; only `userdefined` records are
    /// materialized.
    pub script_type: Option<String>,
    /// The raw listing entry.
    pub listing: Map<String, Value>,
}

impl ScriptRecord {
    /// Decode a listing entry. Entries without a numeric `id` are rejected;
    /// everything else degrades gracefully.
    pub fn from_listing(entry: Value, kind: RecordKind) -> Result<Self, ModelError> {
        let obj = match entry {
            Value::Object(map) => map,
            other => {
                return Err(ModelError::MissingField {
                    field: "id",
                    entry: other.to_string(),
                })
            }
        };

        let id = obj
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| ModelError::MissingField {
                field: "id",
                entry: Value::Object(obj.clone()).to_string(),
            })?;
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unnamed Script")
            .to_string();
        let category = obj
            .get("category")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let shell = ShellKind::from_name(obj.get("shell").and_then(Value::as_str).unwrap_or(""));
        let code = obj
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string);
        let script_type = obj
            .get("script_type")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            id: ScriptId(id),
            name,
            category,
            shell,
            kind,
            code,
            script_type,
            listing: obj,
        })
    }

    /// `true` for records an operator created (the only editable kind).
    pub fn is_user_defined(&self) -> bool {
        self.script_type.as_deref() == Some("userdefined")
    }
}

/// Merge a download payload with the listing entry; listing fields win.
///
/// The result is what gets persisted as the raw sidecar — the full last
/// known API state for the record.
pub fn merge_payload(download: Value, listing: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = match download {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in listing {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

// ---------------------------------------------------------------------------
// Sidecar documents
// ---------------------------------------------------------------------------

/// A raw sidecar JSON file read back from disk during writeback.
#[derive(Debug, Clone)]
pub struct Sidecar {
    pub id: ScriptId,
    /// Last-known body as stored by the previous sync.
    pub code: String,
    /// The whole document, reused as the PUT payload on writeback.
    pub payload: Map<String, Value>,
}

impl Sidecar {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let value: Value = serde_json::from_str(&raw)?;
        let Value::Object(payload) = value else {
            return Err(ModelError::BadSidecar {
                path: path.to_path_buf(),
                reason: "top level is not a JSON object".to_string(),
            });
        };

        let id = payload
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| ModelError::BadSidecar {
                path: path.to_path_buf(),
                reason: "missing numeric 'id'".to_string(),
            })?;
        let code = payload
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            id: ScriptId(id),
            code,
            payload,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shell_extension_mapping() {
        assert_eq!(ShellKind::from_name("powershell").extension(), ".ps1");
        assert_eq!(ShellKind::from_name("python").extension(), ".py");
        assert_eq!(ShellKind::from_name("cmd").extension(), ".bat");
        assert_eq!(ShellKind::from_name("shell").extension(), ".sh");
        assert_eq!(ShellKind::from_name("nushell").extension(), ".nu");
        assert_eq!(ShellKind::from_name("batch-or-cmd").extension(), ".txt");
    }

    #[test]
    fn unknown_shell_keeps_its_name_for_the_tally() {
        assert_eq!(ShellKind::from_name("fish").to_string(), "fish");
        assert_eq!(ShellKind::from_name("").to_string(), "unknown");
    }

    #[test]
    fn record_from_listing_extracts_typed_fields() {
        let entry = json!({
            "id": 7,
            "name": "Cleanup",
            "category": "Maintenance",
            "shell": "powershell",
            "script_type": "userdefined",
            "favorite": false,
        });
        let record = ScriptRecord::from_listing(entry, RecordKind::Script).unwrap();
        assert_eq!(record.id, ScriptId(7));
        assert_eq!(record.name, "Cleanup");
        assert_eq!(record.category.as_deref(), Some("Maintenance"));
        assert_eq!(record.shell, ShellKind::Powershell);
        assert!(record.is_user_defined());
        assert!(record.code.is_none());
        assert_eq!(record.listing.get("favorite"), Some(&json!(false)));
    }

    #[test]
    fn snippet_listing_carries_inline_code() {
        let entry = json!({ "id": 3, "name": "Header", "shell": "python", "code": "pass" });
        let record = ScriptRecord::from_listing(entry, RecordKind::Snippet).unwrap();
        assert_eq!(record.code.as_deref(), Some("pass"));
        assert!(!record.is_user_defined());
    }

    #[test]
    fn blank_category_is_treated_as_none() {
        let entry = json!({ "id": 1, "name": "X", "shell": "shell", "category": "  " });
        let record = ScriptRecord::from_listing(entry, RecordKind::Script).unwrap();
        assert!(record.category.is_none());
    }

    #[test]
    fn listing_without_id_is_rejected() {
        let entry = json!({ "name": "broken" });
        assert!(ScriptRecord::from_listing(entry, RecordKind::Script).is_err());
    }

    #[test]
    fn merge_payload_prefers_listing_fields() {
        let download = json!({ "code": "Write-Host 1", "syntax": "old" });
        let listing = json!({ "id": 7, "name": "Cleanup", "syntax": "new" });
        let Value::Object(listing) = listing else { unreachable!() };
        let merged = merge_payload(download, &listing);
        assert_eq!(merged.get("code"), Some(&json!("Write-Host 1")));
        assert_eq!(merged.get("syntax"), Some(&json!("new")));
        assert_eq!(merged.get("id"), Some(&json!(7)));
    }

    #[test]
    fn sidecar_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("7 - Cleanup.json");
        std::fs::write(&path, r#"{"id": 7, "name": "Cleanup", "code": "Write-Host 1"}"#).unwrap();

        let sidecar = Sidecar::load(&path).unwrap();
        assert_eq!(sidecar.id, ScriptId(7));
        assert_eq!(sidecar.code, "Write-Host 1");
        assert_eq!(sidecar.payload.get("name").and_then(Value::as_str), Some("Cleanup"));
    }

    #[test]
    fn sidecar_without_id_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"code": "x"}"#).unwrap();
        assert!(matches!(
            Sidecar::load(&path),
            Err(ModelError::BadSidecar { .. })
        ));
    }
}
