//! # rmmsync-api
//!
//! Remote API adapter for the script-management service.
//!
//! [`RemoteApi`] is the seam the engine programs against; [`HttpApi`] is the
//! production implementation over blocking `ureq` calls. The adapter owns the
//! resource-kind quirks: snippets keep their body under `code` while full
//! scripts PUT it as `script_body`, and hidden scripts are included in the
//! listing so they stay mirrored.

pub mod error;
pub mod http;

pub use error::ApiError;
pub use http::HttpApi;

use serde_json::{Map, Value};

use rmmsync_core::{ScriptId, ScriptRecord};

/// Operations the reconciliation engine needs from the remote service.
pub trait RemoteApi {
    /// Lightweight read probe used by the preflight gate.
    fn check_read_access(&self) -> Result<(), ApiError>;

    /// Listing of all scripts, hidden ones included. Entries that cannot be
    /// decoded are dropped with a log line rather than failing the listing.
    fn list_scripts(&self) -> Result<Vec<ScriptRecord>, ApiError>;

    /// Listing of all snippets; bodies are inline.
    fn list_snippets(&self) -> Result<Vec<ScriptRecord>, ApiError>;

    /// Secondary fetch for a full script's body. Returns the download
    /// payload (an object carrying at least `code`).
    fn fetch_script_body(&self, id: ScriptId) -> Result<Value, ApiError>;

    /// PUT the merged payload for a full script. The adapter renames `code`
    /// to the field the script endpoint expects.
    fn update_script(&self, id: ScriptId, payload: Map<String, Value>) -> Result<(), ApiError>;

    /// PUT the merged payload for a snippet (body stays under `code`).
    fn update_snippet(&self, id: ScriptId, payload: Map<String, Value>) -> Result<(), ApiError>;
}
