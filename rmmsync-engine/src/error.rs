//! Error types for rmmsync-engine.

use std::path::PathBuf;

use thiserror::Error;

use rmmsync_api::ApiError;
use rmmsync_core::ModelError;
use rmmsync_git::GitError;

/// All errors that can abort a pipeline run.
///
/// Per-item failures (one body fetch, one writeback PUT, one unreadable
/// sidecar) are not represented here — they are logged, counted in the run
/// report and skipped.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A listing call failed; nothing can be reconciled without it.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A git pull failed; continuing would sync against a stale tree.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// A payload or sidecar was structurally unusable.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error while writing a sidecar.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`EngineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}
