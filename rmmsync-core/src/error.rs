//! Error types for rmmsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a [`crate::Config`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required environment variables are unset or empty.
    #[error("missing environment variable(s): {}", vars.join(", "))]
    MissingVars { vars: Vec<String> },

    /// `DOMAIN` could not be reduced to a connectable host.
    #[error("cannot derive a host from DOMAIN value '{domain}'")]
    BadDomain { domain: String },
}

/// Errors raised while decoding API payloads or sidecar documents.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A listing entry is missing a field the sync depends on.
    #[error("listing entry missing required field '{field}': {entry}")]
    MissingField { field: &'static str, entry: String },

    /// A sidecar JSON document could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sidecar or listing document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A sidecar document is not a JSON object with `id` and `code`.
    #[error("sidecar {path} is not a usable script document: {reason}")]
    BadSidecar { path: PathBuf, reason: String },
}

/// Convenience constructor for [`ModelError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ModelError {
    ModelError::Io {
        path: path.into(),
        source,
    }
}
