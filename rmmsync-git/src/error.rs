//! Error types for rmmsync-git.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary could not be spawned at all.
    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    /// A git command exited non-zero.
    #[error("git {args} failed ({status}): {stderr}")]
    Command {
        args: String,
        status: String,
        stderr: String,
    },

    /// Command output was not UTF-8 text.
    #[error("git {args} produced non-UTF-8 output")]
    BadOutput { args: String },

    /// The configured repository path is unusable.
    #[error("invalid repository path: {path}")]
    BadPath { path: PathBuf },
}
