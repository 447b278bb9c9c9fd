//! # rmmsync-git
//!
//! Version control adapter for the mirror checkout. Wraps the `git` binary
//! via subprocess calls — the mirror repo is an ordinary checkout operators
//! also use by hand, so driving the same tool they do keeps behavior exact.
//!
//! The pull is deliberately destructive (`fetch` + `reset --hard`): by the
//! time it runs, local edits have either been pushed to the API by the
//! previous run's writeback step or are about to be detected from the
//! sidecars, so the Git remote is authoritative for the working tree.

pub mod error;
pub mod health;
pub mod message;
pub mod repo;

pub use error::GitError;
pub use health::{HealthIssue, HealthReport, Severity};
pub use message::summarize_name_status;
pub use repo::{GitRepo, PushOutcome};
