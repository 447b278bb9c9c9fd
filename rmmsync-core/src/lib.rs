//! # rmmsync-core
//!
//! Shared domain model for the rmmsync pipeline: environment-derived
//! configuration, script/snippet records, sidecar documents and filename
//! sanitization.

pub mod config;
pub mod error;
pub mod sanitize;
pub mod types;

pub use config::{Config, Toggles};
pub use error::{ConfigError, ModelError};
pub use sanitize::{sanitize_filename, Sanitized};
pub use types::{merge_payload, RecordKind, ScriptId, ScriptRecord, ShellKind, Sidecar};
