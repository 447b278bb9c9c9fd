//! Environment-derived run configuration.
//!
//! Every component takes a `&Config` (or a field of it) instead of reading
//! process-wide environment state. The only place `std::env::var` appears is
//! [`Config::from_env`].
//!
//! Recognized variables:
//!
//! ```text
//! DOMAIN               (required) API base URL; https:// prepended if absent
//! API_TOKEN            (required) X-API-KEY credential
//! SCRIPTPATH           (required) local repository root
//! GIT_PULL_BRANCH      target branch, default "master"
//! ENABLE_GIT_PULL      default true; only the literal "false" disables
//! ENABLE_GIT_PUSH      default true
//! ENABLE_WRITEBACK     default true
//! ENABLE_WRITETOFILE   default true
//! ```

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

/// The four independent step toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    pub git_pull: bool,
    pub git_push: bool,
    pub writeback: bool,
    pub write_to_file: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            git_pull: true,
            git_push: true,
            writeback: true,
            write_to_file: true,
        }
    }
}

impl Toggles {
    /// All four toggles off — the read-and-compare-only dry run.
    pub fn dry_run() -> Self {
        Self {
            git_pull: false,
            git_push: false,
            writeback: false,
            write_to_file: false,
        }
    }
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL including scheme, no trailing slash.
    pub api_base: String,
    pub api_token: String,
    /// Local repository root (the Git checkout holding the mirror).
    pub repo_path: PathBuf,
    pub branch: String,
    pub toggles: Toggles,
}

impl Config {
    /// Build a config from the process environment.
    ///
    /// All missing required variables are reported in a single error so the
    /// operator fixes them in one pass.
    pub fn from_env() -> Result<Self, ConfigError> {
        let domain = non_empty_var("DOMAIN");
        let api_token = non_empty_var("API_TOKEN");
        let script_path = non_empty_var("SCRIPTPATH");

        let missing: Vec<String> = [
            ("DOMAIN", &domain),
            ("API_TOKEN", &api_token),
            ("SCRIPTPATH", &script_path),
        ]
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| (*name).to_string())
        .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars { vars: missing });
        }

        let branch = non_empty_var("GIT_PULL_BRANCH").unwrap_or_else(|| "master".to_string());
        let toggles = Toggles {
            git_pull: flag_enabled("ENABLE_GIT_PULL"),
            git_push: flag_enabled("ENABLE_GIT_PUSH"),
            writeback: flag_enabled("ENABLE_WRITEBACK"),
            write_to_file: flag_enabled("ENABLE_WRITETOFILE"),
        };

        Ok(Self {
            api_base: normalize_base(&domain.unwrap_or_default()),
            api_token: api_token.unwrap_or_default(),
            repo_path: PathBuf::from(script_path.unwrap_or_default()),
            branch,
            toggles,
        })
    }

    /// Host portion of the API base, for the TCP reachability probe.
    pub fn api_host(&self) -> Result<String, ConfigError> {
        let stripped = self
            .api_base
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let host = stripped.split('/').next().unwrap_or_default();
        if host.is_empty() {
            return Err(ConfigError::BadDomain {
                domain: self.api_base.clone(),
            });
        }
        Ok(host.to_string())
    }

    /// Token rendered safe for diagnostics: `abc********xyz`.
    pub fn obfuscated_token(&self) -> String {
        let t = &self.api_token;
        if t.len() <= 6 {
            return "*".repeat(t.len());
        }
        format!("{}{}{}", &t[..3], "*".repeat(t.len() - 6), &t[t.len() - 3..])
    }
}

/// `https://` is assumed when the operator gives a bare hostname.
fn normalize_base(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Toggles default on; only the literal string `false` disables.
fn flag_enabled(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => !v.trim().eq_ignore_ascii_case("false"),
        Err(_) => true,
    }
}

/// One-line operator hint for each required variable, printed on failure.
pub fn variable_hint(name: &str) -> Option<&'static str> {
    match name {
        "DOMAIN" => Some("DOMAIN: the URL of the RMM API (e.g. api-rmm.example.com)"),
        "API_TOKEN" => Some("API_TOKEN: an API token with script list + manage permissions"),
        "SCRIPTPATH" => Some("SCRIPTPATH: the local folder holding the Git checkout"),
        _ => None,
    }
}
