//! Preflight gate — refuses to start a run that could corrupt the checkout
//! or silently delete content.
//!
//! Order: connectivity → credential → mirror layout/permissions → git
//! health. Config presence is already guaranteed by `Config::from_env`.
//! Every failure is a hard stop; git warnings are returned for display.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;

use rmmsync_api::{ApiError, RemoteApi};
use rmmsync_core::{Config, ConfigError};
use rmmsync_git::{GitError, GitRepo, Severity};

use crate::error::EngineError;
use crate::store::Mirror;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const API_PORT: u16 = 443;

/// A preflight hard stop.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("unable to connect to {host} on port {port}: {reason}")]
    Unreachable {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("token read access denied: {0}")]
    ReadAccess(#[source] ApiError),

    #[error("mirror layout check failed: {0}")]
    Layout(#[from] EngineError),

    #[error("git health check could not run: {0}")]
    Git(#[from] GitError),

    #[error("git repository is not healthy: {reasons}")]
    GitUnhealthy { reasons: String },
}

/// Run every gate check. Returns the non-blocking warnings collected along
/// the way; any `Err` means no mutating step may run.
pub fn preflight(
    config: &Config,
    api: &dyn RemoteApi,
    mirror: &Mirror,
    repo: &GitRepo,
) -> Result<Vec<String>, PreflightError> {
    let host = config.api_host()?;
    check_reachable(&host)?;
    log::info!("Connectivity to {host} on port {API_PORT} OK.");

    api.check_read_access()
        .map_err(PreflightError::ReadAccess)?;
    log::info!(
        "Token valid for read access: {}",
        config.obfuscated_token()
    );

    mirror.ensure_layout()?;
    log::info!("All mirror folders created and verified.");

    let mut warnings = Vec::new();
    if config.toggles.git_pull || config.toggles.git_push {
        let report = repo.health_check()?;
        let mut errors = Vec::new();
        for issue in &report.issues {
            match issue.severity {
                Severity::Warning => warnings.push(issue.message.clone()),
                Severity::Error => errors.push(issue.message.clone()),
            }
        }
        if !errors.is_empty() {
            return Err(PreflightError::GitUnhealthy {
                reasons: errors.join("; "),
            });
        }
        log::info!("Git repo is healthy.");
    } else {
        log::info!("Skipping Git health check because both pull and push are disabled.");
    }

    Ok(warnings)
}

/// TCP probe with a short timeout; an explicit `host:port` in `DOMAIN`
/// overrides the default HTTPS port.
fn check_reachable(host: &str) -> Result<(), PreflightError> {
    let target = if host.contains(':') {
        host.to_string()
    } else {
        format!("{host}:{API_PORT}")
    };

    let addrs = target
        .to_socket_addrs()
        .map_err(|e| PreflightError::Unreachable {
            host: host.to_string(),
            port: API_PORT,
            reason: e.to_string(),
        })?;

    let mut last_error = "no addresses resolved".to_string();
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(_) => return Ok(()),
            Err(err) => last_error = err.to_string(),
        }
    }
    Err(PreflightError::Unreachable {
        host: host.to_string(),
        port: API_PORT,
        reason: last_error,
    })
}
