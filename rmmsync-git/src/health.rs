//! Repository health gate.
//!
//! Runs before any mutating step. Checks are ordered cheapest-first and the
//! gate stops at the first hard failure; a sync against an unhealthy
//! checkout risks committing garbage or hard-resetting work that was never
//! pushed anywhere.

use std::path::Path;

use crate::error::GitError;
use crate::repo::GitRepo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks the run.
    Error,
    /// Printed, does not block.
    Warning,
}

/// One finding from the health gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthIssue {
    pub severity: Severity,
    pub message: String,
}

/// Outcome of a full gate pass.
#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    pub issues: Vec<HealthIssue>,
}

impl HealthReport {
    /// Healthy means no blocking issue; warnings are allowed through.
    pub fn is_healthy(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|issue| issue.severity == Severity::Error)
    }

    fn error(&mut self, message: impl Into<String>) {
        self.issues.push(HealthIssue {
            severity: Severity::Error,
            message: message.into(),
        });
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.issues.push(HealthIssue {
            severity: Severity::Warning,
            message: message.into(),
        });
    }
}

impl GitRepo {
    /// Run the gate. Returns the collected findings; the run is aborted by
    /// the caller when [`HealthReport::is_healthy`] is false. Stops probing
    /// at the first blocking finding.
    pub fn health_check(&self) -> Result<HealthReport, GitError> {
        let mut report = HealthReport::default();

        if !GitRepo::git_available() {
            report.error("the 'git' command is not available");
            return Ok(report);
        }

        if !self
            .probe(&["rev-parse", "--is-inside-work-tree"])?
            .status
            .success()
        {
            report.error(format!(
                "'{}' is not a valid Git repository",
                self.root().display()
            ));
            return Ok(report);
        }

        if index_lock_path(self.root()).exists() {
            report.error("Git index is locked (stale index.lock); possibly a failed operation");
            return Ok(report);
        }

        // `--show-current-patch` succeeds only while a rebase is underway.
        if self
            .probe(&["rebase", "--show-current-patch"])?
            .status
            .success()
        {
            report.error("rebase in progress; complete or abort it first");
            return Ok(report);
        }

        if !self.run_stdout(&["ls-files", "--unmerged"])?.is_empty() {
            report.error("unresolved merge conflicts present");
            return Ok(report);
        }

        if !self
            .run_stdout(&["ls-files", "--others", "--exclude-standard"])?
            .is_empty()
        {
            report.error("untracked files present; the sync refuses to run in a dirty workspace");
            return Ok(report);
        }

        // Uncommitted tracked changes are expected noise after a partial
        // run; report and continue.
        if has_tracked_changes(&self.run_stdout(&["status", "--porcelain"])?) {
            report.warning("uncommitted changes present in tracked files");
        }

        let current_branch = self.run_stdout(&["symbolic-ref", "--short", "HEAD"])?;
        if current_branch != self.branch() {
            report.error(format!(
                "on branch '{current_branch}', expected '{}'",
                self.branch()
            ));
            return Ok(report);
        }

        let remote = self.probe(&["remote", "show", "origin"])?;
        if !remote.status.success() || remote.stdout.is_empty() {
            report.error("remote 'origin' is not configured or not reachable");
            return Ok(report);
        }

        let behind_range = format!("HEAD..origin/{}", self.branch());
        let behind = self.run_stdout(&["rev-list", "--count", &behind_range])?;
        if behind.trim() != "0" {
            report.error(format!(
                "local HEAD is {} commit(s) behind origin/{}; pull first",
                behind.trim(),
                self.branch()
            ));
            return Ok(report);
        }

        Ok(report)
    }
}

fn index_lock_path(root: &Path) -> std::path::PathBuf {
    root.join(".git").join("index.lock")
}

/// Porcelain lines for tracked files, i.e. everything except `??` entries.
fn has_tracked_changes(porcelain: &str) -> bool {
    porcelain
        .lines()
        .any(|line| !line.is_empty() && !line.starts_with("??"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_only_porcelain_is_not_a_tracked_change() {
        assert!(!has_tracked_changes("?? scripts/new.ps1\n?? junk.txt"));
    }

    #[test]
    fn modified_entries_count_as_tracked_changes() {
        assert!(has_tracked_changes(" M scripts/a.ps1"));
        assert!(has_tracked_changes("D  snippets/b.sh\n?? other"));
    }

    #[test]
    fn report_with_only_warnings_is_healthy() {
        let mut report = HealthReport::default();
        report.warning("uncommitted changes");
        assert!(report.is_healthy());
        report.error("boom");
        assert!(!report.is_healthy());
    }
}
