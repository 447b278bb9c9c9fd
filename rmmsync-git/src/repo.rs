//! Subprocess wrapper around one local checkout.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::error::GitError;
use crate::message::summarize_name_status;

/// Result of a push attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Working tree was clean; nothing committed or pushed.
    NothingToCommit,
    /// A commit was created and pushed; carries the commit message.
    Pushed { message: String },
}

/// One local git checkout plus its configured target branch.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
    branch: String,
}

impl GitRepo {
    pub fn new(root: impl Into<PathBuf>, branch: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            branch: branch.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// `true` if a `git` binary is runnable at all.
    pub fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run `git -C <root> <args>`, failing on non-zero exit.
    pub(crate) fn run(&self, args: &[&str]) -> Result<Output, GitError> {
        let rendered = args.join(" ");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| GitError::Spawn {
                args: rendered.clone(),
                source: e,
            })?;
        if !output.status.success() {
            return Err(GitError::Command {
                args: rendered,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Run and return trimmed stdout.
    pub(crate) fn run_stdout(&self, args: &[&str]) -> Result<String, GitError> {
        let rendered = args.join(" ");
        let output = self.run(args)?;
        String::from_utf8(output.stdout)
            .map(|s| s.trim_end().to_string())
            .map_err(|_| GitError::BadOutput { args: rendered })
    }

    /// Run, ignoring the exit status; used for probes where non-zero is an
    /// answer rather than a failure.
    pub(crate) fn probe(&self, args: &[&str]) -> Result<Output, GitError> {
        let rendered = args.join(" ");
        Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| GitError::Spawn {
                args: rendered,
                source: e,
            })
    }

    /// Force-pull: fetch `origin`, then hard-reset the local branch onto
    /// `origin/<branch>`, discarding any local divergence.
    pub fn pull(&self) -> Result<(), GitError> {
        if !self.root.is_dir() {
            return Err(GitError::BadPath {
                path: self.root.clone(),
            });
        }
        log::info!("Starting force pull...");
        self.run(&["fetch", "origin"])?;
        let target = format!("origin/{}", self.branch);
        self.run(&["reset", "--hard", &target])?;
        log::info!(
            "Successfully force-pulled the latest changes from the '{}' branch.",
            self.branch
        );
        Ok(())
    }

    /// Commit and push everything that changed, if anything did.
    ///
    /// Files under `excluded_prefixes` still get committed — they are only
    /// left out of the commit message summary.
    pub fn push(&self, excluded_prefixes: &[&str]) -> Result<PushOutcome, GitError> {
        let status = self.run_stdout(&["status", "--porcelain"])?;
        if status.is_empty() {
            log::info!("No changes to commit.");
            return Ok(PushOutcome::NothingToCommit);
        }

        self.run(&["add", "."])?;
        let staged = self.run_stdout(&["diff", "--cached", "--name-status"])?;
        let message = summarize_name_status(&staged, excluded_prefixes, 5);
        self.run(&["commit", "-m", &message])?;
        log::info!("Committed changes: {message}");
        self.run(&["push", "origin", &self.branch])?;
        log::info!("Changes pushed to branch '{}'", self.branch);
        Ok(PushOutcome::Pushed { message })
    }
}
