//! Commit the state file to the surrounding git repository after it changes.

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Publishing is turned off or nothing changed
    Skipped,
    /// The file matched what is already committed
    NothingToCommit,
    Committed,
    Pushed,
}

pub struct Publisher {
    enabled: bool,
    push: bool,
    repo_dir: PathBuf,
    /// State file name relative to `repo_dir`
    file_name: String,
}

impl Publisher {
    pub fn new(config: &Config) -> Self {
        let repo_dir = config
            .state_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = config
            .state_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            enabled: config.git_publish,
            push: config.git_push,
            repo_dir,
            file_name,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            push: false,
            repo_dir: PathBuf::from("."),
            file_name: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stage and commit the state file when `changed`; a no-op otherwise.
    pub async fn publish(&self, changed: bool, now: NaiveDateTime) -> Result<PublishOutcome> {
        if !self.enabled || !changed {
            return Ok(PublishOutcome::Skipped);
        }

        let file = self.file_name.as_str();
        self.git(&["add", "--", file]).await?;

        // Exit status 1 means there are staged differences
        let diff = self.run(&["diff", "--cached", "--quiet", "--", file]).await?;
        if diff.status.success() {
            debug!("State file unchanged in git, nothing to commit");
            return Ok(PublishOutcome::NothingToCommit);
        }

        let message = commit_message(now);
        self.git(&["commit", "-m", message.as_str(), "--", file]).await?;
        info!("Committed {}", file);

        if self.push {
            self.git(&["push"]).await?;
            info!("Pushed state update");
            return Ok(PublishOutcome::Pushed);
        }

        Ok(PublishOutcome::Committed)
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .with_context(|| format!("Failed to run git {}", args.join(" ")))
    }

    async fn git(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args).await?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output)
    }
}

pub fn commit_message(now: NaiveDateTime) -> String {
    format!("Update court availability ({})", now.format("%Y-%m-%d %H:%M"))
}
