//! Commit triggers
//!
//! Decides from the HEAD commit message whether a run should be started and
//! which tags it should be filtered by. A commit authorizes a run when its
//! subject contains the trigger token anywhere; `#name` tokens after the
//! trigger become run tags.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

use crate::error::{Error, Result};

/// Trigger used when none is configured
pub const DEFAULT_TRIGGER: &str = "@rainforest";

static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s,])#([\w-]+)").expect("tag pattern is valid"));

/// A configured git remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRef {
    pub name: String,
    pub url: String,
}

/// Trigger decisions over the last commit of a repository
#[derive(Debug, Clone)]
pub struct CommitTrigger {
    trigger: String,
    last_commit: String,
    repo_dir: Option<PathBuf>,
}

impl CommitTrigger {
    /// Read the last commit of the repository in the current directory
    pub fn new(trigger: impl Into<String>) -> Result<Self> {
        let mut git = Self {
            trigger: trigger.into(),
            last_commit: String::new(),
            repo_dir: None,
        };
        git.refresh_last_commit()?;
        Ok(git)
    }

    /// Read the last commit of the repository at `dir`
    pub fn with_dir(trigger: impl Into<String>, dir: impl Into<PathBuf>) -> Result<Self> {
        let mut git = Self {
            trigger: trigger.into(),
            last_commit: String::new(),
            repo_dir: Some(dir.into()),
        };
        git.refresh_last_commit()?;
        Ok(git)
    }

    /// Build from an already known commit message, without touching git
    pub fn from_message(trigger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            last_commit: message.into(),
            repo_dir: None,
        }
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn last_commit(&self) -> &str {
        &self.last_commit
    }

    /// Re-read the HEAD commit subject
    pub fn refresh_last_commit(&mut self) -> Result<()> {
        let output = run_git(self.repo_dir.as_deref(), &["log", "-1", "--format=%s"])?;
        if !output.status.success() {
            return Err(Error::repository("log -1", raw_output(&output)));
        }

        let subject = String::from_utf8_lossy(&output.stdout);
        self.last_commit = subject.trim_end_matches(['\r', '\n']).to_string();
        debug!("Last commit: {}", self.last_commit);
        Ok(())
    }

    /// Configured remotes, in the order they were added
    pub fn remotes(&self) -> Result<Vec<RemoteRef>> {
        let output = run_git(
            self.repo_dir.as_deref(),
            &["config", "--local", "--get-regexp", r"^remote\..*\.url$"],
        )?;

        // `git config --get-regexp` exits with 1 when nothing matches
        if !output.status.success() {
            if output.status.code() == Some(1) && output.stdout.is_empty() {
                return Ok(Vec::new());
            }
            return Err(Error::repository("config --get-regexp", raw_output(&output)));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(parse_remotes(&listing))
    }

    /// URL of the first configured remote
    pub fn remote_url(&self) -> Result<String> {
        self.remotes()?
            .into_iter()
            .next()
            .map(|remote| remote.url)
            .ok_or(Error::NoRemote)
    }

    /// Whether the trigger occurs anywhere in the last commit.
    ///
    /// Plain substring containment: a trigger embedded in a longer word still
    /// matches, so triggers should be distinctive.
    pub fn is_triggered(&self) -> bool {
        self.last_commit.contains(&self.trigger)
    }

    /// Tags following the trigger, in order of appearance
    pub fn extract_tags(&self) -> Vec<String> {
        let Some(pos) = self.last_commit.find(&self.trigger) else {
            return Vec::new();
        };
        let rest = &self.last_commit[pos + self.trigger.len()..];

        TAG_PATTERN
            .captures_iter(rest)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

fn run_git(dir: Option<&Path>, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    cmd.output()
        .map_err(|e| Error::repository(args.join(" "), e.to_string()))
}

fn raw_output(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    format!("{}{}", stdout, stderr).trim().to_string()
}

fn parse_remotes(listing: &str) -> Vec<RemoteRef> {
    listing
        .lines()
        .filter_map(|line| {
            let (key, url) = line.trim().split_once(char::is_whitespace)?;
            let name = key.strip_prefix("remote.")?.strip_suffix(".url")?;
            Some(RemoteRef {
                name: name.to_string(),
                url: url.trim().to_string(),
            })
        })
        .collect()
}
