//! Trigger Command
//!
//! Shows what the last commit says about starting a run.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use rflocal_common::{CommitTrigger, Error, DEFAULT_TRIGGER};

use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct TriggerArgs {
    /// Trigger token looked for in the commit message
    #[arg(long, default_value = DEFAULT_TRIGGER)]
    pub trigger_token: String,
}

/// Trigger decision for the last commit
#[derive(Serialize, Clone)]
pub struct TriggerReport {
    pub commit: String,
    pub trigger: String,
    pub triggered: bool,
    pub tags: Vec<String>,
    pub remote: Option<String>,
}

impl TableDisplay for TriggerReport {
    fn headers() -> Vec<&'static str> {
        vec!["Commit", "Trigger", "Triggered", "Tags", "Remote"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.commit.clone(),
            self.trigger.clone(),
            self.triggered.to_string(),
            self.tags.join(", "),
            self.remote.clone().unwrap_or_else(|| "-".to_string()),
        ]
    }
}

pub async fn execute(args: TriggerArgs, format: OutputFormat) -> Result<()> {
    let git = CommitTrigger::new(args.trigger_token.as_str())
        .context("Failed to read the last commit")?;
    let report = report(&git)?;
    print_item(&report, format);
    Ok(())
}

fn report(git: &CommitTrigger) -> Result<TriggerReport> {
    let remote = match git.remote_url() {
        Ok(url) => Some(url),
        Err(Error::NoRemote) => None,
        Err(e) => return Err(e).context("Failed to list git remotes"),
    };

    Ok(TriggerReport {
        commit: git.last_commit().to_string(),
        trigger: git.trigger().to_string(),
        triggered: git.is_triggered(),
        tags: git.extract_tags(),
        remote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_row() {
        let report = TriggerReport {
            commit: "@rainforest #foo, #bar".into(),
            trigger: DEFAULT_TRIGGER.into(),
            triggered: true,
            tags: vec!["foo".into(), "bar".into()],
            remote: None,
        };
        let row = report.row();
        assert_eq!(row[2], "true");
        assert_eq!(row[3], "foo, bar");
        assert_eq!(row[4], "-");
    }
}
