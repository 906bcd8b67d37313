//! Local Commands
//!
//! Runs and edits tests against an app served from this machine.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use rflocal_common::{CommitTrigger, TestRef, DEFAULT_TRIGGER};
use rflocal_runner::{LocalRunContext, LocalRunner, RunnerConfig};

use crate::client::ApiClient;
use crate::output::{print_item, print_success, OutputFormat};

#[derive(Subcommand)]
pub enum LocalCommands {
    /// Run tests against the local app
    Run(LocalRunArgs),

    /// Open a test in the editor against the local app
    Edit(LocalEditArgs),
}

#[derive(Args)]
pub struct LocalRunArgs {
    /// Test ID or name to run (repeatable)
    #[arg(long = "test")]
    pub tests: Vec<String>,

    /// Run tests with this tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Browser or browser family, comma separated or repeated
    #[arg(long = "browser")]
    pub browsers: Vec<String>,

    /// Environment to run against. Replaced by the temporary environment.
    #[arg(long)]
    pub environment_id: Option<i64>,

    /// Do not wait for the run to finish
    #[arg(long)]
    pub background: bool,

    /// Only run when the last commit message contains the trigger
    #[arg(long)]
    pub git_trigger: bool,

    /// Trigger token looked for in the commit message
    #[arg(long, default_value = DEFAULT_TRIGGER)]
    pub trigger_token: String,

    /// Seconds between run status checks
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,
}

#[derive(Args)]
pub struct LocalEditArgs {
    /// Test ID or name to edit
    #[arg(long = "test")]
    pub test: String,

    /// Seconds to keep the tunnel open after opening the browser
    #[arg(long, default_value = "10")]
    pub wait: u64,
}

/// Run a local command. The API client is only built once there is work for
/// it, so a run skipped by `--git-trigger` needs no token.
pub async fn execute<C>(cmd: LocalCommands, client: C, app_url: &str, format: OutputFormat) -> Result<()>
where
    C: FnOnce() -> Result<ApiClient>,
{
    let config = RunnerConfig {
        app_url: app_url.to_string(),
        ..Default::default()
    };

    match cmd {
        LocalCommands::Run(args) => {
            run(args, client, |trigger| CommitTrigger::new(trigger), config, format).await?
        }
        LocalCommands::Edit(args) => {
            let config = RunnerConfig {
                edit_grace_period: Duration::from_secs(args.wait),
                ..config
            };
            let ctx = LocalRunContext {
                tests: vec![TestRef::parse(&args.test)],
                ..Default::default()
            };
            let client = Arc::new(client()?);
            let runner = LocalRunner::new(client.clone(), client).with_config(config);
            let url = runner.start_interactive_edit(&ctx).await?;
            print_success(&format!("Opened {}", url));
        }
    }

    Ok(())
}

async fn run<C, G>(
    args: LocalRunArgs,
    client: C,
    read_commit: G,
    config: RunnerConfig,
    format: OutputFormat,
) -> Result<()>
where
    C: FnOnce() -> Result<ApiClient>,
    G: FnOnce(&str) -> rflocal_common::Result<CommitTrigger>,
{
    let config = RunnerConfig {
        poll_interval: Duration::from_secs(args.poll_interval),
        ..config
    };
    let Some(ctx) = run_context(args, read_commit)? else {
        return Ok(());
    };

    let client = Arc::new(client()?);
    let runner = LocalRunner::new(client.clone(), client).with_config(config);
    let status = runner.start_run(&ctx).await?;

    print_item(&status, format);
    if ctx.background {
        print_success(&format!("Run {} created", status.id));
    } else {
        print_success(&format!("Run {} passed", status.id));
    }
    Ok(())
}

/// Build the run context, or `None` when gated on a commit that does not
/// carry the trigger
fn run_context<G>(args: LocalRunArgs, read_commit: G) -> Result<Option<LocalRunContext>>
where
    G: FnOnce(&str) -> rflocal_common::Result<CommitTrigger>,
{
    let mut tags = args.tags;

    if args.git_trigger {
        let git = read_commit(&args.trigger_token).context("Failed to read the last commit")?;
        if !git.is_triggered() {
            info!(
                "Last commit does not mention {}, not starting a run",
                git.trigger()
            );
            return Ok(None);
        }
        let commit_tags = git.extract_tags();
        info!("Triggered by commit {:?} with tags {:?}", git.last_commit(), commit_tags);
        tags.extend(commit_tags);
    }

    Ok(Some(LocalRunContext {
        tests: args.tests.iter().map(|t| TestRef::parse(t)).collect(),
        tags,
        browsers: args.browsers,
        environment_id: args.environment_id,
        background: args.background,
    }))
}
