//! Local run orchestration
//!
//! Every run against a local app follows the same sequence:
//!
//! ```text
//! resolve tunnel config -> open tunnel -> create temporary environment
//!     -> create run (or open edit session) -> delete environment -> close tunnel
//! ```
//!
//! The temporary environment is deleted exactly once on every path that got
//! far enough to create it, whatever happens to the run. That includes a
//! panic inside the run and an interrupt (Ctrl-C) while it is in flight.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

use rflocal_common::{
    EnvironmentClient, Error, Result, RunClient, RunParams, RunStatus, TestRef, AUTOMATION_CROWD,
};

use crate::browsers::expand_browsers;
use crate::config::{RunnerConfig, TunnelConfig};
use crate::launcher::{BrowserLauncher, SystemBrowser};
use crate::monitor::monitor_run;
use crate::tunnel::{LocalTunnelProvider, Tunnel, TunnelProvider};

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
type Interrupt = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// What the user asked to run
#[derive(Debug, Clone, Default)]
pub struct LocalRunContext {
    /// Selected tests
    pub tests: Vec<TestRef>,

    /// Tag filters
    pub tags: Vec<String>,

    /// Browser identifiers, possibly comma separated or family shorthands
    pub browsers: Vec<String>,

    /// Environment chosen by the caller. Local runs always replace it.
    pub environment_id: Option<i64>,

    /// Return right after the run is created instead of monitoring it
    pub background: bool,
}

impl LocalRunContext {
    /// Checks that can fail before anything is provisioned
    fn validate_for_run(&self) -> Result<()> {
        if self.tests.is_empty() && self.tags.is_empty() {
            return Err(Error::run(
                "parameter building",
                "no tests or tags selected; pass --test or --tag",
            ));
        }
        Ok(())
    }

    fn edit_target(&self) -> Result<&TestRef> {
        self.tests.first().ok_or_else(|| {
            Error::run("edit", "no test selected; pass --test with the test to edit")
        })
    }
}

/// Orchestrates tunnel, temporary environment and run
pub struct LocalRunner {
    environments: Arc<dyn EnvironmentClient>,
    runs: Arc<dyn RunClient>,
    tunnels: Arc<dyn TunnelProvider>,
    launcher: Arc<dyn BrowserLauncher>,
    env_lookup: EnvLookup,
    interrupt: Interrupt,
    config: RunnerConfig,
}

impl LocalRunner {
    /// Create a runner using the localtunnel client, the system browser and
    /// the process environment
    pub fn new(environments: Arc<dyn EnvironmentClient>, runs: Arc<dyn RunClient>) -> Self {
        Self {
            environments,
            runs,
            tunnels: Arc::new(LocalTunnelProvider),
            launcher: Arc::new(SystemBrowser),
            env_lookup: Arc::new(|key: &str| std::env::var(key).ok()),
            interrupt: Arc::new(|| ctrl_c().boxed()),
            config: RunnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tunnel_provider(mut self, tunnels: Arc<dyn TunnelProvider>) -> Self {
        self.tunnels = tunnels;
        self
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Replace where tunnel settings are read from
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env_lookup = Arc::new(lookup);
        self
    }

    /// Replace the signal that cancels an in-flight run or edit session
    pub fn with_interrupt<F, Fut>(mut self, interrupt: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.interrupt = Arc::new(move || interrupt().boxed());
        self
    }

    /// Resolve host, port and tunnel client settings
    pub fn resolve_tunnel_config(&self) -> Result<TunnelConfig> {
        TunnelConfig::from_lookup(|key| (self.env_lookup)(key))
    }

    /// Open a tunnel to the local app
    pub async fn open_tunnel(&self, config: &TunnelConfig) -> Result<Box<dyn Tunnel>> {
        self.tunnels.open(config).await
    }

    /// Create the temporary environment for `tunnel_url` and return its id
    pub async fn provision_environment(&self, tunnel_url: &str) -> Result<i64> {
        let environment = self
            .environments
            .create_temporary_environment(tunnel_url)
            .await?;

        info!(
            "Created temporary environment {} ({}) for {}",
            environment.id, environment.name, tunnel_url
        );
        if environment.default {
            warn!(
                "Temporary environment {} was made the account default",
                environment.id
            );
        }
        Ok(environment.id)
    }

    /// Assemble run parameters for the temporary environment
    pub fn build_run_params(&self, ctx: &LocalRunContext, environment_id: i64) -> Result<RunParams> {
        ctx.validate_for_run()?;

        if let Some(requested) = ctx.environment_id {
            if requested != environment_id {
                info!(
                    "Ignoring environment {} in favor of temporary environment {}",
                    requested, environment_id
                );
            }
        }

        Ok(RunParams {
            tests: ctx.tests.clone(),
            tags: ctx.tags.clone(),
            crowd: AUTOMATION_CROWD.to_string(),
            browsers: expand_browsers(&ctx.browsers),
            environment_id,
        })
    }

    /// Run tests against the local app.
    ///
    /// Returns the created run's status in background mode and the final
    /// status otherwise.
    pub async fn start_run(&self, ctx: &LocalRunContext) -> Result<RunStatus> {
        ctx.validate_for_run()?;

        self.with_local_environment(|environment_id| async move {
            let params = self.build_run_params(ctx, environment_id)?;
            let status = self.runs.create_run(&params).await?;
            info!("Run {} has been created.", status.id);

            if ctx.background {
                return Ok::<_, Error>(status);
            }
            monitor_run(self.runs.as_ref(), status.id, self.config.poll_interval).await
        })
        .await
    }

    /// Open the first selected test for editing against the local app.
    ///
    /// Returns the URL that was opened.
    pub async fn start_interactive_edit(&self, ctx: &LocalRunContext) -> Result<String> {
        let test = ctx.edit_target()?.clone();

        self.with_local_environment(|environment_id| async move {
            let url = edit_url(&self.config.app_url, &test, environment_id);
            info!("Opening {}", url);
            self.launcher.open(&url)?;

            info!(
                "Keeping the tunnel open for {}s while the browser loads",
                self.config.edit_grace_period.as_secs()
            );
            tokio::time::sleep(self.config.edit_grace_period).await;
            Ok::<_, Error>(url)
        })
        .await
    }

    /// Provision tunnel and environment, run `body`, then tear both down.
    ///
    /// A panic in `body` is resumed only after teardown.
    async fn with_local_environment<T, F, Fut>(&self, body: F) -> Result<T>
    where
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let tunnel_config = self.resolve_tunnel_config()?;
        let mut tunnel = self.open_tunnel(&tunnel_config).await?;

        let outcome = self.run_in_environment(tunnel.url(), body).await;

        if let Err(e) = tunnel.close() {
            warn!("Failed to close tunnel {}: {}", tunnel.url(), e);
        }
        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    async fn run_in_environment<T, F, Fut>(
        &self,
        tunnel_url: &str,
        body: F,
    ) -> std::thread::Result<Result<T>>
    where
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let environment_id = match self.provision_environment(tunnel_url).await {
            Ok(id) => id,
            Err(e) => return Ok(Err(e)),
        };
        let environment = TemporaryEnvironment::new(self.environments.clone(), environment_id);

        let outcome = tokio::select! {
            outcome = AssertUnwindSafe(body(environment.id())).catch_unwind() => outcome,
            _ = (self.interrupt)() => {
                warn!("Interrupted, removing temporary environment {}", environment_id);
                Ok(Err(Error::Interrupted))
            }
        };
        if outcome.is_err() {
            error!("Panic while using temporary environment {}", environment_id);
        }

        environment.release().await;
        outcome
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Deletes its environment when released.
///
/// Dropping it unreleased (a future cancelled by its caller) hands deletion
/// to the runtime as a last resort.
struct TemporaryEnvironment {
    client: Arc<dyn EnvironmentClient>,
    id: Option<i64>,
}

impl TemporaryEnvironment {
    fn new(client: Arc<dyn EnvironmentClient>, id: i64) -> Self {
        Self { client, id: Some(id) }
    }

    fn id(&self) -> i64 {
        self.id.unwrap_or_default()
    }

    /// Delete the environment. Failures are logged, never returned, so they
    /// cannot mask the run's own outcome.
    async fn release(mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        match self.client.delete_environment(id).await {
            Ok(()) => info!("Deleted temporary environment {}", id),
            Err(e) => error!("Failed to delete temporary environment {}: {}", id, e),
        }
    }
}

impl Drop for TemporaryEnvironment {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        warn!("Temporary environment {} dropped before release", id);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let client = self.client.clone();
            handle.spawn(async move {
                if let Err(e) = client.delete_environment(id).await {
                    error!("Failed to delete temporary environment {}: {}", id, e);
                }
            });
        }
    }
}

/// Link to a test's editor under a given environment
pub fn edit_url(app_url: &str, test: &TestRef, environment_id: i64) -> String {
    format!(
        "{}/tests/{}/edit?environment_id={}",
        app_url.trim_end_matches('/'),
        test,
        environment_id
    )
}
