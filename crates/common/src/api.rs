//! Capability contracts for the remote test service
//!
//! The orchestrator only ever talks to the service through these traits, so
//! it can be driven by the HTTP client in the CLI or by an in-memory fake.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Environment, RunParams, RunStatus};

/// Environment management
#[async_trait]
pub trait EnvironmentClient: Send + Sync {
    /// Create a temporary environment pointing at `url`
    async fn create_temporary_environment(&self, url: &str) -> Result<Environment>;

    /// Whether the environment is the account default
    async fn is_environment_default(&self, id: i64) -> Result<bool>;

    /// Request a default-flag transition
    async fn set_environment_default(&self, id: i64, default: bool) -> Result<()>;

    /// Delete an environment. Not guaranteed to be idempotent.
    async fn delete_environment(&self, id: i64) -> Result<()>;
}

/// Run management
#[async_trait]
pub trait RunClient: Send + Sync {
    async fn create_run(&self, params: &RunParams) -> Result<RunStatus>;

    async fn run_status(&self, id: i64) -> Result<RunStatus>;
}
