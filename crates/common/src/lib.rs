//! rflocal Common Library
//!
//! Shared types, errors, service contracts and commit triggers for running
//! test suites against a locally served web app.

pub mod api;
pub mod error;
pub mod git;
pub mod types;

// Re-export commonly used types
pub use api::{EnvironmentClient, RunClient};
pub use error::{Error, Result};
pub use git::{CommitTrigger, RemoteRef, DEFAULT_TRIGGER};
pub use types::*;
