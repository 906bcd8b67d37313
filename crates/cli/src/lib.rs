//! rflocal CLI
//!
//! Command-line interface for running remote test suites against a web app
//! served from the local machine.

pub mod client;
pub mod commands;
pub mod output;
