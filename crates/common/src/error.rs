//! Error types for rflocal

use thiserror::Error;

/// Result type alias using the rflocal Error
pub type Result<T> = std::result::Result<T, Error>;

/// rflocal error types
///
/// Every variant is terminal for the current invocation. Nothing in the
/// library retries on its own.
#[derive(Error, Debug)]
pub enum Error {
    #[error("git {command} failed: {output}")]
    Repository { command: String, output: String },

    #[error("repository has no configured remote")]
    NoRemote,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("tunnel error: {0}")]
    Tunnel(String),

    #[error("environment {operation} failed: {message}")]
    Environment { operation: String, message: String },

    #[error("run {operation} failed: {message}")]
    Run { operation: String, message: String },

    #[error("run {id} finished with state {state} and result {result}")]
    RunFailed { id: i64, state: String, result: String },

    #[error("could not open browser: {0}")]
    Browser(String),

    #[error("interrupted; temporary environment cleaned up")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn repository(command: impl Into<String>, output: impl Into<String>) -> Self {
        Error::Repository {
            command: command.into(),
            output: output.into(),
        }
    }

    pub fn environment(operation: impl Into<String>, message: impl ToString) -> Self {
        Error::Environment {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn run(operation: impl Into<String>, message: impl ToString) -> Self {
        Error::Run {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_keeps_raw_output() {
        let err = Error::repository("log -1", "fatal: not a git repository");
        assert_eq!(
            err.to_string(),
            "git log -1 failed: fatal: not a git repository"
        );
    }

    #[test]
    fn test_environment_error_names_operation() {
        let err = Error::environment("delete 42", "404 Not Found");
        assert_eq!(err.to_string(), "environment delete 42 failed: 404 Not Found");
    }
}
