//! Core types shared with the remote test service

use serde::{Deserialize, Serialize};

/// Name given to every environment created for a local run
pub const TEMPORARY_ENVIRONMENT_NAME: &str = "temporary-env-for-custom-url-via-CLI";

/// Crowd used for local runs
pub const AUTOMATION_CROWD: &str = "automation";

/// Test environment record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub default: bool,
}

/// Body for creating an environment
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentParams {
    pub name: String,
    pub url: String,
}

impl EnvironmentParams {
    /// Parameters for a CLI-created temporary environment
    pub fn temporary(url: &str) -> Self {
        Self {
            name: TEMPORARY_ENVIRONMENT_NAME.to_string(),
            url: url.to_string(),
        }
    }
}

/// A test reference: either a numeric test ID or a symbolic name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestRef {
    Numeric(i64),
    Symbolic(String),
}

impl TestRef {
    /// Parse a user-supplied reference. Anything that is not an integer is
    /// kept as a symbolic reference.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(id) => TestRef::Numeric(id),
            Err(_) => TestRef::Symbolic(s.to_string()),
        }
    }
}

impl std::fmt::Display for TestRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestRef::Numeric(id) => write!(f, "{}", id),
            TestRef::Symbolic(name) => write!(f, "{}", name),
        }
    }
}

/// Parameters for creating a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParams {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<TestRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub crowd: String,
    pub browsers: Vec<String>,
    pub environment_id: i64,
}

/// Run lifecycle state as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Queued,
    Validating,
    InProgress,
    SendingWebhooks,
    Complete,
    Aborted,
    Error,
    #[serde(other)]
    Unknown,
}

impl RunState {
    /// Whether the service will not move the run any further
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Complete | RunState::Aborted | RunState::Error)
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::Queued
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Queued => write!(f, "queued"),
            RunState::Validating => write!(f, "validating"),
            RunState::InProgress => write!(f, "in_progress"),
            RunState::SendingWebhooks => write!(f, "sending_webhooks"),
            RunState::Complete => write!(f, "complete"),
            RunState::Aborted => write!(f, "aborted"),
            RunState::Error => write!(f, "error"),
            RunState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Run outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunResult {
    NoResult,
    Passed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl Default for RunResult {
    fn default() -> Self {
        Self::NoResult
    }
}

impl std::fmt::Display for RunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunResult::NoResult => write!(f, "no_result"),
            RunResult::Passed => write!(f, "passed"),
            RunResult::Failed => write!(f, "failed"),
            RunResult::Unknown => write!(f, "unknown"),
        }
    }
}

/// Progress counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    #[serde(default)]
    pub percent: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub complete: u32,
    #[serde(default)]
    pub no_result: u32,
}

/// Run status as returned by run creation and status queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub id: i64,
    #[serde(default)]
    pub state: RunState,
    #[serde(default)]
    pub result: RunResult,
    #[serde(default)]
    pub current_progress: Option<RunProgress>,
    #[serde(default)]
    pub frontend_url: Option<String>,
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Finished and neither failed nor cut short
    pub fn is_successful(&self) -> bool {
        self.state == RunState::Complete && self.result != RunResult::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_ref_parse() {
        assert_eq!(TestRef::parse("273861"), TestRef::Numeric(273861));
        assert_eq!(
            TestRef::parse("checkout-flow"),
            TestRef::Symbolic("checkout-flow".to_string())
        );
    }

    #[test]
    fn test_run_params_serialize_mixed_tests() {
        let params = RunParams {
            tests: vec![TestRef::Numeric(12), TestRef::Symbolic("login".into())],
            tags: vec![],
            crowd: AUTOMATION_CROWD.to_string(),
            browsers: vec!["chrome_1440_900".into()],
            environment_id: 7,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["tests"], serde_json::json!([12, "login"]));
        assert_eq!(json["environment_id"], 7);
        assert!(json.get("tags").is_none());
    }

    #[test]
    fn test_run_status_tolerates_unknown_state() {
        let status: RunStatus =
            serde_json::from_str(r#"{"id": 5, "state": "warming_up", "result": "passed"}"#).unwrap();
        assert_eq!(status.state, RunState::Unknown);
        assert!(!status.is_finished());
    }

    #[test]
    fn test_run_status_success() {
        let status: RunStatus =
            serde_json::from_str(r#"{"id": 5, "state": "complete", "result": "passed"}"#).unwrap();
        assert!(status.is_finished());
        assert!(status.is_successful());

        let failed: RunStatus =
            serde_json::from_str(r#"{"id": 5, "state": "complete", "result": "failed"}"#).unwrap();
        assert!(!failed.is_successful());
    }

    #[test]
    fn test_environment_missing_optional_fields() {
        let env: Environment =
            serde_json::from_str(r#"{"id": 3, "name": "staging"}"#).unwrap();
        assert_eq!(env.url, "");
        assert!(!env.default);
    }

    #[test]
    fn test_environment_created_without_name() {
        let env: Environment =
            serde_json::from_str(r#"{"id": 8, "url": "https://abc.loca.lt"}"#).unwrap();
        assert_eq!(env.id, 8);
        assert_eq!(env.name, "");
    }
}
