//! Runner configuration

use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use rflocal_common::{Error, Result};

pub const HOST_VAR: &str = "RFLOCAL_HOST";
pub const PORT_VAR: &str = "RFLOCAL_PORT";
pub const TUNNEL_BIN_VAR: &str = "RFLOCAL_TUNNEL_BIN";
pub const TUNNEL_TIMEOUT_VAR: &str = "RFLOCAL_TUNNEL_TIMEOUT";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TUNNEL_BIN: &str = "lt";
const DEFAULT_TUNNEL_TIMEOUT_SECS: u64 = 30;

/// Where the local app listens and how to reach the tunnel client.
///
/// Values are always resolved: defaults are applied here and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    /// Host the local app listens on
    pub host: String,

    /// Port the local app listens on
    pub port: u16,

    /// Tunnel client executable
    pub binary: PathBuf,

    /// How long to wait for the tunnel to report its public URL
    pub startup_timeout: Duration,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            binary: PathBuf::from(DEFAULT_TUNNEL_BIN),
            startup_timeout: Duration::from_secs(DEFAULT_TUNNEL_TIMEOUT_SECS),
        }
    }
}

impl TunnelConfig {
    /// Resolve from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        match get(HOST_VAR) {
            Some(host) => config.host = host.trim().to_string(),
            None => info!("{} not set, falling back to {}", HOST_VAR, DEFAULT_HOST),
        }

        match get(PORT_VAR) {
            Some(port) => {
                config.port = port.trim().parse::<u16>().map_err(|_| {
                    Error::Config(format!("cannot use {} value of {:?}", PORT_VAR, port))
                })?;
            }
            None => info!("{} not set, falling back to {}", PORT_VAR, DEFAULT_PORT),
        }

        if let Some(binary) = get(TUNNEL_BIN_VAR) {
            config.binary = PathBuf::from(binary);
        }

        if let Some(secs) = get(TUNNEL_TIMEOUT_VAR) {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("cannot use {} value of {:?}", TUNNEL_TIMEOUT_VAR, secs))
            })?;
            config.startup_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Configuration for the local runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Web app base URL, used to build test edit links
    pub app_url: String,

    /// How long to keep the environment alive after opening an edit session
    pub edit_grace_period: Duration,

    /// Interval between run status polls
    pub poll_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            app_url: "https://app.rainforestqa.com".to_string(),
            edit_grace_period: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TunnelConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3000);
        assert_eq!(config.binary, PathBuf::from("lt"));
    }

    #[test]
    fn test_explicit_values() {
        let config = TunnelConfig::from_lookup(lookup(&[
            (HOST_VAR, "app.local"),
            (PORT_VAR, "8080"),
            (TUNNEL_TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.host, "app.local");
        assert_eq!(config.port, 8080);
        assert_eq!(config.startup_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config =
            TunnelConfig::from_lookup(lookup(&[(HOST_VAR, ""), (PORT_VAR, "  ")])).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_non_numeric_port() {
        let err = TunnelConfig::from_lookup(lookup(&[(PORT_VAR, "three-thousand")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_out_of_range_port() {
        let err = TunnelConfig::from_lookup(lookup(&[(PORT_VAR, "70000")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
