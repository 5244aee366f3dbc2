//! Configuration for the SimGuard RPC Proxy.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default upstream RPC; a local node on the usual Ethereum port.
pub const DEFAULT_UPSTREAM_RPC: &str = "http://127.0.0.1:8545";

/// Default listen port, kept off 8545 so a local node can run alongside.
pub const DEFAULT_PORT: u16 = 8645;

#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream wallet / Ethereum RPC URL the proxy wraps
    pub upstream_rpc_url: String,

    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Base URL of the simulation service
    pub simulation_api_url: String,

    /// Optional API key sent as `X-API-KEY`
    pub simulation_api_key: Option<String>,

    /// Give up on a simulation after this many seconds (0 = wait forever).
    /// A timed-out simulation is recorded as an error and the call goes through.
    pub backend_timeout_secs: u64,

    /// Directory holding the request log and settings documents
    pub data_dir: PathBuf,

    /// How often the settings document is re-read, in milliseconds
    pub settings_poll_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            upstream_rpc_url: std::env::var("SIMGUARD_UPSTREAM_RPC")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_RPC.into()),
            host: std::env::var("SIMGUARD_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: match std::env::var("SIMGUARD_PORT") {
                Ok(port) => port.parse().context("Invalid SIMGUARD_PORT")?,
                Err(_) => DEFAULT_PORT,
            },
            simulation_api_url: std::env::var("SIMGUARD_SIMULATION_API")
                .unwrap_or_else(|_| "http://127.0.0.1:9000".into()),
            simulation_api_key: std::env::var("SIMGUARD_SIMULATION_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            backend_timeout_secs: std::env::var("SIMGUARD_BACKEND_TIMEOUT_SECS")
                .unwrap_or_else(|_| "0".into())
                .parse()
                .context("Invalid SIMGUARD_BACKEND_TIMEOUT_SECS")?,
            data_dir: std::env::var("SIMGUARD_DATA_DIR")
                .unwrap_or_else(|_| ".simguard".into())
                .into(),
            settings_poll_ms: std::env::var("SIMGUARD_SETTINGS_POLL_MS")
                .unwrap_or_else(|_| "1000".into())
                .parse()
                .unwrap_or(1000),
        })
    }

    pub fn backend_timeout(&self) -> Option<Duration> {
        (self.backend_timeout_secs > 0).then(|| Duration::from_secs(self.backend_timeout_secs))
    }

    pub fn settings_poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings_poll_ms.max(50))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_does_not_collide_with_upstream() {
        assert_eq!(DEFAULT_PORT, 8645);
        assert!(!DEFAULT_UPSTREAM_RPC.ends_with(&format!(":{DEFAULT_PORT}")));
    }

    #[test]
    fn test_timeout_and_poll_interval() {
        let mut config = Config {
            upstream_rpc_url: DEFAULT_UPSTREAM_RPC.into(),
            host: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            simulation_api_url: "http://127.0.0.1:9000".into(),
            simulation_api_key: None,
            backend_timeout_secs: 0,
            data_dir: ".simguard".into(),
            settings_poll_ms: 10,
        };
        assert_eq!(config.listen_addr(), "127.0.0.1:8645");
        assert_eq!(config.backend_timeout(), None);
        assert_eq!(config.settings_poll_interval(), Duration::from_millis(50));

        config.backend_timeout_secs = 3;
        assert_eq!(config.backend_timeout(), Some(Duration::from_secs(3)));
    }
}
