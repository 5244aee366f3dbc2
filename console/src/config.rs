//! Configuration for the SimGuard Console.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Default listen port, next to the RPC proxy's.
pub const DEFAULT_PORT: u16 = 8646;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory shared with the RPC proxy (request log + settings)
    pub data_dir: PathBuf,

    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            data_dir: std::env::var("SIMGUARD_DATA_DIR")
                .unwrap_or_else(|_| ".simguard".into())
                .into(),
            host: std::env::var("SIMGUARD_CONSOLE_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: match std::env::var("SIMGUARD_CONSOLE_PORT") {
                Ok(port) => port.parse().context("Invalid SIMGUARD_CONSOLE_PORT")?,
                Err(_) => DEFAULT_PORT,
            },
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
