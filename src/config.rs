//! Configuration for the reckoning server.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Environment variable holding the listen address.
pub const HOST_ENV: &str = "RECKONING_HOST";
/// Environment variable holding the listen port.
pub const PORT_ENV: &str = "RECKONING_PORT";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Main configuration for the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind to
    pub host: IpAddr,
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Self::parse(
            getenv(HOST_ENV, &defaults.host.to_string()),
            getenv(PORT_ENV, &defaults.port.to_string()),
        )
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self::parse(
            getenv_with(&lookup, HOST_ENV, &defaults.host.to_string()),
            getenv_with(&lookup, PORT_ENV, &defaults.port.to_string()),
        )
    }

    fn parse(host: String, port: String) -> Result<Self, ConfigError> {
        Ok(Self {
            host: host
                .parse()
                .map_err(|e| ConfigError::Parse(format!("{HOST_ENV}={host:?}: {e}")))?,
            port: port
                .parse()
                .map_err(|e| ConfigError::Parse(format!("{PORT_ENV}={port:?}: {e}")))?,
        })
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, host: Option<IpAddr>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

/// Read `var` from the environment, returning `default` when it is unset or empty.
pub fn getenv(var: &str, default: &str) -> String {
    getenv_with(|v| std::env::var(v).ok(), var, default)
}

fn getenv_with<F>(lookup: F, var: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(val) if !val.is_empty() => val,
        _ => default.to_string(),
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
