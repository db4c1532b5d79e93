//! Configuration management for the contribution exporter
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, an optional TOML file,
//! `CBNG_MONITORING_` environment variables and command-line arguments.

use crate::cli::Cli;
use crate::core::PollTarget;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the HTTP server.
    pub server: ServerConfig,
    /// Configuration for the outbound wiki API client.
    pub api: ApiConfig,
    /// Accounts polled on every scrape.
    pub targets: Vec<PollTarget>,
}

/// Configuration for the HTTP server exposing `/metrics` and `/health`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the server binds to. Port 0 picks a free port.
    pub listen_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

/// Configuration for the wiki action API client.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// URL scheme used to reach `{domain}/w/api.php`.
    pub scheme: String,
    /// Replaces `{scheme}://{domain}` for every target when set.
    pub base_url: Option<String>,
    /// Value of the `User-Agent` header sent with each query.
    pub user_agent: String,
    /// Per-request timeout. The HTTP client default applies when unset.
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            base_url: None,
            user_agent: "ClueBot NG Monitoring".to_string(),
            timeout_seconds: None,
        }
    }
}

impl Config {
    /// Loads the application configuration, layering defaults, the optional
    /// TOML file named by the CLI, environment variables, and the CLI itself.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            // A named file must exist.
            figment = figment.merge(Toml::file_exact(path));
        }
        let config: Config = figment
            // e.g. CBNG_MONITORING_SERVER__LISTEN_ADDRESS=127.0.0.1:9000
            .merge(Env::prefixed("CBNG_MONITORING_").split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the exporter cannot serve.
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            anyhow::bail!("at least one poll target must be configured");
        }
        for target in &self.targets {
            if target.username.trim().is_empty() {
                anyhow::bail!("poll target on '{}' has an empty username", target.domain);
            }
            if target.domain.trim().is_empty() {
                anyhow::bail!("poll target '{}' has an empty domain", target.username);
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            targets: PollTarget::defaults(),
        }
    }
}
