//! Configuration loading
//!
//! Layers a TOML file with `LEDGER_`-prefixed environment variables and an
//! optional `.env` file. The client consumes this surface; it does not own
//! credential provisioning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration for building a [`crate::client::Client`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the network profile to use.
    #[serde(default)]
    pub profile: String,

    /// Named network profiles.
    #[serde(default)]
    pub networks: HashMap<String, NetworkProfile>,

    /// Operator credentials, if provided through config.
    #[serde(default)]
    pub operator: Option<OperatorConfig>,

    /// Retry tuning for the execution engine.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-attempt request deadline in milliseconds. Zero disables it.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// A named network profile: ordered node list, mirror endpoint, ledger id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub nodes: Vec<NodeEntry>,

    /// Mirror service address for this network.
    #[serde(default)]
    pub mirror: String,

    /// Hex-encoded ledger identifier.
    #[serde(default)]
    pub ledger_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Node account identifier in `shard.realm.num` form.
    pub account_id: String,
    /// Socket address of the node.
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Operator account identifier in `shard.realm.num` form.
    pub account_id: String,
    /// Hex-encoded private key.
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_min_backoff_ms")]
    pub min_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_backoff_ms: default_min_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_min_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    8_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl ClientConfig {
    /// Load from `LEDGER_CONFIG` (default `ledger.toml`, optional) layered
    /// with `LEDGER_`-prefixed environment variables. Reads `.env` first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var("LEDGER_CONFIG").unwrap_or_else(|_| "ledger".to_string());
        Self::build(config::File::with_name(&path).required(false))
    }

    /// Load from an explicit file path, still layered with the environment.
    pub fn from_file(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::build(config::File::with_name(path))
    }

    fn build(file: config::File<config::FileSourceFile, config::FileFormat>) -> Result<Self> {
        config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("LEDGER").separator("__"))
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| Error::config(e.to_string()))
    }

    /// The selected network profile.
    pub fn selected_profile(&self) -> Result<&NetworkProfile> {
        self.networks
            .get(&self.profile)
            .ok_or_else(|| Error::config(format!("unknown network profile `{}`", self.profile)))
    }
}
