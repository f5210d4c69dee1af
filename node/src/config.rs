//! Service configuration with TOML file support.

use peerlend_types::{AccountId, Amount};
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// An account seeded into the in-memory bank at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DevAccount {
    pub account: String,
    pub balance: u128,
}

impl DevAccount {
    pub fn account_id(&self) -> AccountId {
        AccountId::new(self.account.clone())
    }

    pub fn amount(&self) -> Amount {
        Amount::new(self.balance)
    }
}

/// Configuration for the peerlend service.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the RPC server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// RPC port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to expose the dev faucet endpoint for seeding balances.
    #[serde(default)]
    pub enable_faucet: bool,

    /// Accounts credited into the bank at startup (dev deployments).
    #[serde(default)]
    pub dev_accounts: Vec<DevAccount>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    7207
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ServiceError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ServiceError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        toml::from_str(s).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ServiceConfig is always serializable to TOML")
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            rpc_port: default_rpc_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_faucet: false,
            dev_accounts: Vec::new(),
        }
    }
}
