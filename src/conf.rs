use std::time::Duration;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContractBackend {
    Rpc,
    Memory,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientBackend {
    Relay,
    Local,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub provider_url: String,
    pub contract_address: String,
    pub port: u16,
    pub default_account: Option<String>,
    pub contract_backend: ContractBackend,
    //rpc
    pub rpc_timeout_ms: u64,
    pub rpc_retries: u32,
    pub receipt_timeout_secs: u64,
    pub receipt_poll_ms: u64,
    pub init_attempts: u32,
    //client
    pub relay_url: String,
    pub client_backend: ClientBackend,
}

impl Settings {
    /// Defaults, then an optional `jobmarket.*` file, then the environment
    /// (`PROVIDER_URL`, `CONTRACT_ADDRESS`, `PORT`, ...).
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Self::defaults_builder()?
            .add_source(File::with_name("jobmarket").required(false))
            .add_source(Environment::default())
            .build()?;
        conf.try_deserialize()
    }

    pub fn defaults() -> Result<Self, ConfigError> {
        Self::defaults_builder()?.build()?.try_deserialize()
    }

    fn defaults_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("provider_url", "http://localhost:8545")?
            .set_default("contract_address", "")?
            .set_default("port", 5000)?
            .set_default("contract_backend", "rpc")?
            .set_default("rpc_timeout_ms", 30_000)?
            .set_default("rpc_retries", 3)?
            .set_default("receipt_timeout_secs", 60)?
            .set_default("receipt_poll_ms", 1_000)?
            .set_default("init_attempts", 5)?
            .set_default("relay_url", "http://localhost:5000")?
            .set_default("client_backend", "relay")
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }

    /// How long the client waits on the relay. A write costs the relay one
    /// submission round trip plus the full receipt wait, so this outlasts both.
    pub fn relay_timeout(&self) -> Duration {
        self.receipt_timeout() + self.rpc_timeout() * 2
    }
}
