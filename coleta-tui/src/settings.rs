//! Layered configuration: built-in defaults, then an optional `coleta.toml`,
//! then `COLETA_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Settings {
    /// Root of the geographic reference API.
    pub geo_base_url: String,
    /// Root of the collection point backend.
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub user_agent: String,
    pub log_file: PathBuf,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Fixed device position as `"lat,lon"`.
    pub location: Option<String>,
    pub location_denied: bool,
}

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name("coleta").required(false))
            .add_source(Environment::with_prefix("COLETA").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("geo_base_url", coleta_provider_ibge::DEFAULT_BASE_URL)?
            .set_default("api_base_url", coleta_provider_catalog::DEFAULT_BASE_URL)?
            .set_default("request_timeout_ms", 5000_i64)?
            .set_default("user_agent", "coleta/0.1")?
            .set_default("log_file", "coleta.log")?
            .set_default("log_filter", "coleta=info")?
            .set_default("location_denied", false)
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
