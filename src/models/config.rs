//! Configuration model loaded from external sources.

use std::time::Duration;

use serde::Deserialize;

use crate::{DEFAULT_API_BASE_URL, DEFAULT_PAGE_SIZE};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
/// Settings for the records client. Every key is optional.
pub struct ClientConfig {
    pub api_base_url: String,
    /// Bound for `GET` requests.
    pub read_timeout_ms: u64,
    /// Bound for `POST`, `PUT` and `DELETE` requests.
    pub write_timeout_ms: u64,
    pub page_size: usize,
    /// Extra attempts for a failed query; mutations are never retried.
    pub query_retries: u32,
    /// Serve the built-in records and options when the API cannot be read.
    pub use_fallback_data: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            read_timeout_ms: 5_000,
            write_timeout_ms: 10_000,
            page_size: DEFAULT_PAGE_SIZE,
            query_retries: 0,
            use_fallback_data: true,
        }
    }
}

impl ClientConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// Loads the configuration from `config/default.yaml`, the optional
/// `config/{app_env}.yaml` overrides and `APP_`-prefixed environment variables.
#[cfg(feature = "client")]
pub fn load_config(app_env: &str) -> Result<ClientConfig, config::ConfigError> {
    load_config_from(std::path::Path::new("config"), app_env)
}

/// Same as [`load_config`] with an explicit configuration directory.
#[cfg(feature = "client")]
pub fn load_config_from(
    dir: &std::path::Path,
    app_env: &str,
) -> Result<ClientConfig, config::ConfigError> {
    let default_file = dir.join("default");
    let env_file = dir.join(app_env);

    config::Config::builder()
        .add_source(config::File::with_name(&default_file.to_string_lossy()).required(false))
        .add_source(config::File::with_name(&env_file.to_string_lossy()).required(false))
        .add_source(config::Environment::with_prefix("APP"))
        .build()?
        .try_deserialize::<ClientConfig>()
}
