use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};
use validator_lib::proxy::PROVIDER_URL;

/// Settings for the `serve` command, read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub provider_url: String,
}

impl ServerConfig {
    pub fn load() -> Result<Self, anyhow::Error> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Build the config from any variable source; `load` uses the process environment.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        Ok(Self {
            port: try_load(&lookup, "PROXY_PORT", "3000")?,
            provider_url: try_load(&lookup, "PROVIDER_URL", PROVIDER_URL)?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, anyhow::Error>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow::anyhow!("Environment misconfigured: invalid {key} value: {e}")
        })
}
