use crate::error::CoreError;
use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::{path::Path, time::Duration};

/// Endpoint used when neither `relay.toml` nor the environment names one.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:4040";

// Helper for deserializing Duration from milliseconds
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Main configuration structure
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub global: GlobalConfig,
    pub endpoint: EndpointConfig,
    pub transport: TransportConfig,
    pub channel: ChannelConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GlobalConfig {
    pub log_level: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// The execution engine endpoint the views talk to.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

// Transport layer configuration
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TransportConfig {
    #[serde(rename = "connect_timeout_ms", deserialize_with = "duration_ms_serde::deserialize")]
    pub connect_timeout: Duration,
    pub websocket: WebSocketConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
            websocket: WebSocketConfig::default(),
        }
    }
}

// WebSocket specific configuration
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WebSocketConfig {
    pub max_message_size: Option<usize>,
    pub max_frame_size: Option<usize>,
    pub accept_unmasked_frames: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ChannelConfig {
    pub on_terminated: TerminatedPolicy,
}

/// What `connect` does for a URL whose connection already reached `Closed`/`Errored`.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TerminatedPolicy {
    /// Hand back the memoized, permanently inert channel.
    #[default]
    Reuse,
    /// Drop the dead entry and open a fresh connection.
    Replace,
}

/// Loads configuration from default locations and environment variables.
///
/// Looks for `relay.toml` (or `.json`, `.yaml`, etc.) in the current directory.
/// Overrides with environment variables prefixed with `RELAY_`
/// (e.g., `RELAY_GLOBAL__LOG_LEVEL=debug`, `RELAY_ENDPOINT__URL=ws://engine:4040`).
/// Note the double underscore `__` for nested fields.
pub fn load_config() -> Result<Config, CoreError> {
    let builder = ConfigLoader::builder()
        .set_default("global.log_level", "info")?
        .set_default("endpoint.url", DEFAULT_ENDPOINT)?
        .add_source(File::with_name("relay").required(false))
        .add_source(
            Environment::with_prefix("RELAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    builder.try_deserialize().map_err(CoreError::ConfigLoad)
}

/// Loads configuration from an explicit file; the file must exist.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, CoreError> {
    let builder = ConfigLoader::builder()
        .add_source(File::from(path.as_ref()).required(true))
        .build()?;

    builder.try_deserialize().map_err(CoreError::ConfigLoad)
}
