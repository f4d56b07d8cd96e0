//! Entry point used by the editor and dashboard views.

use crate::error::ClientError;
use log::{debug, info};
use relay_channel::{Channel, ConnectionManager};
use relay_core::{Config, config, logging};
use relay_transport::TransportFactory;

/// Loaded configuration plus the shared connection registry.
///
/// Views clone the `Client` (or its manager) and call [`connect`](Self::connect);
/// all of them end up on the same channel for the same endpoint.
#[derive(Debug, Clone)]
pub struct Client {
    config: Config,
    manager: ConnectionManager,
}

impl Client {
    /// Loads `relay.toml` / `RELAY_*` configuration and sets up logging.
    ///
    /// A logger that is already installed is not an error; the existing one
    /// stays in place.
    pub fn load() -> Result<Self, ClientError> {
        let cfg = config::load_config()?;

        if let Err(e) = logging::setup_logging(&cfg.global.log_level) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        info!("Relay client starting...");
        debug!("Loaded configuration: {:?}", cfg);
        Ok(Self::new(cfg))
    }

    /// A client speaking WebSocket with the given configuration.
    pub fn new(config: Config) -> Self {
        let manager = ConnectionManager::new(&config);
        Self { config, manager }
    }

    /// A client whose connections come from `factory`.
    pub fn with_factory(config: Config, factory: impl TransportFactory + 'static) -> Self {
        let manager = ConnectionManager::with_factory(factory, &config);
        Self { config, manager }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// The channel for the configured engine endpoint.
    pub fn connect(&self) -> Result<Channel, ClientError> {
        self.connect_to(&self.config.endpoint.url)
    }

    /// The channel for an explicit endpoint URL.
    pub fn connect_to(&self, url: &str) -> Result<Channel, ClientError> {
        Ok(self.manager.connect(url)?)
    }
}
