//! Per-process registry of channels, keyed by endpoint URL.

use crate::channel::Channel;
use crate::error::ConnectError;
use actix::Arbiter;
use log::{debug, info};
use relay_core::{Config, TerminatedPolicy, TransportConfig};
use relay_transport::{ConnectParams, DefaultTransportFactory, TransportFactory};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Owns at most one connection per endpoint URL and the channel wrapping it.
///
/// The first `connect` for a URL creates the transport and starts connecting;
/// later calls hand back the same [`Channel`] without touching the network.
/// Clones share the registry. There is no teardown: connections live as long
/// as the process.
#[derive(Clone)]
pub struct ConnectionManager {
    channels: Arc<Mutex<HashMap<String, Channel>>>,
    factory: Arc<dyn TransportFactory>,
    transport: TransportConfig,
    on_terminated: TerminatedPolicy,
}

impl ConnectionManager {
    /// A manager using the WebSocket transport and the given configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_factory(DefaultTransportFactory, config)
    }

    pub fn with_factory(factory: impl TransportFactory + 'static, config: &Config) -> Self {
        Self {
            channels: Arc::default(),
            factory: Arc::new(factory),
            transport: config.transport.clone(),
            on_terminated: config.channel.on_terminated,
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, Channel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the channel for `url`, creating it (and its connection) on first use.
    ///
    /// A URL whose connection has already closed or failed yields the same dead
    /// channel under [`TerminatedPolicy::Reuse`], or a fresh connection under
    /// [`TerminatedPolicy::Replace`]. Must be called on a thread owned by an actix
    /// `System` or `Arbiter`; the channel's actors run on that arbiter.
    pub fn connect(&self, url: &str) -> Result<Channel, ConnectError> {
        if url.is_empty() {
            return Err(ConnectError::EmptyUrl);
        }

        let mut channels = self.registry();
        if let Some(existing) = channels.get(url) {
            if !(existing.is_terminated() && self.on_terminated == TerminatedPolicy::Replace) {
                debug!("Reusing channel for {} (state: {})", url, existing.state());
                return Ok(existing.clone());
            }
            info!("Replacing terminated channel for {}", url);
        }

        let Some(arbiter) = Arbiter::try_current() else {
            return Err(ConnectError::NoActorSystem);
        };

        let params = ConnectParams::from_config(url, &self.transport);
        let transport = self.factory.create(&params);
        let channel = Channel::open(&arbiter, params, transport);
        info!("Created channel for {}", url);

        channels.insert(url.to_string(), channel.clone());
        Ok(channel)
    }

    /// The channel already registered for `url`, without connecting.
    pub fn channel(&self, url: &str) -> Option<Channel> {
        self.registry().get(url).cloned()
    }

    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<_> = self.registry().keys().cloned().collect();
        urls.sort();
        urls
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().is_empty()
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("urls", &self.urls())
            .field("on_terminated", &self.on_terminated)
            .finish_non_exhaustive()
    }
}
