use relay_core::TransportConfig;
#[cfg(feature = "websocket")]
use relay_core::WebSocketConfig;
use std::time::Duration;

/// Parameters required to establish a connection.
#[derive(Clone, Debug)]
pub struct ConnectParams {
    /// The full endpoint URL (e.g., "ws://localhost:4040").
    /// The scheme determines the transport type.
    pub url: String,

    /// Applied to the initial connection attempt.
    pub connection_timeout: Duration,

    #[cfg(feature = "websocket")]
    pub ws_options: WebSocketConnectOptions,
}

impl ConnectParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection_timeout: default_connect_timeout(),
            #[cfg(feature = "websocket")]
            ws_options: WebSocketConnectOptions::default(),
        }
    }

    /// Parameters for `url` using the transport section of the loaded configuration.
    pub fn from_config(url: impl Into<String>, config: &TransportConfig) -> Self {
        Self {
            url: url.into(),
            connection_timeout: config.connect_timeout,
            #[cfg(feature = "websocket")]
            ws_options: WebSocketConnectOptions::from(&config.websocket),
        }
    }
}

fn default_connect_timeout() -> Duration {
    TransportConfig::default().connect_timeout
}

/// Options specific to WebSocket connections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg(feature = "websocket")]
pub struct WebSocketConnectOptions {
    pub max_message_size: Option<usize>,
    pub max_frame_size: Option<usize>,
    pub accept_unmasked_frames: bool,
}

#[cfg(feature = "websocket")]
impl From<&WebSocketConfig> for WebSocketConnectOptions {
    fn from(cfg: &WebSocketConfig) -> Self {
        Self {
            max_message_size: cfg.max_message_size,
            max_frame_size: cfg.max_frame_size,
            accept_unmasked_frames: cfg.accept_unmasked_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_the_default_connect_timeout() {
        let params = ConnectParams::new("ws://engine:4040");
        assert_eq!(params.connection_timeout, Duration::from_secs(20));
        assert_eq!(
            params.connection_timeout,
            TransportConfig::default().connect_timeout
        );
    }

    #[test]
    fn from_config_carries_timeout_and_limits() {
        let mut cfg = TransportConfig::default();
        cfg.connect_timeout = Duration::from_millis(250);
        cfg.websocket.max_frame_size = Some(4096);

        let params = ConnectParams::from_config("ws://engine:4040", &cfg);
        assert_eq!(params.url, "ws://engine:4040");
        assert_eq!(params.connection_timeout, Duration::from_millis(250));
        #[cfg(feature = "websocket")]
        assert_eq!(params.ws_options.max_frame_size, Some(4096));
    }
}
