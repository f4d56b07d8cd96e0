//! Implementation of the `Transport` trait using WebSockets (`tokio-tungstenite`).

#![cfg(feature = "websocket")]

use crate::error::TransportError;
use crate::traits::Transport;
use crate::types::{ConnectParams, WebSocketConnectOptions};
use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::{debug, error, info, trace, warn};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async_with_config,
    tungstenite::{
        Error as TungsteniteError,
        protocol::{Message as TungsteniteMessage, WebSocketConfig},
    },
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, TungsteniteMessage>;
type WsSource = SplitStream<WsStream>;

/// WebSocket transport: text frames only, control frames handled internally.
pub struct WebSocketTransport {
    params: ConnectParams,
    sink: Option<WsSink>,
    source: Option<WsSource>,
}

impl WebSocketTransport {
    pub fn new(params: ConnectParams) -> Self {
        Self {
            params,
            sink: None,
            source: None,
        }
    }

    fn apply_options(options: &WebSocketConnectOptions) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        if let Some(size) = options.max_message_size {
            config.max_message_size = Some(size);
        }
        if let Some(size) = options.max_frame_size {
            config.max_frame_size = Some(size);
        }
        config.accept_unmasked_frames = options.accept_unmasked_frames;
        config
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.sink.is_some() || self.source.is_some() {
            warn!("WebSocketTransport already connected to {}.", self.params.url);
            return Err(TransportError::ConnectionFailed("Already connected".into()));
        }

        info!("Connecting WebSocket to {}", self.params.url);
        let ws_config = Self::apply_options(&self.params.ws_options);
        let (ws_stream, response) =
            connect_async_with_config(self.params.url.as_str(), Some(ws_config), false).await?;
        debug!("WebSocket handshake successful: status {}", response.status());

        let (sink, source) = ws_stream.split();
        self.sink = Some(sink);
        self.source = Some(source);

        info!("WebSocket connection established to {}.", self.params.url);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        if let Some(mut sink) = self.sink.take() {
            match sink.send(TungsteniteMessage::Close(None)).await {
                Ok(_) => debug!("WebSocket Close frame sent."),
                Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed) => {
                    debug!("WebSocket already closed while sending Close frame.")
                }
                Err(e) => warn!("Error sending WebSocket Close frame: {}. Closing anyway.", e),
            }
            if let Err(e) = sink.close().await {
                if !matches!(
                    e,
                    TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed
                ) {
                    warn!("Error closing WebSocket sink: {}", e);
                }
            }
        }
        self.source = None;

        info!("WebSocket to {} disconnected.", self.params.url);
        Ok(())
    }

    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| TransportError::NotConnected("WebSocket sink unavailable".into()))?;

        trace!("Sending WebSocket frame: {}", frame);
        sink.send(TungsteniteMessage::Text(frame.to_string())).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Option<Result<String, TransportError>> {
        let source = self.source.as_mut()?;

        // Control and binary frames are not part of the envelope protocol; keep
        // reading until a text frame, a close, or a failure shows up.
        loop {
            match source.next().await {
                Some(Ok(TungsteniteMessage::Text(text))) => {
                    trace!("Received WebSocket frame: {}", text);
                    return Some(Ok(text));
                }
                Some(Ok(TungsteniteMessage::Binary(bin))) => {
                    warn!("Ignoring binary WebSocket message ({} bytes).", bin.len());
                }
                Some(Ok(TungsteniteMessage::Ping(_) | TungsteniteMessage::Pong(_))) => {
                    // tungstenite queues the Pong reply itself
                    trace!("WebSocket control frame received.");
                }
                Some(Ok(TungsteniteMessage::Close(close_frame))) => {
                    info!("Received WebSocket Close frame: {:?}", close_frame);
                    return None;
                }
                Some(Ok(TungsteniteMessage::Frame(_))) => {
                    warn!("Ignoring unexpected raw WebSocket frame.");
                }
                Some(Err(TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed)) => {
                    info!("WebSocket connection closed while receiving.");
                    return None;
                }
                Some(Err(e)) => {
                    error!("WebSocket receive error: {}", e);
                    return Some(Err(e.into()));
                }
                None => {
                    info!("WebSocket stream ended.");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_map_onto_tungstenite_config() {
        let options = WebSocketConnectOptions {
            max_message_size: Some(1024),
            max_frame_size: None,
            accept_unmasked_frames: true,
        };
        let config = WebSocketTransport::apply_options(&options);
        let defaults = WebSocketConfig::default();

        assert_eq!(config.max_message_size, Some(1024));
        assert_eq!(config.max_frame_size, defaults.max_frame_size);
        assert!(config.accept_unmasked_frames);
    }

    #[actix_rt::test]
    async fn send_before_connect_is_rejected() {
        let mut transport = WebSocketTransport::new(ConnectParams::new("ws://127.0.0.1:9"));
        let err = transport.send("{}").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected(_)));
        assert!(transport.receive().await.is_none());
    }
}
