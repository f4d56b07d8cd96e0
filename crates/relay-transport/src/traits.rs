use crate::error::TransportError;
use crate::types::ConnectParams;
use async_trait::async_trait;

/// One physical full-duplex connection carrying text frames.
///
/// Implementations handle the specifics of a protocol; the connection actor
/// drives them and turns their results into open/message/error/close events.
#[async_trait]
pub trait Transport: Send + Unpin {
    /// Establishes the connection described by the parameters given at creation.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Closes the connection gracefully.
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Sends one text frame over the established connection.
    async fn send(&mut self, frame: &str) -> Result<(), TransportError>;

    /// Waits for the next text frame.
    ///
    /// * `Some(Ok(frame))` - a frame arrived.
    /// * `Some(Err(e))` - the connection failed.
    /// * `None` - the remote end closed the connection cleanly.
    async fn receive(&mut self) -> Option<Result<String, TransportError>>;
}

/// Builds transports for endpoint URLs.
///
/// The connection manager holds one factory and asks it for a fresh transport
/// the first time a URL is requested.
pub trait TransportFactory: Send + Sync {
    fn create(&self, params: &ConnectParams) -> Result<Box<dyn Transport>, TransportError>;
}
