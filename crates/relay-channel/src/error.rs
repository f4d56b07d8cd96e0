use relay_core::MalformedFrame;
use relay_transport::TransportError;
use thiserror::Error;

/// What a subscriber's error callback receives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// The connection failed. Terminal: the channel never delivers again.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// One inbound frame could not be decoded. The connection stays open.
    #[error(transparent)]
    Malformed(#[from] MalformedFrame),
}

impl ChannelError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelError::Transport(_))
    }
}

/// Errors from [`ConnectionManager::connect`](crate::ConnectionManager::connect).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Endpoint URL must not be empty")]
    EmptyUrl,

    #[error("No actix arbiter on this thread; connect must be called from a thread owned by an actix System")]
    NoActorSystem,
}
