//! Errors from loading the client or opening its channels.

use relay_channel::ConnectError;
use relay_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration loading failed: {0}")]
    Config(#[from] CoreError),

    #[error("Connect failed: {0}")]
    Connect(#[from] ConnectError),
}
