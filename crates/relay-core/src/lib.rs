//! # Relay Core
//!
//! Shared building blocks for the relay crates: configuration loading,
//! logging setup, the core error type and the wire codec that turns
//! `{type, data}` envelopes into text frames and back.

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;

pub use crate::codec::{Envelope, MalformedFrame, decode, encode};
pub use crate::config::{
    ChannelConfig, Config, EndpointConfig, GlobalConfig, TerminatedPolicy, TransportConfig,
    WebSocketConfig, load_config, load_config_from,
};
pub use crate::error::CoreError;
pub use crate::logging::setup_logging;
