//! # Relay Client Library
//!
//! The crate the authoring tool's views depend on. It ties together the core,
//! transport and channel crates: load configuration, get the shared channel
//! for the engine endpoint, subscribe to what it streams and send it jobs.
//!
//! ```no_run
//! use relay_client::{Client, Subscriber, engine};
//!
//! # fn views() -> Result<(), relay_client::ClientError> {
//! // inside a running actix System
//! let client = Client::load()?;
//! let channel = client.connect()?;
//! let logs = channel.subscribe(Subscriber::for_kind(engine::kinds::LOG, |env| {
//!     println!("{}", env.data);
//! }));
//! channel.send(&engine::run_script("EXTRACT ..."));
//! logs.release();
//! # Ok(())
//! # }
//! ```

mod client;
pub mod engine;
mod error;

pub use client::Client;
pub use engine::EngineEvent;
pub use error::ClientError;

// Re-export the consumer-facing API
pub use relay_channel::{
    Channel, ChannelError, ChannelStats, ConnectError, ConnectionManager, ConnectionState,
    Subscriber, Subscription, SubscriptionId,
};
pub use relay_core::{Config, Envelope, MalformedFrame, TerminatedPolicy};
pub use relay_transport::TransportError;

// Export value for building payloads
pub use serde_json::Value;
