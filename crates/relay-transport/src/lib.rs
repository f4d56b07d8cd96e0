//! # Relay Transport
//!
//! Low-level handling of the single physical connection behind a channel.
//!
//! It defines the `Transport` trait for abstracting the wire, a WebSocket
//! implementation, the `ConnectionState` machine, and the `ConnectionActor`
//! that owns one connection's lifecycle and reports its events.

pub mod connection;
pub mod error;
pub mod factory;
pub mod state;
pub mod traits;
pub mod types;
#[cfg(feature = "websocket")]
pub mod websocket;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export key items
pub use connection::{ConnectionActor, ConnectionEvent, SendFrame};
pub use error::TransportError;
pub use factory::{DefaultTransportFactory, create_transport};
pub use state::{ConnectionState, StateCell, StateEvent};
pub use traits::{Transport, TransportFactory};
#[cfg(feature = "websocket")]
pub use types::WebSocketConnectOptions;
pub use types::ConnectParams;
