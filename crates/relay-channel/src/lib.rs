//! # Relay Channel
//!
//! The shared, multicast message channel. A `ConnectionManager` keeps one
//! connection per endpoint URL; each connection is wrapped in a `Channel` that
//! decodes inbound frames, fans them out to every current subscriber, and
//! forwards outbound envelopes while the connection is open.

pub mod actor;
pub mod channel;
pub mod error;
pub mod fanout;
pub mod manager;
pub mod messages;
pub mod stats;
pub mod subscriber;

pub use actor::ChannelActor;
pub use channel::Channel;
pub use error::{ChannelError, ConnectError};
pub use fanout::{Fanout, Termination};
pub use manager::ConnectionManager;
pub use stats::ChannelStats;
pub use subscriber::{Subscriber, Subscription, SubscriptionId};

pub use relay_core::Envelope;
pub use relay_transport::ConnectionState;
