//! Messages accepted by the channel actor.

use crate::subscriber::{Subscriber, SubscriptionId};
use actix::prelude::*;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Registers a subscriber with the channel's fan-out set.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Subscribe {
    pub id: SubscriptionId,
    pub subscriber: Subscriber,
    /// Shared with the consumer's handle; cleared on release.
    pub active: Arc<AtomicBool>,
}

/// Removes a subscriber from the fan-out set.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Unsubscribe(pub SubscriptionId);
