//! Subscriber callbacks and the handles consumers keep for them.

use crate::actor::ChannelActor;
use crate::error::ChannelError;
use crate::fanout::Termination;
use crate::messages::Unsubscribe;
use actix::Addr;
use relay_core::Envelope;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type MessageCallback = Box<dyn FnMut(&Envelope) + Send>;
type ErrorCallback = Box<dyn FnMut(&ChannelError) + Send>;
type CompleteCallback = Box<dyn FnOnce() + Send>;

/// Identifies one subscription within a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// The callbacks a consumer registers with [`Channel::subscribe`](crate::Channel::subscribe).
///
/// `on_message` sees every decoded inbound envelope. `on_error` sees malformed
/// frames (recoverable) and, at most once, the transport failure that ends the
/// channel. `on_complete` fires at most once when the connection closes cleanly.
pub struct Subscriber {
    on_message: MessageCallback,
    on_error: Option<ErrorCallback>,
    on_complete: Option<CompleteCallback>,
}

impl Subscriber {
    pub fn new(on_message: impl FnMut(&Envelope) + Send + 'static) -> Self {
        Self {
            on_message: Box::new(on_message),
            on_error: None,
            on_complete: None,
        }
    }

    /// Only envelopes whose `type` equals `kind` reach `on_message`.
    pub fn for_kind(
        kind: impl Into<String>,
        mut on_message: impl FnMut(&Envelope) + Send + 'static,
    ) -> Self {
        let kind = kind.into();
        Self::new(move |envelope: &Envelope| {
            if envelope.is(&kind) {
                on_message(envelope);
            }
        })
    }

    pub fn on_error(mut self, on_error: impl FnMut(&ChannelError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }

    pub fn on_complete(mut self, on_complete: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    pub(crate) fn message(&mut self, envelope: &Envelope) {
        (self.on_message)(envelope);
    }

    pub(crate) fn error(&mut self, error: &ChannelError) {
        if let Some(on_error) = self.on_error.as_mut() {
            on_error(error);
        }
    }

    /// Runs the terminal callback. Consuming `self` makes it a one-shot.
    pub(crate) fn finish(mut self, termination: &Termination) {
        match termination {
            Termination::Completed => {
                if let Some(on_complete) = self.on_complete.take() {
                    on_complete();
                }
            }
            Termination::Failed(e) => self.error(&ChannelError::Transport(e.clone())),
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("on_error", &self.on_error.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

/// Handle to a live subscription.
///
/// Dropping the handle does not unsubscribe; call [`release`](Self::release).
/// Releasing never affects the underlying connection.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    hub: Addr<ChannelActor>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, active: Arc<AtomicBool>, hub: Addr<ChannelActor>) -> Self {
        Self { id, active, hub }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// False once released or once the channel has terminated.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stops delivery to this subscriber. Takes effect before the next delivery
    /// and is idempotent.
    pub fn release(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            self.hub.do_send(Unsubscribe(self.id));
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
