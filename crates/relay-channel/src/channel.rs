use crate::actor::ChannelActor;
use crate::messages::Subscribe;
use crate::stats::{ChannelStats, Counters};
use crate::subscriber::{Subscriber, Subscription, SubscriptionId};
use actix::ArbiterHandle;
use actix::prelude::*;
use log::{debug, error, trace};
use relay_core::Envelope;
use relay_transport::{
    ConnectParams, ConnectionActor, ConnectionState, SendFrame, StateCell, Transport,
    TransportError,
};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

struct Inner {
    url: String,
    state: StateCell,
    connection: Addr<ConnectionActor>,
    hub: Addr<ChannelActor>,
    counters: Arc<Counters>,
    next_id: AtomicU64,
}

/// Shared multicast stream plus `send`, bound to one connection.
///
/// Cloning is cheap and every clone is the same channel; equality is identity.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Inner>,
}

impl Channel {
    /// Starts the channel and connection actors for `params.url` on `arbiter`.
    ///
    /// The actors are constructed on the arbiter's own thread, so this is safe
    /// to call before the owning `System` runs; they start once it does.
    pub(crate) fn open(
        arbiter: &ArbiterHandle,
        params: ConnectParams,
        transport: Result<Box<dyn Transport>, TransportError>,
    ) -> Self {
        let url = params.url.clone();
        let counters = Arc::new(Counters::default());
        let hub = {
            let (url, counters) = (url.clone(), counters.clone());
            ChannelActor::start_in_arbiter(arbiter, move |_| ChannelActor::new(url, counters))
        };
        let state = StateCell::new();
        let connection = {
            let (state, events) = (state.clone(), hub.clone().recipient());
            ConnectionActor::start_in_arbiter(arbiter, move |_| {
                ConnectionActor::new(params, transport, state, events)
            })
        };

        Channel {
            inner: Arc::new(Inner {
                url,
                state,
                connection,
                hub,
                counters,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    /// True once the connection closed or failed; the channel will never
    /// deliver again.
    pub fn is_terminated(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn stats(&self) -> ChannelStats {
        self.inner.counters.snapshot()
    }

    /// Registers `subscriber` for every message arriving from now on.
    ///
    /// On an already terminated channel the terminal callback fires instead
    /// and no message is ever delivered.
    pub fn subscribe(&self, subscriber: Subscriber) -> Subscription {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let active = Arc::new(AtomicBool::new(true));
        self.inner.hub.do_send(Subscribe {
            id,
            subscriber,
            active: active.clone(),
        });
        Subscription::new(id, active, self.inner.hub.clone())
    }

    /// Forwards `envelope` to the connection if it is open.
    ///
    /// Otherwise the envelope is discarded without any signal to the caller;
    /// discards show up in [`ChannelStats::dropped_sends`]. There is no queueing
    /// and no acknowledgement of network delivery.
    pub fn send(&self, envelope: &Envelope) {
        let state = self.state();
        if state != ConnectionState::Open {
            debug!(
                "Dropping '{}' for {}: connection is {}",
                envelope.kind, self.inner.url, state
            );
            self.inner.counters.record_dropped_send();
            return;
        }

        match relay_core::encode(envelope) {
            Ok(frame) => {
                trace!("Forwarding '{}' to {}", envelope.kind, self.inner.url);
                self.inner.connection.do_send(SendFrame(frame));
                self.inner.counters.record_sent();
            }
            Err(e) => {
                error!("Failed to encode '{}' for {}: {}", envelope.kind, self.inner.url, e);
                self.inner.counters.record_dropped_send();
            }
        }
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Channel {}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
