//! The ChannelActor decodes inbound frames and fans them out to subscribers.

use crate::error::ChannelError;
use crate::fanout::{Fanout, Termination};
use crate::messages::{Subscribe, Unsubscribe};
use crate::stats::Counters;
use actix::prelude::*;
use log::{debug, info, trace, warn};
use relay_transport::ConnectionEvent;
use std::sync::Arc;

/// One per channel. Receives the connection's events and the consumers'
/// subscribe/unsubscribe requests on a single mailbox, so every subscriber sees
/// a message before the next inbound frame is looked at.
pub struct ChannelActor {
    url: String,
    fanout: Fanout,
    counters: Arc<Counters>,
}

impl ChannelActor {
    pub(crate) fn new(url: String, counters: Arc<Counters>) -> Self {
        Self {
            url,
            fanout: Fanout::new(),
            counters,
        }
    }

    fn terminate(&mut self, termination: Termination) {
        let reached = self.fanout.terminate(termination);
        info!(
            "Channel {} terminated ({:?}); notified {} subscribers",
            self.url,
            self.fanout.termination(),
            reached
        );
        self.counters.set_subscribers(0);
    }
}

impl Actor for ChannelActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        info!("ChannelActor started for {}.", self.url);
    }

    fn stopping(&mut self, _ctx: &mut Context<Self>) -> Running {
        info!("ChannelActor for {} stopping.", self.url);
        Running::Stop
    }
}

impl Handler<Subscribe> for ChannelActor {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _ctx: &mut Context<Self>) {
        debug!("Adding subscription {:?} on {}", msg.id, self.url);
        if self.fanout.insert(msg.id, msg.subscriber, msg.active) {
            self.counters.set_subscribers(self.fanout.len());
        }
    }
}

impl Handler<Unsubscribe> for ChannelActor {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe, _ctx: &mut Context<Self>) {
        debug!("Removing subscription {:?} on {}", msg.0, self.url);
        if self.fanout.remove(msg.0) {
            self.counters.set_subscribers(self.fanout.len());
        }
    }
}

impl Handler<ConnectionEvent> for ChannelActor {
    type Result = ();

    fn handle(&mut self, event: ConnectionEvent, _ctx: &mut Context<Self>) {
        match event {
            ConnectionEvent::Opened => info!("Channel {} is open.", self.url),
            ConnectionEvent::Frame(frame) => match relay_core::decode(&frame) {
                Ok(envelope) => {
                    let reached = self.fanout.deliver(&envelope);
                    self.counters.record_delivered();
                    trace!(
                        "Dispatched '{}' on {} to {} subscribers.",
                        envelope.kind, self.url, reached
                    );
                }
                Err(malformed) => {
                    warn!("Malformed frame on {}: {}", self.url, malformed);
                    self.counters.record_malformed();
                    self.fanout.report(&ChannelError::Malformed(malformed));
                }
            },
            ConnectionEvent::Failed(e) => self.terminate(Termination::Failed(e)),
            ConnectionEvent::Closed => self.terminate(Termination::Completed),
        }
    }
}
