//! The multicast core: a subscriber set with a one-way terminal latch.
//!
//! Synchronous and executor-agnostic; the channel actor wraps it so every call
//! happens on one logical thread.

use crate::error::ChannelError;
use crate::subscriber::{Subscriber, SubscriptionId};
use log::{debug, trace};
use relay_core::Envelope;
use relay_transport::TransportError;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// How a channel ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// The connection closed cleanly.
    Completed,
    /// The connection failed.
    Failed(TransportError),
}

struct Entry {
    subscriber: Subscriber,
    active: Arc<AtomicBool>,
}

impl Entry {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[derive(Default)]
pub struct Fanout {
    entries: HashMap<SubscriptionId, Entry>,
    termination: Option<Termination>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber. After termination the subscriber is not stored; its
    /// terminal callback runs immediately instead. Returns whether it was stored.
    pub fn insert(
        &mut self,
        id: SubscriptionId,
        subscriber: Subscriber,
        active: Arc<AtomicBool>,
    ) -> bool {
        if let Some(termination) = &self.termination {
            debug!("Subscription {:?} arrived after termination", id);
            active.store(false, Ordering::Release);
            subscriber.finish(termination);
            return false;
        }
        if !active.load(Ordering::Acquire) {
            trace!("Subscription {:?} released before registration", id);
            return false;
        }
        self.entries.insert(id, Entry { subscriber, active });
        true
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Hands `envelope` to every active subscriber. Returns how many were reached.
    pub fn deliver(&mut self, envelope: &Envelope) -> usize {
        if self.termination.is_some() {
            return 0;
        }
        let mut reached = 0;
        for entry in self.entries.values_mut().filter(|e| e.is_active()) {
            entry.subscriber.message(envelope);
            reached += 1;
        }
        reached
    }

    /// Reports a recoverable error to every active subscriber.
    pub fn report(&mut self, error: &ChannelError) -> usize {
        if self.termination.is_some() {
            return 0;
        }
        let mut reached = 0;
        for entry in self.entries.values_mut().filter(|e| e.is_active()) {
            entry.subscriber.error(error);
            reached += 1;
        }
        reached
    }

    /// Latches `termination` and runs each active subscriber's terminal callback
    /// once, emptying the set. Later calls are ignored and return 0.
    pub fn terminate(&mut self, termination: Termination) -> usize {
        if self.termination.is_some() {
            return 0;
        }
        let mut reached = 0;
        for (_, entry) in self.entries.drain() {
            if entry.active.swap(false, Ordering::AcqRel) {
                entry.subscriber.finish(&termination);
                reached += 1;
            }
        }
        self.termination = Some(termination);
        reached
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::MalformedFrame;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Message(Envelope),
        Error(ChannelError),
        Complete,
    }

    type Log = Arc<Mutex<Vec<Seen>>>;

    fn recording() -> (Subscriber, Log) {
        let log: Log = Arc::default();
        let (m, e, c) = (log.clone(), log.clone(), log.clone());
        let subscriber = Subscriber::new(move |env| m.lock().unwrap().push(Seen::Message(env.clone())))
            .on_error(move |err| e.lock().unwrap().push(Seen::Error(err.clone())))
            .on_complete(move || c.lock().unwrap().push(Seen::Complete));
        (subscriber, log)
    }

    fn add(fanout: &mut Fanout, id: u64) -> (Log, Arc<AtomicBool>) {
        let (subscriber, log) = recording();
        let active = Arc::new(AtomicBool::new(true));
        assert!(fanout.insert(SubscriptionId(id), subscriber, active.clone()));
        (log, active)
    }

    fn seen(log: &Log) -> Vec<Seen> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn every_subscriber_sees_every_message_in_order() {
        let mut fanout = Fanout::new();
        let logs: Vec<_> = (0..3).map(|id| add(&mut fanout, id).0).collect();

        let first = Envelope::new("log", json!("hello"));
        let second = Envelope::new("status", json!({"progress": 0.5}));
        assert_eq!(fanout.deliver(&first), 3);
        assert_eq!(fanout.deliver(&second), 3);

        for log in &logs {
            assert_eq!(
                seen(log),
                vec![Seen::Message(first.clone()), Seen::Message(second.clone())]
            );
        }
    }

    #[test]
    fn late_subscriber_gets_no_history() {
        let mut fanout = Fanout::new();
        let (early, _) = add(&mut fanout, 1);
        fanout.deliver(&Envelope::new("log", json!("m")));

        let (late, _) = add(&mut fanout, 2);
        let next = Envelope::new("log", json!("n"));
        fanout.deliver(&next);

        assert_eq!(seen(&early).len(), 2);
        assert_eq!(seen(&late), vec![Seen::Message(next)]);
    }

    #[test]
    fn deactivated_subscriber_is_skipped_before_removal() {
        let mut fanout = Fanout::new();
        let (a, a_active) = add(&mut fanout, 1);
        let (b, _) = add(&mut fanout, 2);

        a_active.store(false, Ordering::Release);
        fanout.deliver(&Envelope::new("log", json!(1)));
        assert!(seen(&a).is_empty());
        assert_eq!(seen(&b).len(), 1);

        assert!(fanout.remove(SubscriptionId(1)));
        assert!(!fanout.remove(SubscriptionId(1)));
        assert_eq!(fanout.len(), 1);
    }

    #[test]
    fn malformed_frames_do_not_terminate() {
        let mut fanout = Fanout::new();
        let (log, active) = add(&mut fanout, 1);
        let err = ChannelError::Malformed(MalformedFrame {
            reason: "bad".into(),
            frame: "{".into(),
        });

        assert_eq!(fanout.report(&err), 1);
        fanout.deliver(&Envelope::new("log", json!("still here")));

        assert!(fanout.termination().is_none());
        assert!(active.load(Ordering::Acquire));
        assert_eq!(seen(&log).len(), 2);
        assert_eq!(seen(&log)[0], Seen::Error(err));
    }

    #[test]
    fn close_completes_each_subscriber_exactly_once() {
        let mut fanout = Fanout::new();
        let (a, a_active) = add(&mut fanout, 1);
        let (b, _) = add(&mut fanout, 2);

        assert_eq!(fanout.terminate(Termination::Completed), 2);
        assert_eq!(fanout.terminate(Termination::Completed), 0);
        assert_eq!(
            fanout.terminate(Termination::Failed(TransportError::Timeout)),
            0
        );
        assert_eq!(fanout.deliver(&Envelope::new("log", json!("after"))), 0);

        assert_eq!(seen(&a), vec![Seen::Complete]);
        assert_eq!(seen(&b), vec![Seen::Complete]);
        assert!(!a_active.load(Ordering::Acquire));
        assert!(fanout.is_empty());
        assert_eq!(fanout.termination(), Some(&Termination::Completed));
    }

    #[test]
    fn failure_reaches_on_error_once() {
        let mut fanout = Fanout::new();
        let (log, _) = add(&mut fanout, 1);
        let err = TransportError::ConnectionFailed("refused".into());

        fanout.terminate(Termination::Failed(err.clone()));
        fanout.report(&ChannelError::Transport(TransportError::Timeout));

        assert_eq!(seen(&log), vec![Seen::Error(ChannelError::Transport(err))]);
    }

    #[test]
    fn subscriber_after_termination_is_finished_immediately() {
        let mut fanout = Fanout::new();
        fanout.terminate(Termination::Completed);

        let (subscriber, log) = recording();
        let active = Arc::new(AtomicBool::new(true));
        assert!(!fanout.insert(SubscriptionId(9), subscriber, active.clone()));

        assert_eq!(seen(&log), vec![Seen::Complete]);
        assert!(!active.load(Ordering::Acquire));
        assert!(fanout.is_empty());
    }

    #[test]
    fn released_subscriber_is_not_finished_on_termination() {
        let mut fanout = Fanout::new();
        let (log, active) = add(&mut fanout, 1);
        active.store(false, Ordering::Release);

        assert_eq!(fanout.terminate(Termination::Completed), 0);
        assert!(seen(&log).is_empty());
    }

    #[test]
    fn subscriber_released_before_registration_is_dropped() {
        let mut fanout = Fanout::new();
        let (subscriber, log) = recording();
        let active = Arc::new(AtomicBool::new(false));

        assert!(!fanout.insert(SubscriptionId(3), subscriber, active));
        fanout.deliver(&Envelope::new("log", json!("x")));
        assert!(seen(&log).is_empty());
    }

    #[test]
    fn kind_filter_only_passes_matching_envelopes() {
        let mut fanout = Fanout::new();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = hits.clone();
        let subscriber = Subscriber::for_kind("RESULT", move |env| {
            sink.lock().unwrap().push(env.data.clone())
        });
        fanout.insert(SubscriptionId(1), subscriber, Arc::new(AtomicBool::new(true)));

        fanout.deliver(&Envelope::new("LOG", json!("noise")));
        fanout.deliver(&Envelope::new("RESULT", json!({"entry": "1,2,3"})));

        assert_eq!(*hits.lock().unwrap(), vec![json!({"entry": "1,2,3"})]);
    }
}
