use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Snapshot of a channel's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Inbound envelopes decoded and fanned out.
    pub delivered: u64,
    /// Inbound frames that failed to decode.
    pub malformed: u64,
    /// Outbound envelopes handed to the connection while it was open.
    ///
    /// A frame still queued when the connection terminates is counted here and
    /// never written; delivery to the engine is not acknowledged.
    pub sent: u64,
    /// Outbound envelopes discarded because the connection was not open.
    pub dropped_sends: u64,
    pub subscribers: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    delivered: AtomicU64,
    malformed: AtomicU64,
    sent: AtomicU64,
    dropped_sends: AtomicU64,
    subscribers: AtomicUsize,
}

impl Counters {
    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_send(&self) {
        self.dropped_sends.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_subscribers(&self, count: usize) {
        self.subscribers.store(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ChannelStats {
        ChannelStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            dropped_sends: self.dropped_sends.load(Ordering::Relaxed),
            subscribers: self.subscribers.load(Ordering::Relaxed),
        }
    }
}
