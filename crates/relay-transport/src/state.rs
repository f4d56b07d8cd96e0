//! Connection lifecycle state machine.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one physical connection. `Closed` and `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Errored,
}

/// Transport signals that can move a connection between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// The physical connection attempt started.
    Initiate,
    /// The transport reported readiness.
    Open,
    /// The transport failed.
    Error,
    /// The transport shut down cleanly.
    Close,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }

    pub fn is_open(self) -> bool {
        self == ConnectionState::Open
    }

    /// The state reached by applying `event`, or `None` when the event is not a
    /// valid transition from here. Terminal states accept nothing.
    pub fn next(self, event: StateEvent) -> Option<ConnectionState> {
        use ConnectionState::*;

        match (self, event) {
            (Closed | Errored, _) => None,
            (Idle, StateEvent::Initiate) => Some(Connecting),
            (Connecting, StateEvent::Open) => Some(Open),
            (_, StateEvent::Error) => Some(Errored),
            (Connecting | Open, StateEvent::Close) => Some(Closed),
            _ => None,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Idle => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Open => 2,
            ConnectionState::Closed => 3,
            ConnectionState::Errored => 4,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ConnectionState::Idle,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::Closed,
            _ => ConnectionState::Errored,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Shared view of a connection's current state.
///
/// Any holder can read it; only the connection actor in this crate writes it.
#[derive(Clone)]
pub struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub fn new() -> Self {
        StateCell(Arc::new(AtomicU8::new(ConnectionState::Idle.as_u8())))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateCell").field(&self.get()).finish()
    }
}
