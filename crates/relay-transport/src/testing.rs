//! In-memory transports for exercising connections without a network.
//!
//! [`ScriptedFactory`] hands out [`ScriptedTransport`]s and keeps the matching
//! [`Remote`] so a test can play the engine's side: release or refuse the
//! connection attempt, push frames, fail or close the link, and read back what
//! was sent.

use crate::error::TransportError;
use crate::traits::{Transport, TransportFactory};
use crate::types::ConnectParams;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

enum Inbound {
    Frame(String),
    Fail(TransportError),
    Close,
}

/// Transport whose far end is a [`Remote`].
pub struct ScriptedTransport {
    gate: Option<oneshot::Receiver<Result<(), TransportError>>>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    sent: mpsc::UnboundedSender<String>,
    disconnected: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        match self.gate.take() {
            Some(gate) => gate.await.unwrap_or_else(|_| {
                Err(TransportError::ConnectionFailed("remote dropped".into()))
            }),
            None => Ok(()),
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        // A close handshake takes at least one round trip
        tokio::task::yield_now().await;
        self.disconnected.store(true, Ordering::Release);
        Ok(())
    }

    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        self.sent
            .send(frame.to_string())
            .map_err(|_| TransportError::SendFailed("remote dropped".into()))
    }

    async fn receive(&mut self) -> Option<Result<String, TransportError>> {
        match self.inbound.recv().await {
            Some(Inbound::Frame(frame)) => Some(Ok(frame)),
            Some(Inbound::Fail(e)) => Some(Err(e)),
            Some(Inbound::Close) | None => None,
        }
    }
}

/// The engine side of a [`ScriptedTransport`].
pub struct Remote {
    pub url: String,
    gate: Option<oneshot::Sender<Result<(), TransportError>>>,
    inbound: mpsc::UnboundedSender<Inbound>,
    sent: mpsc::UnboundedReceiver<String>,
    disconnected: Arc<AtomicBool>,
}

impl Remote {
    /// Lets a held connection attempt succeed.
    pub fn open(&mut self) {
        if let Some(gate) = self.gate.take() {
            let _ = gate.send(Ok(()));
        }
    }

    /// Makes a held connection attempt fail with `err`.
    pub fn refuse(&mut self, err: TransportError) {
        if let Some(gate) = self.gate.take() {
            let _ = gate.send(Err(err));
        }
    }

    pub fn push_frame(&self, frame: impl Into<String>) {
        let _ = self.inbound.send(Inbound::Frame(frame.into()));
    }

    pub fn fail(&self, err: TransportError) {
        let _ = self.inbound.send(Inbound::Fail(err));
    }

    pub fn close(&self) {
        let _ = self.inbound.send(Inbound::Close);
    }

    /// Next frame written by the connection, waiting up to `wait`.
    pub async fn next_sent(&mut self, wait: Duration) -> Option<String> {
        tokio::time::timeout(wait, self.sent.recv()).await.ok().flatten()
    }

    /// True once the connection has finished disconnecting its transport.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// A frame already written by the connection, without waiting.
    pub fn try_sent(&mut self) -> Option<String> {
        self.sent.try_recv().ok()
    }
}

#[derive(Default)]
struct FactoryState {
    hold_connect: bool,
    created: Vec<String>,
    remotes: VecDeque<Remote>,
}

/// Factory producing [`ScriptedTransport`]s and recording every creation.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    inner: Arc<Mutex<FactoryState>>,
}

impl ScriptedFactory {
    /// Transports connect as soon as they are asked to.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transports wait in `connect` until [`Remote::open`] or [`Remote::refuse`].
    pub fn holding_connect() -> Self {
        let factory = Self::default();
        factory.state().hold_connect = true;
        factory
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FactoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of transports created so far.
    pub fn created(&self) -> usize {
        self.state().created.len()
    }

    pub fn created_urls(&self) -> Vec<String> {
        self.state().created.clone()
    }

    /// The remote end of the oldest transport not yet claimed.
    pub fn take_remote(&self) -> Option<Remote> {
        self.state().remotes.pop_front()
    }

    /// Builds a transport directly, outside any factory bookkeeping.
    pub fn pair(url: &str, hold_connect: bool) -> (ScriptedTransport, Remote) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (gate_tx, gate_rx) = if hold_connect {
            let (tx, rx) = oneshot::channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let disconnected = Arc::new(AtomicBool::new(false));

        let transport = ScriptedTransport {
            gate: gate_rx,
            inbound: inbound_rx,
            sent: sent_tx,
            disconnected: disconnected.clone(),
        };
        let remote = Remote {
            url: url.to_string(),
            gate: gate_tx,
            inbound: inbound_tx,
            sent: sent_rx,
            disconnected,
        };
        (transport, remote)
    }
}

impl TransportFactory for ScriptedFactory {
    fn create(&self, params: &ConnectParams) -> Result<Box<dyn Transport>, TransportError> {
        let mut state = self.state();
        let (transport, remote) = Self::pair(&params.url, state.hold_connect);
        state.created.push(params.url.clone());
        state.remotes.push_back(remote);
        Ok(Box::new(transport))
    }
}
