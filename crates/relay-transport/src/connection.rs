// relay/crates/relay-transport/src/connection.rs
use crate::error::TransportError;
use crate::state::{ConnectionState, StateCell, StateEvent};
use crate::traits::Transport;
use crate::types::ConnectParams;
use actix::prelude::*;
use log::{debug, error, info, trace, warn};
use tokio::sync::mpsc;

/// Actor owning a single physical connection.
///
/// It drives the transport's connect/read/write loop, is the only writer of the
/// connection's [`StateCell`], and reports open/message/error/close to the
/// recipient it was created with. A terminal state stops the actor once the
/// transport has been disconnected; there is no reconnect.
pub struct ConnectionActor {
    params: ConnectParams,
    state: StateCell,
    // Taken when the connection task starts
    transport: Option<Result<Box<dyn Transport>, TransportError>>,
    events: Recipient<ConnectionEvent>,
    // Feeds the write half of the connection task
    outgoing_tx: Option<mpsc::UnboundedSender<String>>,
    connection_task: Option<SpawnHandle>,
}

impl ConnectionActor {
    /// `transport` is whatever the factory produced for `params.url`; a factory
    /// error is reported as a transport failure once the actor starts.
    pub fn new(
        params: ConnectParams,
        transport: Result<Box<dyn Transport>, TransportError>,
        state: StateCell,
        events: Recipient<ConnectionEvent>,
    ) -> Self {
        ConnectionActor {
            params,
            state,
            transport: Some(transport),
            events,
            outgoing_tx: None,
            connection_task: None,
        }
    }

    fn start_connection_task(&mut self, ctx: &mut Context<Self>) {
        let Some(transport) = self.transport.take() else {
            warn!(
                "Connection task for {} already started (state: {}). Ignoring start request.",
                self.params.url,
                self.state.get()
            );
            return;
        };

        self.transition(StateEvent::Initiate, None, ctx);

        let mut transport = match transport {
            Ok(transport) => transport,
            Err(e) => {
                error!("Failed to create transport for {}: {}", self.params.url, e);
                ctx.notify(TransportEvent::Failed(e));
                return;
            }
        };

        let addr = ctx.address();
        let url = self.params.url.clone();
        let connect_timeout = self.params.connection_timeout;

        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<String>();
        self.outgoing_tx = Some(outgoing_tx);

        let connection_fut = async move {
            info!("Attempting to connect transport to {}...", url);
            match tokio::time::timeout(connect_timeout, transport.connect()).await {
                Ok(Ok(())) => {
                    addr.do_send(TransportEvent::Connected);

                    loop {
                        tokio::select! {
                            biased;

                            maybe_frame = outgoing_rx.recv() => {
                                let Some(frame) = maybe_frame else {
                                    debug!("Outgoing frame channel closed, ending connection loop.");
                                    break;
                                };
                                trace!("Sending frame: {}", frame);
                                if let Err(e) = transport.send(&frame).await {
                                    error!("Transport send error on {}: {}", url, e);
                                    addr.do_send(TransportEvent::Failed(e));
                                    break;
                                }
                            },

                            received = transport.receive() => {
                                match received {
                                    Some(Ok(frame)) => addr.do_send(TransportEvent::Frame(frame)),
                                    Some(Err(e)) => {
                                        error!("Transport receive error on {}: {}", url, e);
                                        addr.do_send(TransportEvent::Failed(e));
                                        break;
                                    }
                                    None => {
                                        info!("Transport {} closed by remote.", url);
                                        addr.do_send(TransportEvent::Closed);
                                        break;
                                    }
                                }
                            }
                        }
                    }

                    match tokio::time::timeout(connect_timeout, transport.disconnect()).await {
                        Ok(Ok(())) => debug!("Transport {} disconnected.", url),
                        Ok(Err(e)) => {
                            warn!("Error during transport disconnect after loop exit: {}", e)
                        }
                        Err(_) => warn!("Transport disconnect for {} timed out.", url),
                    }
                }
                Ok(Err(e)) => {
                    error!("Transport connect error for {}: {}", url, e);
                    addr.do_send(TransportEvent::Failed(e));
                }
                Err(_) => {
                    error!("Transport connection to {} timed out after {:?}", url, connect_timeout);
                    addr.do_send(TransportEvent::Failed(TransportError::Timeout));
                }
            }
            debug!("Connection task for {} finished.", url);
        };

        let task = connection_fut
            .into_actor(self)
            .map(|(), act, ctx| act.connection_task_finished(ctx));
        self.connection_task = Some(ctx.spawn(task));
    }

    /// The actor outlives a terminal transition until the task has disconnected.
    fn connection_task_finished(&mut self, ctx: &mut Context<Self>) {
        self.connection_task = None;
        if self.state.get().is_terminal() {
            ctx.stop();
        }
    }

    /// Applies `event` to the state machine. On a valid transition the new
    /// state is published and `report` forwarded; invalid ones are ignored.
    fn transition(
        &mut self,
        event: StateEvent,
        report: Option<ConnectionEvent>,
        ctx: &mut Context<Self>,
    ) {
        let current = self.state.get();
        let Some(next) = current.next(event) else {
            trace!(
                "Ignoring {:?} for {} in state {}",
                event, self.params.url, current
            );
            return;
        };

        info!(
            "Connection {} state changing from {} -> {}",
            self.params.url, current, next
        );
        self.state.set(next);

        if let Some(report) = report {
            self.events.do_send(report);
        }

        if next.is_terminal() {
            // Dropping the sender ends the write half of the loop
            self.outgoing_tx = None;
            if self.connection_task.is_some() {
                debug!("Waiting for connection task of {} to disconnect.", self.params.url);
            } else {
                ctx.stop();
            }
        }
    }
}

// --- Actor Messages ---

/// Sends one encoded frame over the connection.
///
/// Only meaningful while the connection is `Open`; in any other state the frame
/// is logged and discarded.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct SendFrame(pub String);

/// What the connection reports to its owner.
#[derive(Message, Debug, Clone, PartialEq)]
#[rtype(result = "()")]
pub enum ConnectionEvent {
    Opened,
    Frame(String),
    Failed(TransportError),
    Closed,
}

/// Internal message used by the connection task to update the actor.
#[derive(Message)]
#[rtype(result = "()")]
enum TransportEvent {
    Connected,
    Frame(String),
    Failed(TransportError),
    Closed,
}

// --- Actor Implementation ---

impl Actor for ConnectionActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("ConnectionActor starting for {}", self.params.url);
        self.start_connection_task(ctx);
    }

    fn stopping(&mut self, ctx: &mut Self::Context) -> Running {
        info!(
            "ConnectionActor for {} stopping in state {}.",
            self.params.url,
            self.state.get()
        );
        self.outgoing_tx = None;
        if let Some(task) = self.connection_task.take() {
            debug!("Cancelling connection task for {}.", self.params.url);
            ctx.cancel_future(task);
        }
        Running::Stop
    }
}

// --- Message Handlers ---

impl Handler<TransportEvent> for ConnectionActor {
    type Result = ();

    fn handle(&mut self, msg: TransportEvent, ctx: &mut Context<Self>) {
        match msg {
            TransportEvent::Connected => {
                self.transition(StateEvent::Open, Some(ConnectionEvent::Opened), ctx)
            }
            TransportEvent::Frame(frame) => {
                if self.state.get() == ConnectionState::Open {
                    self.events.do_send(ConnectionEvent::Frame(frame));
                } else {
                    trace!("Discarding frame received in state {}", self.state.get());
                }
            }
            TransportEvent::Failed(e) => {
                self.transition(StateEvent::Error, Some(ConnectionEvent::Failed(e)), ctx)
            }
            TransportEvent::Closed => {
                self.transition(StateEvent::Close, Some(ConnectionEvent::Closed), ctx)
            }
        }
    }
}

impl Handler<SendFrame> for ConnectionActor {
    type Result = ();

    fn handle(&mut self, msg: SendFrame, _ctx: &mut Context<Self>) {
        let state = self.state.get();
        if state != ConnectionState::Open {
            debug!(
                "Discarding outbound frame for {} (state: {})",
                self.params.url, state
            );
            return;
        }

        match &self.outgoing_tx {
            Some(tx) => {
                if tx.send(msg.0).is_err() {
                    warn!("Connection task for {} is gone; frame discarded.", self.params.url);
                }
            }
            None => warn!(
                "Outgoing channel missing for {} while open; frame discarded.",
                self.params.url
            ),
        }
    }
}
