//! Reconnecting subscription to one chat room.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use url::Url;

use super::config::ChannelConfig;
use super::frame::{InboundFrame, OutboundFrame};
use super::observer::Observer;
use super::state::{ChannelState, CloseReason};
use super::transport::{Connector, Transport, TransportEvent, WsConnector};
use crate::error::{NetworkError, Result};
use crate::model::{Message, ParticipantId, RoomId};

const TARGET: &str = "chatline_net::realtime";

/// Command sent to the session task.
enum Command {
    Ping,
    Close,
}

/// Result of the connection attempt in flight. `None` while pending.
type Outcome = Option<Result<()>>;

/// Handle to a running session task.
struct Session {
    commands: mpsc::UnboundedSender<Command>,
    /// Outcome of the session's current attempt, shared by every `connect`
    /// waiting on it.
    outcome: watch::Receiver<Outcome>,
    task: JoinHandle<()>,
}

impl Session {
    /// Ask the task to close intentionally and detach from it.
    fn close(self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Ask the task to close intentionally and wait up to `grace` for it to finish.
    async fn shutdown(mut self, grace: Duration) {
        let _ = self.commands.send(Command::Close);
        if tokio::time::timeout(grace, &mut self.task).await.is_err() {
            tracing::warn!(target: TARGET, grace_ms = grace.as_millis() as u64, "previous session did not close in time, aborting");
            self.task.abort();
        }
    }
}

/// Mutable per-channel state. Every write from a session task is checked
/// against `generation`, so tasks replaced by `connect` or `disconnect` can't
/// touch it.
struct Slot {
    generation: u64,
    room: Option<RoomId>,
    participant: Option<ParticipantId>,
    reconnect_attempt: u32,
    session: Option<Session>,
}

struct Shared {
    slot: Mutex<Slot>,
    /// Lock-free copy of `slot.generation` for the frame path.
    generation: AtomicU64,
    state: watch::Sender<ChannelState>,
    on_message: Observer<Message>,
    on_error: Observer<NetworkError>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Bump the generation, invalidating the running session. Returns the new value.
    fn advance(&self, slot: &mut Slot) -> u64 {
        slot.generation += 1;
        self.generation.store(slot.generation, Ordering::Release);
        slot.generation
    }

    /// Run `f` under the lock if `generation` is still current.
    fn with_current(&self, generation: u64, f: impl FnOnce(&mut Slot)) -> bool {
        let mut slot = self.slot.lock();
        if slot.generation != generation {
            return false;
        }
        f(&mut slot);
        true
    }

    fn set_state(&self, generation: u64, state: ChannelState) -> bool {
        self.with_current(generation, |_| {
            self.state.send_replace(state);
        })
    }

    fn mark_open(&self, generation: u64) -> bool {
        self.with_current(generation, |slot| {
            slot.reconnect_attempt = 0;
            self.state.send_replace(ChannelState::Open);
        })
    }

    fn begin_reconnect(&self, generation: u64, attempt: u32) -> bool {
        self.with_current(generation, |slot| {
            slot.reconnect_attempt = attempt;
            self.state.send_replace(ChannelState::Reconnecting);
        })
    }

    fn report_error(&self, generation: u64, error: &NetworkError) {
        if self.is_current(generation) {
            self.on_error.emit(error);
        }
    }

    fn dispatch(&self, generation: u64, text: &str) {
        match InboundFrame::decode(text) {
            Ok(InboundFrame::NewMessage { message }) => {
                if !self.is_current(generation) {
                    return;
                }
                if !self.on_message.emit(&message) {
                    tracing::trace!(target: TARGET, id = message.id, "no message observer registered");
                }
            }
            Ok(InboundFrame::Connection { status, chat_id }) => {
                tracing::debug!(target: TARGET, %status, ?chat_id, "subscription confirmed");
            }
            Ok(InboundFrame::Pong) => {}
            Ok(InboundFrame::Unknown) => {
                tracing::trace!(target: TARGET, "ignoring frame of unknown type");
            }
            Err(e) => {
                tracing::warn!(target: TARGET, error = %e, "dropping malformed frame");
            }
        }
    }
}

/// A live subscription to one chat room's message stream.
///
/// The channel owns at most one transport at a time. It decodes inbound frames,
/// hands new messages to the registered observer, and reconnects with backoff
/// after unexpected closes.
///
/// # Observers
///
/// - [`on_message`](Self::on_message): called once per `new_message` frame, in receive order
/// - [`on_error`](Self::on_error): called on transport errors, connection timeouts and when
///   the reconnection policy gives up
///
/// Each holds a single callback; registering again replaces it.
///
/// # Example
///
/// ```ignore
/// let channel = RealtimeChannel::new(ChannelConfig::new(EndpointConfig::from_env()));
///
/// channel.on_message(|message| println!("{}: {}", message.id, message.body));
/// channel.on_error(|error| eprintln!("realtime: {error}"));
///
/// channel.connect(42, Some(7)).await?;
/// // ...
/// channel.disconnect();
/// ```
pub struct RealtimeChannel<C: Connector = WsConnector> {
    config: ChannelConfig,
    connector: Arc<C>,
    shared: Arc<Shared>,
}

impl RealtimeChannel<WsConnector> {
    /// Create a channel that connects over WebSocket.
    pub fn new(config: ChannelConfig) -> Self {
        let connector = WsConnector::with_headers(config.headers.clone());
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> RealtimeChannel<C> {
    /// Create a channel on top of a custom connector.
    pub fn with_connector(config: ChannelConfig, connector: C) -> Self {
        Self {
            config,
            connector: Arc::new(connector),
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    generation: 0,
                    room: None,
                    participant: None,
                    reconnect_attempt: 0,
                    session: None,
                }),
                generation: AtomicU64::new(0),
                state: watch::Sender::new(ChannelState::Idle),
                on_message: Observer::new(),
                on_error: Observer::new(),
            }),
        }
    }

    /// Subscribe to `room`, optionally identifying as `participant`.
    ///
    /// Resolves once the transport is open. If the channel is already open on
    /// `room` this returns immediately; a connection to a different room is
    /// closed intentionally first. Fails with
    /// [`NetworkError::ConnectionTimeout`] when nothing opens within the
    /// connect timeout, or with the transport's error when it fails before
    /// opening.
    ///
    /// If [`disconnect`](Self::disconnect) or another `connect` supersedes this
    /// call before the transport opens, it resolves with `Ok(())`.
    pub async fn connect(&self, room: RoomId, participant: Option<ParticipantId>) -> Result<()> {
        let url = self.config.endpoint.room_url(room, participant)?;

        let outcome = {
            let mut slot = self.shared.slot.lock();
            let state = *self.shared.state.borrow();
            let same_room = slot.room == Some(room) && slot.session.is_some();

            if same_room && state == ChannelState::Open {
                tracing::debug!(target: TARGET, room, "already connected");
                return Ok(());
            }

            let pending = if same_room && state.is_pending() {
                slot.session.as_ref().map(|session| session.outcome.clone())
            } else {
                None
            };
            match pending {
                Some(outcome) => {
                    tracing::debug!(target: TARGET, room, "joining attempt in flight");
                    outcome
                }
                None => self.start_session(&mut slot, room, participant, url),
            }
        };

        Self::await_outcome(outcome, room).await
    }

    /// Wait for the attempt behind `outcome` to open or fail.
    async fn await_outcome(mut outcome: watch::Receiver<Outcome>, room: RoomId) -> Result<()> {
        let settled = outcome.wait_for(Option::is_some).await.map(|o| (*o).clone());
        match settled {
            Ok(Some(result)) => result,
            _ => {
                tracing::debug!(target: TARGET, room, "connect superseded before the transport opened");
                Ok(())
            }
        }
    }

    fn start_session(
        &self,
        slot: &mut Slot,
        room: RoomId,
        participant: Option<ParticipantId>,
        url: Url,
    ) -> watch::Receiver<Outcome> {
        let previous = slot.session.take();
        let generation = self.shared.advance(slot);
        slot.room = Some(room);
        slot.participant = participant;
        slot.reconnect_attempt = 0;

        let state = if previous.is_some() {
            ChannelState::Closing
        } else {
            ChannelState::Connecting
        };
        self.shared.state.send_replace(state);

        tracing::info!(target: TARGET, room, ?participant, %url, "connecting");

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = watch::channel(None);
        let runner = SessionRunner {
            shared: self.shared.clone(),
            connector: self.connector.clone(),
            config: self.config.clone(),
            url,
            generation,
            commands: commands_rx,
            outcome: outcome_tx,
        };
        let task = tokio::spawn(runner.run(previous));

        slot.session = Some(Session {
            commands: commands_tx,
            outcome: outcome_rx.clone(),
            task,
        });
        outcome_rx
    }

    /// Close the connection and stop reconnecting.
    ///
    /// Safe to call at any time, any number of times. Pending backoff and
    /// timeout timers are cancelled; an outstanding [`connect`](Self::connect)
    /// resolves with `Ok(())`.
    pub fn disconnect(&self) {
        let session = {
            let mut slot = self.shared.slot.lock();
            self.shared.advance(&mut slot);
            slot.room = None;
            slot.participant = None;
            slot.reconnect_attempt = 0;

            let session = slot.session.take();
            if session.is_some() || *self.shared.state.borrow() != ChannelState::Idle {
                self.shared.state.send_replace(ChannelState::Closed);
            }
            session
        };

        if let Some(session) = session {
            tracing::info!(target: TARGET, "disconnecting");
            session.close();
        }
    }

    /// Register the message observer, replacing any previous one.
    pub fn on_message<F>(&self, callback: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.shared.on_message.set(callback);
    }

    /// Register the error observer, replacing any previous one.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&NetworkError) + Send + Sync + 'static,
    {
        self.shared.on_error.set(callback);
    }

    /// Send a heartbeat ping.
    ///
    /// Returns an error unless the channel is open.
    pub fn send_ping(&self) -> Result<()> {
        let slot = self.shared.slot.lock();
        if *self.shared.state.borrow() != ChannelState::Open {
            return Err(NetworkError::NotConnected);
        }
        match slot.session.as_ref() {
            Some(session) => session
                .commands
                .send(Command::Ping)
                .map_err(|_| NetworkError::NotConnected),
            None => Err(NetworkError::NotConnected),
        }
    }

    /// Check if the transport is currently open.
    pub fn is_connected(&self) -> bool {
        *self.shared.state.borrow() == ChannelState::Open
    }

    /// Get the current channel state.
    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    /// Watch state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    /// The room the channel is subscribed to, if any.
    pub fn current_room(&self) -> Option<RoomId> {
        self.shared.slot.lock().room
    }

    /// The participant id sent with the subscription, if any.
    pub fn participant(&self) -> Option<ParticipantId> {
        self.shared.slot.lock().participant
    }

    /// Number of reconnection attempts made since the last successful open.
    pub fn reconnect_attempt(&self) -> u32 {
        self.shared.slot.lock().reconnect_attempt
    }

    /// The channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}

impl<C: Connector> Drop for RealtimeChannel<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<C: Connector> std::fmt::Debug for RealtimeChannel<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeChannel")
            .field("room", &self.current_room())
            .field("state", &self.state())
            .finish()
    }
}

/// How an open session ended.
enum SessionEnd {
    /// Close requested by the owner.
    Intentional,
    /// The peer closed or the connection dropped.
    Closed(CloseReason),
    /// The transport failed; the error was already reported.
    Failed,
}

/// Body of the session task: connect, pump frames, reconnect.
struct SessionRunner<C: Connector> {
    shared: Arc<Shared>,
    connector: Arc<C>,
    config: ChannelConfig,
    url: Url,
    generation: u64,
    commands: mpsc::UnboundedReceiver<Command>,
    outcome: watch::Sender<Outcome>,
}

impl<C: Connector> SessionRunner<C> {
    async fn run(mut self, previous: Option<Session>) {
        if let Some(previous) = previous {
            previous.shutdown(self.config.close_timeout).await;
        }

        let generation = self.generation;
        let mut ever_opened = false;
        let mut attempt: u32 = 0;

        loop {
            // Reset before the state flips to `Connecting`: joiners wait on this attempt.
            self.outcome.send_replace(None);
            if !self.shared.set_state(generation, ChannelState::Connecting) {
                return;
            }

            match self.open().await {
                Ok(None) => return,
                Ok(Some(mut transport)) => {
                    if !self.shared.mark_open(generation) {
                        let _ = transport.close(CloseReason::normal()).await;
                        return;
                    }
                    attempt = 0;
                    ever_opened = true;
                    tracing::info!(target: TARGET, url = %self.url, "connected");
                    self.outcome.send_replace(Some(Ok(())));

                    match self.pump(&mut transport).await {
                        SessionEnd::Intentional => {
                            if let Err(e) = transport.close(CloseReason::normal()).await {
                                tracing::debug!(target: TARGET, error = %e, "close handshake failed");
                            }
                            return;
                        }
                        SessionEnd::Closed(reason) if reason.code.is_clean() => {
                            tracing::info!(target: TARGET, code = reason.code.as_u16(), "server closed the connection");
                            self.shared.set_state(generation, ChannelState::Closed);
                            return;
                        }
                        SessionEnd::Closed(reason) => {
                            tracing::warn!(
                                target: TARGET,
                                code = reason.code.as_u16(),
                                reason = reason.reason.as_deref().unwrap_or(""),
                                "connection lost"
                            );
                        }
                        SessionEnd::Failed => {}
                    }
                }
                Err(err) => {
                    // Only reconnect attempts keep going after a failure; the
                    // first attempt reports back to `connect` instead.
                    let terminal = err.is_terminal() || !ever_opened;
                    if terminal {
                        tracing::warn!(target: TARGET, url = %self.url, error = %err, "connection failed");
                        self.shared.set_state(generation, ChannelState::Closed);
                    } else {
                        tracing::debug!(target: TARGET, attempt, error = %err, "reconnect attempt failed");
                    }
                    self.shared.report_error(generation, &err);
                    self.outcome.send_replace(Some(Err(err)));
                    if terminal {
                        return;
                    }
                }
            }

            let max_attempts = self.config.reconnect.max_attempts;
            if attempt >= max_attempts {
                let err = NetworkError::MaxReconnectAttemptsExceeded { attempts: attempt };
                tracing::warn!(target: TARGET, url = %self.url, attempts = attempt, "giving up on reconnection");
                if self.shared.set_state(generation, ChannelState::Closed) {
                    self.shared.report_error(generation, &err);
                }
                return;
            }

            attempt += 1;
            let delay = self.config.reconnect.delay_for_attempt(attempt);
            if !self.shared.begin_reconnect(generation, attempt) {
                return;
            }
            tracing::info!(
                target: TARGET,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "scheduling reconnect"
            );

            tokio::select! {
                biased;
                _ = wait_for_close(&mut self.commands) => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Open a transport, giving up after the connect timeout. `Ok(None)` means
    /// the owner closed the session while connecting.
    async fn open(&mut self) -> Result<Option<C::Transport>> {
        let timeout = self.config.connect_timeout;
        let connect = tokio::time::timeout(timeout, self.connector.connect(&self.url));

        tokio::select! {
            biased;
            _ = wait_for_close(&mut self.commands) => Ok(None),
            result = connect => match result {
                Ok(Ok(transport)) => Ok(Some(transport)),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(NetworkError::ConnectionTimeout(timeout)),
            },
        }
    }

    /// Move frames until the session ends.
    async fn pump(&mut self, transport: &mut C::Transport) -> SessionEnd {
        let period = self.config.heartbeat_interval.filter(|p| !p.is_zero());
        let mut heartbeat = period.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Ping) => {
                        if let Err(err) = send_frame(transport, OutboundFrame::Ping).await {
                            self.shared.report_error(self.generation, &err);
                            return SessionEnd::Failed;
                        }
                    }
                    Some(Command::Close) | None => return SessionEnd::Intentional,
                },
                event = transport.next_event() => match event {
                    TransportEvent::Text(text) => self.shared.dispatch(self.generation, &text),
                    TransportEvent::Closed(reason) => return SessionEnd::Closed(reason),
                    TransportEvent::Error(err) => {
                        tracing::warn!(target: TARGET, error = %err, "transport error");
                        self.shared.report_error(self.generation, &err);
                        return SessionEnd::Failed;
                    }
                },
                _ = tick(&mut heartbeat) => {
                    if let Err(err) = send_frame(transport, OutboundFrame::Ping).await {
                        self.shared.report_error(self.generation, &err);
                        return SessionEnd::Failed;
                    }
                }
            }
        }
    }
}

async fn send_frame<T: Transport>(transport: &mut T, frame: OutboundFrame) -> Result<()> {
    transport.send_text(frame.encode()?).await
}

/// Resolve when the owner asks to close. Pings are dropped: nothing is open.
async fn wait_for_close(commands: &mut mpsc::UnboundedReceiver<Command>) {
    loop {
        match commands.recv().await {
            Some(Command::Close) | None => return,
            Some(Command::Ping) => {}
        }
    }
}

async fn tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
