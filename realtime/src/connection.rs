// Connection lifecycle manager for the realtime link
//
// A single background task owns the duplex connection and serializes every
// state transition: caller commands, transport frames, and timer fires all
// funnel through one select loop, so no two handlers ever interleave
// mutation of the connection state, the registry, or the request queue.
//
// Transport failures never propagate to subscribers. Every failure path
// ends in either "drop and continue" or "schedule retry": the failed
// control message stays queued, the state flips to disconnected, and a
// reconnect timer is armed from the backoff ladder. On reconnect the task
// re-issues a subscribe for every surviving registration before draining
// whatever is still queued.

use crate::codec::{self, InboundFrame, OutboundCommand};
use crate::limits;
use crate::naming;
use crate::queue::RequestQueue;
use crate::registry::Registry;
use crate::transport::{Connection, Transport, WsTransport};
use crate::values;
use groundlink_common::{
    BackoffSchedule, LinkConfig, LinkMetrics, ParameterSample, Result, Update,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Commands from the caller-facing surface to the connection task.
#[derive(Debug)]
pub(crate) enum LinkCommand {
    Send(OutboundCommand),
    Shutdown,
}

/// Why the connected loop was left.
enum Exit {
    Shutdown,
    Disconnected(&'static str),
}

/// Connection state, owned and transitioned only by the lifecycle task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Handle to a running link. Construction spawns the connection task; all
/// methods are non-blocking.
pub struct TelemetryLink {
    cmd_tx: mpsc::UnboundedSender<LinkCommand>,
    registry: Arc<Registry>,
    connected: Arc<AtomicBool>,
    event_key: String,
    _task: JoinHandle<()>,
}

impl TelemetryLink {
    /// Open a link over the production WebSocket transport.
    pub fn connect(config: LinkConfig) -> Result<Self> {
        Self::with_transport(config, WsTransport)
    }

    /// Open a link over an injected transport.
    pub fn with_transport<T: Transport>(config: LinkConfig, transport: T) -> Result<Self> {
        let endpoint = config.websocket_endpoint()?;
        let registry = Arc::new(Registry::new());
        let connected = Arc::new(AtomicBool::new(false));
        let event_key = config.event_key.clone();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let task = LinkTask {
            transport,
            endpoint,
            registry: Arc::clone(&registry),
            queue: RequestQueue::new(),
            backoff: BackoffSchedule::new(config.backoff_steps.clone()),
            metrics: LinkMetrics::new(),
            connected: Arc::clone(&connected),
            event_key: config.event_key,
            keepalive_interval: config.keepalive_interval,
            state: ConnectionState::Disconnected,
            seq: 0,
            conn: None,
            reconnect_at: None,
            keepalive_at: Instant::now(),
        };
        let handle = tokio::spawn(task.run(cmd_rx));

        Ok(Self {
            cmd_tx,
            registry,
            connected,
            event_key,
            _task: handle,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Ask the connection task to close the socket and stop.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(LinkCommand::Shutdown);
    }

    pub(crate) fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub(crate) fn event_key(&self) -> &str {
        &self.event_key
    }

    /// Hand a control message to the connection task: sent immediately when
    /// connected, queued otherwise. Fire-and-forget by design; failures
    /// surface only through the reconnect path.
    pub(crate) fn enqueue(&self, command: OutboundCommand) {
        if self.cmd_tx.send(LinkCommand::Send(command)).is_err() {
            warn!("link task is gone; dropping control message");
        }
    }
}

impl Drop for TelemetryLink {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(LinkCommand::Shutdown);
    }
}

struct LinkTask<T: Transport> {
    transport: T,
    endpoint: Url,
    registry: Arc<Registry>,
    queue: RequestQueue,
    backoff: BackoffSchedule,
    metrics: LinkMetrics,
    connected: Arc<AtomicBool>,
    event_key: String,
    keepalive_interval: Duration,
    state: ConnectionState,
    /// Outbound sequence counter, reset on every connect, advanced once per
    /// send attempt.
    seq: u64,
    conn: Option<T::Conn>,
    /// Armed reconnect timer. Doubles as the "already scheduled" guard:
    /// `schedule_reconnect` is a no-op while this is `Some`.
    reconnect_at: Option<Instant>,
    keepalive_at: Instant,
}

impl<T: Transport> LinkTask<T> {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<LinkCommand>) {
        self.connect().await;

        loop {
            if let Some(mut conn) = self.conn.take() {
                match self.run_connected(&mut conn, &mut cmd_rx).await {
                    Exit::Shutdown => {
                        conn.close().await;
                        self.mark_disconnected();
                        info!("link shut down");
                        return;
                    }
                    Exit::Disconnected(reason) => {
                        self.mark_disconnected();
                        info!(reason, "disconnected");
                        self.schedule_reconnect();
                    }
                }
            } else if let Some(when) = self.reconnect_at {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        if !self.handle_command_disconnected(cmd) {
                            return;
                        }
                    }
                    _ = tokio::time::sleep_until(when) => {
                        self.reconnect_at = None;
                        self.connect().await;
                    }
                }
            } else {
                // Disconnected with no retry armed; only a command can wake us.
                if !self.handle_command_disconnected(cmd_rx.recv().await) {
                    return;
                }
            }
        }
    }

    async fn run_connected(
        &mut self,
        conn: &mut T::Conn,
        cmd_rx: &mut mpsc::UnboundedReceiver<LinkCommand>,
    ) -> Exit {
        loop {
            let keepalive = tokio::time::sleep_until(self.keepalive_at);
            tokio::pin!(keepalive);

            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(LinkCommand::Send(command)) => {
                        if !self.send_or_queue(conn, command).await {
                            return Exit::Disconnected("send failure");
                        }
                    }
                    Some(LinkCommand::Shutdown) | None => return Exit::Shutdown,
                },
                frame = conn.recv() => match frame {
                    Some(Ok(text)) => self.handle_frame(&text),
                    Some(Err(e)) => {
                        warn!("transport error: {e}");
                        return Exit::Disconnected("transport error");
                    }
                    None => {
                        warn!("connection closed by remote");
                        return Exit::Disconnected("remote close");
                    }
                },
                _ = &mut keepalive => {
                    self.keepalive_at = Instant::now() + self.keepalive_interval;
                    if !self.send_keepalive(conn).await {
                        return Exit::Disconnected("keepalive send failure");
                    }
                }
            }
        }
    }

    /// No-op when already connected. Resets the outbound sequence counter,
    /// opens the derived endpoint, and on success cancels any pending
    /// reconnect, resets the backoff ladder, runs the resubscription sweep,
    /// and drains the request queue.
    async fn connect(&mut self) {
        if self.state == ConnectionState::Connected {
            return;
        }
        self.state = ConnectionState::Connecting;
        self.seq = 0;
        info!(endpoint = %self.endpoint, "connecting");

        match self.transport.connect(&self.endpoint).await {
            Ok(mut conn) => {
                info!("connected");
                self.state = ConnectionState::Connected;
                self.reconnect_at = None;
                self.backoff.reset();
                self.connected.store(true, Ordering::Relaxed);
                self.metrics.record_connection_status(true);
                self.keepalive_at = Instant::now() + self.keepalive_interval;

                if self.resubscribe_all(&mut conn).await && self.drain_queue(&mut conn).await {
                    self.conn = Some(conn);
                } else {
                    self.mark_disconnected();
                    info!("disconnected while restoring subscriptions");
                    self.schedule_reconnect();
                }
            }
            Err(e) => {
                warn!("connection attempt failed: {e}");
                self.state = ConnectionState::Disconnected;
                self.schedule_reconnect();
            }
        }
    }

    fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.connected.store(false, Ordering::Relaxed);
        self.metrics.record_connection_status(false);
    }

    /// Arm a single reconnect timer from the backoff ladder. No-op while one
    /// is already armed, so overlapping failure events cannot stack timers.
    fn schedule_reconnect(&mut self) {
        if self.reconnect_at.is_some() {
            return;
        }
        let delay = self.backoff.next_delay();
        info!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
        self.metrics.record_reconnect_scheduled(delay);
        self.reconnect_at = Some(Instant::now() + delay);
    }

    /// Returns false when the task should stop.
    fn handle_command_disconnected(&mut self, cmd: Option<LinkCommand>) -> bool {
        match cmd {
            Some(LinkCommand::Send(command)) => {
                self.queue.push(command);
                self.metrics.record_queue_depth(self.queue.len());
                true
            }
            Some(LinkCommand::Shutdown) | None => {
                info!("link shut down");
                false
            }
        }
    }

    /// Attempt an immediate send. On failure the message is preserved in the
    /// queue and false is returned; the caller tears the connection down and
    /// the reconnect path takes over. The original caller is never informed.
    async fn send_or_queue(&mut self, conn: &mut T::Conn, command: OutboundCommand) -> bool {
        self.seq += 1;
        let frame = codec::encode_frame(self.seq, &command);
        match conn.send(frame).await {
            Ok(()) => {
                self.metrics.record_control_sent(command.verb());
                true
            }
            Err(e) => {
                warn!("failed to send {}: {e}; queued for redelivery", command.verb());
                self.queue.push(command);
                self.metrics.record_queue_depth(self.queue.len());
                false
            }
        }
    }

    /// Re-issue a subscribe for every registered entry. Queued
    /// subscribe-class messages are superseded by this sweep and dropped
    /// before the remaining queue drains. Duplicate subscribes on the server
    /// side are expected and harmless.
    async fn resubscribe_all(&mut self, conn: &mut T::Conn) -> bool {
        self.queue.discard_superseded();
        self.metrics.record_queue_depth(self.queue.len());

        let keys = self.registry.keys();
        if !keys.is_empty() {
            info!(count = keys.len(), "restoring subscriptions");
        }
        for key in keys {
            let command = self.subscribe_command(&key);
            if !self.send_or_queue(conn, command).await {
                return false;
            }
        }
        true
    }

    fn subscribe_command(&self, key: &str) -> OutboundCommand {
        if key == self.event_key {
            OutboundCommand::SubscribeEvents
        } else {
            OutboundCommand::SubscribeParameters(vec![naming::to_qualified_name(key)])
        }
    }

    /// Drain the queue front-to-back. The first failure aborts the drain,
    /// leaving the failed message and the unsent suffix queued, in order,
    /// for the next attempt.
    async fn drain_queue(&mut self, conn: &mut T::Conn) -> bool {
        while let Some(command) = self.queue.front().cloned() {
            self.seq += 1;
            let frame = codec::encode_frame(self.seq, &command);
            match conn.send(frame).await {
                Ok(()) => {
                    self.metrics.record_control_sent(command.verb());
                    self.queue.pop_front();
                }
                Err(e) => {
                    warn!("queue drain aborted: {e}");
                    self.metrics.record_queue_depth(self.queue.len());
                    return false;
                }
            }
        }
        self.metrics.record_queue_depth(0);
        true
    }

    /// Keepalive refresh: a blanket no-parameter subscribe plus an events
    /// subscribe, re-asserting interest so intermediaries do not idle the
    /// link out.
    async fn send_keepalive(&mut self, conn: &mut T::Conn) -> bool {
        debug!("keepalive refresh");
        if !self
            .send_or_queue(conn, OutboundCommand::SubscribeParameters(Vec::new()))
            .await
        {
            return false;
        }
        self.send_or_queue(conn, OutboundCommand::SubscribeEvents).await
    }

    fn handle_frame(&mut self, text: &str) {
        match codec::decode_frame(text) {
            Some(InboundFrame::Parameters(updates)) => {
                self.metrics.record_frame_routed("parameter");
                for update in updates {
                    let key = naming::to_channel_key(&update.id.name);
                    let violation = limits::evaluate(&update);
                    let sample = ParameterSample {
                        channel: key.clone(),
                        timestamp: update.generation_time,
                        value: update.eng_value.as_ref().and_then(values::extract),
                        violation,
                    };
                    if !self.registry.dispatch(&key, Update::Parameter(sample)) {
                        // Expected during unsubscribe races: in-flight data
                        // for a channel nobody listens to any more.
                        debug!(channel = %key, "dropping sample for unregistered channel");
                        self.metrics.record_frame_dropped("unregistered");
                    }
                }
            }
            Some(InboundFrame::Event(record)) => {
                self.metrics.record_frame_routed("event");
                if !self.registry.dispatch(&self.event_key, Update::Event(record)) {
                    debug!("dropping event with no registered listener");
                    self.metrics.record_frame_dropped("unregistered");
                }
            }
            None => {
                debug!("dropping unrecognized inbound frame");
                self.metrics.record_frame_dropped("malformed");
            }
        }
    }
}
