//! Upstream connection lifecycle.
//!
//! A [`ConnectionManager`] owns at most one link at a time. Each link runs
//! in its own I/O task which reports back through [`UpstreamEvent`]s; the
//! manager itself is driven from a single event loop by alternating
//! [`ConnectionManager::next_event`] and [`ConnectionManager::handle_event`].
//!
//! Lifecycle:
//! - `start()` moves `Disconnected -> Connecting` and opens a link.
//! - `Opened` moves to `Connected` and fires the version handshake.
//! - `Error` moves to `Disconnected`.
//! - `Closed` moves to `Disconnected` and arms the reconnect timer.
//! - `shutdown()` cancels the timer, closes the link, and ignores anything
//!   that arrives afterwards.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use godot_mcp_core::{
    decode_result, CommandId, ConnectionState, UpstreamCommand, UpstreamResult, BRIDGE_VERSION,
    HANDSHAKE_COMMAND,
};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Sleep;

use crate::correlator::{Completion, Correlator};
use crate::transport::{Connector, Link};

/// Delay between losing the link and the next connect attempt.
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Something that happened on the upstream link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// Transport-level open succeeded.
    Opened,
    /// A whole text frame arrived.
    Message(String),
    /// Connect, read, or write failed. Always followed by `Closed`.
    Error(String),
    /// The link is gone.
    Closed,
}

/// Owner of the single upstream link.
pub struct ConnectionManager {
    url: String,
    connector: Arc<dyn Connector>,
    reconnect_delay: Duration,
    server_version: String,
    state: ConnectionState,
    correlator: Correlator,
    /// Frames queued here are written by the link task in order.
    writer: Option<mpsc::UnboundedSender<String>>,
    link_task: Option<JoinHandle<()>>,
    retry: Option<Pin<Box<Sleep>>>,
    events_tx: mpsc::UnboundedSender<UpstreamEvent>,
    events_rx: mpsc::UnboundedReceiver<UpstreamEvent>,
    shut_down: bool,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            url: url.into(),
            connector,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            server_version: BRIDGE_VERSION.to_string(),
            state: ConnectionState::Disconnected,
            correlator: Correlator::new(),
            writer: None,
            link_task: None,
            retry: None,
            events_tx,
            events_rx,
            shut_down: false,
        }
    }

    /// Override the fixed reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Version announced in the handshake.
    pub fn with_server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = version.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    /// Begin the first connect attempt.
    pub fn start(&mut self) {
        self.connect();
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "upstream state change");
            self.state = next;
        }
    }

    fn connect(&mut self) {
        if self.shut_down || self.link_task.is_some() {
            return;
        }
        tracing::info!(url = %self.url, "connecting to Godot");
        self.set_state(ConnectionState::Connecting);

        let (writer, outgoing) = mpsc::unbounded_channel();
        let attempt = self.connector.connect(&self.url);
        let events = self.events_tx.clone();
        self.writer = Some(writer);
        self.link_task = Some(tokio::spawn(async move {
            match attempt.await {
                Ok(link) => {
                    let _ = events.send(UpstreamEvent::Opened);
                    drive_link(link, outgoing, &events).await;
                }
                Err(e) => {
                    let _ = events.send(UpstreamEvent::Error(e.to_string()));
                }
            }
            let _ = events.send(UpstreamEvent::Closed);
        }));
    }

    /// Wait for the next link event.
    ///
    /// Also fires the reconnect timer when it is due, so the caller only has
    /// to poll this one future. Cancel safe.
    pub async fn next_event(&mut self) -> UpstreamEvent {
        loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => return event,
                () = retry_elapsed(self.retry.as_mut()) => {
                    self.retry = None;
                    self.connect();
                }
            }
        }
    }

    /// Apply one link event to the state machine.
    pub fn handle_event(&mut self, event: UpstreamEvent) {
        if self.shut_down {
            return;
        }
        match event {
            UpstreamEvent::Opened => {
                tracing::info!(url = %self.url, "connected to Godot");
                self.set_state(ConnectionState::Connected);
                self.handshake();
            }
            UpstreamEvent::Message(text) => self.on_message(&text),
            UpstreamEvent::Error(reason) => {
                tracing::warn!(url = %self.url, %reason, "upstream link error");
                self.set_state(ConnectionState::Disconnected);
            }
            UpstreamEvent::Closed => {
                tracing::warn!(
                    url = %self.url,
                    delay_ms = self.reconnect_delay.as_millis() as u64,
                    pending = self.correlator.pending(),
                    "upstream link closed, reconnecting"
                );
                self.set_state(ConnectionState::Disconnected);
                self.writer = None;
                self.link_task = None;
                self.retry = Some(Box::pin(tokio::time::sleep(self.reconnect_delay)));
            }
        }
    }

    fn on_message(&mut self, text: &str) {
        let result = match decode_result(text) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable upstream frame");
                return;
            }
        };
        let Some(id) = result.id.clone() else {
            tracing::warn!("dropping upstream result without id");
            return;
        };
        tracing::debug!(%id, status = ?result.status, "upstream result");
        self.correlator.resolve(&id, result);
    }

    fn handshake(&mut self) {
        let (tx, rx) = oneshot::channel();
        let params = UpstreamCommand::handshake_params(&self.server_version);
        self.send(HANDSHAKE_COMMAND, params, Some(tx));
        tokio::spawn(async move {
            let Ok(result) = rx.await else {
                return;
            };
            match result.handshake_info() {
                Some(info) => tracing::info!(
                    godot_version = info.godot_version.as_deref().unwrap_or("unknown"),
                    addon_version = info.addon_version.as_deref().unwrap_or("unknown"),
                    "handshake successful"
                ),
                None => tracing::warn!(status = ?result.status, "handshake not acknowledged"),
            }
        });
    }

    /// Send a command upstream.
    ///
    /// While not connected, `reply` immediately receives
    /// [`UpstreamResult::not_connected`] and nothing is written or queued.
    /// Otherwise the command gets a fresh id, `reply` is registered under it,
    /// and the frame is handed to the link. Returns the id used, if any.
    pub fn send(
        &mut self,
        command: &str,
        params: Value,
        reply: Option<Completion>,
    ) -> Option<CommandId> {
        let writer = match (&self.writer, self.state) {
            (Some(writer), ConnectionState::Connected) => writer.clone(),
            _ => {
                tracing::warn!(command, state = %self.state, "not connected, rejecting command");
                if let Some(reply) = reply {
                    let _ = reply.send(UpstreamResult::not_connected());
                }
                return None;
            }
        };

        let id = self.correlator.next_identifier();
        let frame = match UpstreamCommand::new(id.clone(), command, params).encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(command, error = %e, "failed to encode command");
                return None;
            }
        };

        self.correlator.register(id.clone(), reply);
        tracing::debug!(%id, command, "sending command upstream");
        if writer.send(frame).is_err() {
            // The link task already exited; its Closed event is on the way.
            tracing::warn!(%id, command, "link gone before command was written");
        }
        Some(id)
    }

    /// Close the link for good.
    ///
    /// Pending commands are not resolved and no reconnect is scheduled.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        tracing::info!(pending = self.correlator.pending(), "closing upstream connection");
        self.shut_down = true;
        self.retry = None;
        // Dropping the writer lets an open link send a close frame.
        self.writer = None;
        if let Some(task) = self.link_task.take() {
            if self.state != ConnectionState::Connected {
                task.abort();
            }
        }
        self.set_state(ConnectionState::Disconnected);
    }
}

async fn retry_elapsed(retry: Option<&mut Pin<Box<Sleep>>>) {
    match retry {
        Some(sleep) => sleep.await,
        None => std::future::pending().await,
    }
}

/// Pump one open link until either side closes it.
async fn drive_link(
    link: Link,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: &mpsc::UnboundedSender<UpstreamEvent>,
) {
    let Link {
        mut sink,
        mut stream,
    } = link;

    loop {
        tokio::select! {
            frame = outgoing.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = sink.send(frame).await {
                        let _ = events.send(UpstreamEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(text)) => {
                    let _ = events.send(UpstreamEvent::Message(text));
                }
                Some(Err(e)) => {
                    let _ = events.send(UpstreamEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            },
        }
    }
}
