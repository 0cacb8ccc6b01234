//! Solver connection.
//!
//! [`SyncChannel`] is a small state machine (`Disconnected -> Connecting ->
//! Connected`) over a pluggable [`Transport`]. It is driven by polling from the
//! host's event loop; all callbacks run on the polling thread.
//!
//! Lost or failed connections are retried after a fixed delay, forever. There
//! is no outbound buffering: sends while not connected are dropped.

mod native;

pub use native::NativeWebSocket;

use crate::config::SyncConfig;
use crate::protocol::Intent;
use std::collections::VecDeque;
use std::time::Instant;
use thiserror::Error;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Events reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection opened.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// The connection closed. `clean` is diagnostic only.
    Closed { clean: bool },
    /// Opening or using the connection failed.
    Error(String),
}

/// Sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Not connected")]
    NotConnected,
    #[error("Invalid solver URL: {0}")]
    InvalidUrl(String),
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("Malformed inbound message: {0}")]
    MalformedInbound(#[source] serde_json::Error),
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// A bidirectional text-frame connection.
pub trait Transport {
    /// Start opening a connection. Completion is reported by [`TransportEvent::Opened`].
    fn open(&mut self, url: &str) -> SyncResult<()>;

    /// Transmit one text frame.
    fn send_text(&mut self, text: &str) -> SyncResult<()>;

    /// Drain pending events without blocking.
    fn poll_events(&mut self) -> Vec<TransportEvent>;

    /// Release the connection so that `open` may be called again.
    fn close(&mut self);
}

type StateCallback = Box<dyn FnMut(ConnectionState)>;
type InboundCallback = Box<dyn FnMut(&serde_json::Value)>;

/// Resilient connection to the remote solver.
pub struct SyncChannel<T: Transport> {
    transport: T,
    config: SyncConfig,
    state: ConnectionState,
    /// The single pending reconnect deadline.
    retry_at: Option<Instant>,
    /// Events received but not yet handled.
    pending: VecDeque<TransportEvent>,
    state_listeners: Vec<StateCallback>,
    inbound: Option<InboundCallback>,
}

impl<T: Transport> SyncChannel<T> {
    pub fn new(transport: T, config: SyncConfig) -> Self {
        Self {
            transport,
            config,
            state: ConnectionState::Disconnected,
            retry_at: None,
            pending: VecDeque::new(),
            state_listeners: Vec::new(),
            inbound: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// When the pending reconnect attempt fires, if one is scheduled.
    pub fn retry_deadline(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Register a listener for state transitions.
    pub fn on_state_change(&mut self, callback: impl FnMut(ConnectionState) + 'static) {
        self.state_listeners.push(Box::new(callback));
    }

    /// Register the handler for inbound solver frames, replacing any previous one.
    pub fn on_inbound_update(&mut self, callback: impl FnMut(&serde_json::Value) + 'static) {
        self.inbound = Some(Box::new(callback));
    }

    pub fn connect(&mut self) {
        self.connect_at(Instant::now());
    }

    /// Begin connecting. Does nothing unless disconnected.
    ///
    /// A transport that fails to even start opening is treated like a lost
    /// connection: the failure is logged and a retry is scheduled.
    pub fn connect_at(&mut self, now: Instant) {
        if self.state != ConnectionState::Disconnected {
            return;
        }
        // A manual connect supersedes any pending retry.
        self.retry_at = None;
        self.set_state(ConnectionState::Connecting);
        log::info!("Connecting to solver at {}", self.config.url);
        if let Err(e) = self.transport.open(&self.config.url) {
            log::warn!("Failed to open solver connection: {e}");
            self.transport.close();
            self.set_state(ConnectionState::Disconnected);
            self.schedule_retry(now);
        }
    }

    /// Transmit an intent immediately. Dropped with [`SyncError::NotConnected`]
    /// unless connected.
    pub fn send(&mut self, intent: &Intent) -> SyncResult<()> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        let text = intent.to_json().map_err(SyncError::Serialization)?;
        self.transport.send_text(&text)
    }

    pub fn poll(&mut self) -> SyncResult<()> {
        self.poll_at(Instant::now())
    }

    /// Handle transport events, then fire the reconnect timer if it is due.
    ///
    /// A malformed inbound frame aborts this poll with
    /// [`SyncError::MalformedInbound`]; events behind it are kept for the next poll.
    pub fn poll_at(&mut self, now: Instant) -> SyncResult<()> {
        self.pending.extend(self.transport.poll_events());
        while let Some(event) = self.pending.pop_front() {
            self.handle_event(event, now)?;
        }

        if self.retry_at.is_some_and(|at| now >= at) {
            self.retry_at = None;
            self.connect_at(now);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: TransportEvent, now: Instant) -> SyncResult<()> {
        match event {
            TransportEvent::Opened => {
                if self.state == ConnectionState::Connecting {
                    log::info!("Connected to solver");
                    self.set_state(ConnectionState::Connected);
                }
            }
            TransportEvent::Message(text) => {
                let value: serde_json::Value =
                    serde_json::from_str(&text).map_err(SyncError::MalformedInbound)?;
                match self.inbound.as_mut() {
                    Some(callback) => callback(&value),
                    None => log::debug!("Inbound frame with no handler registered"),
                }
            }
            TransportEvent::Closed { clean } => {
                if clean {
                    log::info!("Solver connection closed");
                } else {
                    log::warn!("Solver connection lost");
                }
                self.drop_connection(now);
            }
            TransportEvent::Error(message) => {
                log::warn!("Solver connection error: {message}");
                if self.state == ConnectionState::Connecting {
                    self.drop_connection(now);
                }
            }
        }
        Ok(())
    }

    fn drop_connection(&mut self, now: Instant) {
        self.transport.close();
        self.set_state(ConnectionState::Disconnected);
        self.schedule_retry(now);
    }

    fn schedule_retry(&mut self, now: Instant) {
        if self.retry_at.is_none() {
            self.retry_at = Some(now + self.config.reconnect_delay);
            log::debug!("Reconnecting in {:?}", self.config.reconnect_delay);
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        self.state = state;
        for listener in &mut self.state_listeners {
            listener(state);
        }
    }
}
