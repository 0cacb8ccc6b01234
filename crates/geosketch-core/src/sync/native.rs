//! Native WebSocket transport.
//!
//! The socket lives on a background thread; the host thread talks to it
//! through channels and never blocks.

use super::{SyncError, SyncResult, Transport, TransportEvent};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::{Message, connect};
use url::Url;

/// Commands sent to the WebSocket thread.
enum WsCommand {
    Send(String),
    Close,
}

/// WebSocket transport backed by `tungstenite`.
#[derive(Default)]
pub struct NativeWebSocket {
    /// Channel to send commands to the WebSocket thread.
    cmd_tx: Option<Sender<WsCommand>>,
    /// Channel to receive events from the WebSocket thread.
    event_rx: Option<Receiver<TransportEvent>>,
    _thread: Option<JoinHandle<()>>,
}

impl NativeWebSocket {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for NativeWebSocket {
    fn open(&mut self, url: &str) -> SyncResult<()> {
        if self.cmd_tx.is_some() {
            return Err(SyncError::Transport("Already open".to_string()));
        }

        let parsed = Url::parse(url).map_err(|e| SyncError::InvalidUrl(format!("{url}: {e}")))?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(SyncError::InvalidUrl(format!(
                "unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<TransportEvent>();
        let url = url.to_string();

        let handle = thread::Builder::new()
            .name("geosketch-ws".to_string())
            .spawn(move || run_socket(&url, &cmd_rx, &event_tx))
            .map_err(|e| SyncError::Transport(format!("Failed to spawn socket thread: {e}")))?;

        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);
        self._thread = Some(handle);
        Ok(())
    }

    fn send_text(&mut self, text: &str) -> SyncResult<()> {
        let tx = self.cmd_tx.as_ref().ok_or(SyncError::NotConnected)?;
        tx.send(WsCommand::Send(text.to_string()))
            .map_err(|_| SyncError::Transport("Socket thread has exited".to_string()))
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        match self.event_rx {
            Some(ref rx) => rx.try_iter().collect(),
            None => Vec::new(),
        }
    }

    fn close(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WsCommand::Close);
        }
        self.event_rx = None;
        self._thread = None;
    }
}

impl Drop for NativeWebSocket {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_socket(url: &str, cmd_rx: &Receiver<WsCommand>, event_tx: &Sender<TransportEvent>) {
    log::debug!("WebSocket thread: connecting to {url}");

    let (mut socket, response) = match connect(url) {
        Ok(pair) => pair,
        Err(e) => {
            let _ = event_tx.send(TransportEvent::Error(format!("Connection failed: {e}")));
            return;
        }
    };
    log::debug!("WebSocket connected, status: {}", response.status());
    let _ = event_tx.send(TransportEvent::Opened);

    // Short read timeout so the loop can service outgoing commands.
    match socket.get_mut() {
        tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        #[allow(unreachable_patterns)]
        _ => log::debug!("Non-plain stream, relying on default timeouts"),
    }

    let clean = loop {
        match cmd_rx.try_recv() {
            Ok(WsCommand::Send(text)) => {
                if let Err(e) = socket.send(Message::Text(text)) {
                    log::error!("WebSocket send error: {e}");
                    break false;
                }
            }
            Ok(WsCommand::Close) | Err(TryRecvError::Disconnected) => {
                let _ = socket.close(None);
                break true;
            }
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                let _ = event_tx.send(TransportEvent::Message(text));
            }
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => break true,
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                log::error!("WebSocket read error: {e}");
                break false;
            }
        }
    };

    log::debug!("WebSocket thread exiting");
    let _ = event_tx.send(TransportEvent::Closed { clean });
}
