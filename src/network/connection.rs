//! Connection Handler
//!
//! Bridges one WebSocket client to one MPD daemon link.

use std::net::TcpStream;
use std::time::Duration;

use crossbeam::channel::TryRecvError;
use tungstenite::handshake::server::{ErrorResponse, Request, Response as HandshakeResponse};
use tungstenite::http::StatusCode;
use tungstenite::{Message, WebSocket};

use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::protocol::{CommandQueue, Response};
use super::daemon::{DaemonEvent, DaemonLink};
use super::endpoint::DaemonEndpoint;
use super::origin::OriginPolicy;

/// Handles a single bridged client
pub struct Connection {
    /// Client side
    ws: WebSocket<TcpStream>,

    /// Daemon side
    daemon: DaemonLink,

    /// Serializes client commands onto the daemon link
    queue: CommandQueue<TcpStream>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Perform the WebSocket handshake and connect to the daemon
    ///
    /// The daemon is picked from the `server` query parameter of the
    /// upgrade request. Requests from a disallowed origin get a 403.
    pub fn accept(stream: TcpStream, config: &Config, origins: &OriginPolicy) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        let mut query = None;
        let callback = |request: &Request, response: HandshakeResponse| {
            let origin = request
                .headers()
                .get("Origin")
                .and_then(|value| value.to_str().ok());

            if !origins.allows(origin) {
                tracing::warn!("Rejecting connection from origin {:?}", origin);
                let mut rejection = ErrorResponse::new(Some("origin not allowed".to_string()));
                *rejection.status_mut() = StatusCode::FORBIDDEN;
                return Err(rejection);
            }

            tracing::debug!("WebSocket connection accepted from origin {:?}", origin);
            query = request.uri().query().map(str::to_string);
            Ok(response)
        };

        let mut ws = tungstenite::accept_hdr(stream, callback).map_err(|e| {
            BridgeError::Network(format!("WebSocket handshake with {} failed: {}", peer_addr, e))
        })?;

        let endpoint = DaemonEndpoint::from_query(query.as_deref(), config);
        let daemon = match DaemonLink::connect(&endpoint, config.read_buffer_size) {
            Ok(daemon) => daemon,
            Err(e) => {
                let _ = ws.close(None);
                let _ = ws.flush();
                return Err(e);
            }
        };

        ws.get_ref()
            .set_read_timeout(Some(Duration::from_millis(config.poll_interval_ms)))?;

        let queue = CommandQueue::new(daemon.writer()?);

        Ok(Self {
            ws,
            daemon,
            queue,
            peer_addr,
        })
    }

    /// Run the bridge until either side closes
    ///
    /// Both sides are torn down before this returns, whatever the outcome.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!(
            "Bridging {} to mpd at {}",
            self.peer_addr,
            self.daemon.endpoint()
        );

        let result = self.run();
        self.teardown();
        result
    }

    fn run(&mut self) -> Result<()> {
        loop {
            if !self.drain_daemon()? {
                tracing::debug!("mpd disconnected from {}", self.peer_addr);
                return Ok(());
            }

            match self.ws.read() {
                Ok(Message::Text(text)) => {
                    tracing::trace!("ws --> {}", text.as_str());
                    self.queue.submit(text.as_str())?;
                }
                Ok(Message::Binary(data)) => {
                    tracing::warn!(
                        "Ignoring {} byte binary message from {}",
                        data.len(),
                        self.peer_addr
                    );
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!("ws {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Feed every pending daemon event to the queue
    ///
    /// Returns `false` once the daemon has closed the link.
    fn drain_daemon(&mut self) -> Result<bool> {
        loop {
            match self.daemon.events().try_recv() {
                Ok(DaemonEvent::Data(chunk)) => {
                    if let Some(response) = self.queue.receive(&chunk)? {
                        self.send_response(&response)?;
                    }
                }
                Ok(DaemonEvent::Closed) | Err(TryRecvError::Disconnected) => return Ok(false),
                Ok(DaemonEvent::Failed(e)) => {
                    return Err(BridgeError::Network(format!("mpd link failed: {}", e)));
                }
                Err(TryRecvError::Empty) => return Ok(true),
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: &Response) -> Result<()> {
        let json = response.to_json()?;
        tracing::trace!("ws <-- {}", json);
        self.ws.send(Message::text(json))?;
        Ok(())
    }

    fn teardown(&mut self) {
        self.daemon.shutdown();
        if let Err(e) = self.ws.close(None) {
            tracing::trace!("ws close for {}: {}", self.peer_addr, e);
        }
        let _ = self.ws.flush();
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// The daemon this client is bridged to
    pub fn endpoint(&self) -> &DaemonEndpoint {
        self.daemon.endpoint()
    }
}
