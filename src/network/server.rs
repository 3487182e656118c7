//! WebSocket Server
//!
//! Accepts connections and runs each bridge on its own thread.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use super::connection::Connection;
use super::origin::OriginPolicy;

/// How long the acceptor sleeps when no connection is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// WebSocket to MPD bridge server
pub struct Server {
    config: Arc<Config>,

    origins: Arc<OriginPolicy>,

    listener: Option<TcpListener>,

    /// Number of live bridged connections
    active: Arc<AtomicUsize>,

    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Create a new server with the given config
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let origins = OriginPolicy::from_config(&config)?;

        Ok(Self {
            config: Arc::new(config),
            origins: Arc::new(origins),
            listener: None,
            active: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Bind the listen address, returning the bound address
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.config.listen_addr)?;
        let addr = listener.local_addr()?;
        tracing::info!("ws2mpd listening on {}", addr);
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let Some(listener) = self.listener.as_ref() else {
            return Ok(());
        };
        listener.set_nonblocking(true)?;

        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, addr)) => self.spawn_connection(stream, addr),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        tracing::info!("ws2mpd acceptor stopped");
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    ///
    /// Stops accepting; bridges already running finish on their own.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// A flag that stops [`Server::run`] when set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Number of live bridged connections
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let Some(slot) = ConnectionSlot::acquire(&self.active, self.config.max_connections) else {
            tracing::warn!(
                "Rejecting {}: {} connections already open",
                addr,
                self.config.max_connections
            );
            return;
        };

        let config = Arc::clone(&self.config);
        let origins = Arc::clone(&self.origins);

        let spawned = thread::Builder::new()
            .name(format!("ws2mpd-{}", addr))
            .spawn(move || {
                let _slot = slot;
                serve(stream, addr, &config, &origins);
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn connection thread for {}: {}", addr, e);
        }
    }
}

/// Run one bridge to completion and log how it ended
fn serve(stream: TcpStream, addr: SocketAddr, config: &Config, origins: &OriginPolicy) {
    // Accepted sockets may inherit the listener's non-blocking mode
    if let Err(e) = stream.set_nonblocking(false) {
        tracing::warn!("Failed to configure socket for {}: {}", addr, e);
        return;
    }

    let mut connection = match Connection::accept(stream, config, origins) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Connection from {} not bridged: {}", addr, e);
            return;
        }
    };

    match connection.handle() {
        Ok(()) => tracing::debug!("Bridge for {} closed", addr),
        Err(e) if e.is_disconnect() => {
            tracing::debug!("Client {} went away: {}", addr, e)
        }
        Err(e) => tracing::warn!("Bridge for {} failed: {}", addr, e),
    }
}

/// Counts against `max_connections` for as long as it lives
struct ConnectionSlot {
    active: Arc<AtomicUsize>,
}

impl ConnectionSlot {
    fn acquire(active: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        let previous = active.fetch_add(1, Ordering::SeqCst);
        if previous >= max {
            active.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(Self {
            active: Arc::clone(active),
        })
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
