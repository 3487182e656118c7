//! Daemon Link
//!
//! TCP connection to MPD. A reader thread turns the socket into a stream of
//! [`DaemonEvent`]s so the connection loop can consume them alongside
//! client messages from a single thread.

use std::io::Read;
use std::net::{Shutdown, TcpStream};
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender};

use crate::error::{BridgeError, Result};
use super::endpoint::DaemonEndpoint;

/// Something that happened on the daemon socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// Bytes in arrival order, arbitrary boundaries
    Data(Bytes),

    /// The daemon closed the connection
    Closed,

    /// The socket failed
    Failed(String),
}

/// An open connection to MPD
pub struct DaemonLink {
    /// Kept for shutdown; writes go through a cloned handle
    stream: TcpStream,

    events: Receiver<DaemonEvent>,

    reader_handle: Option<JoinHandle<()>>,

    endpoint: DaemonEndpoint,
}

impl DaemonLink {
    /// Connect and start the reader thread
    pub fn connect(endpoint: &DaemonEndpoint, read_buffer_size: usize) -> Result<Self> {
        tracing::debug!("Connecting to mpd at {}", endpoint);

        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).map_err(|e| {
            BridgeError::Network(format!("failed to connect to mpd at {}: {}", endpoint, e))
        })?;
        stream.set_nodelay(true)?;

        Self::from_stream(stream, endpoint.clone(), read_buffer_size)
    }

    /// Wrap an already connected stream
    pub fn from_stream(
        stream: TcpStream,
        endpoint: DaemonEndpoint,
        read_buffer_size: usize,
    ) -> Result<Self> {
        let read_stream = stream.try_clone()?;
        let (tx, events) = channel::unbounded();

        let reader_handle = thread::Builder::new()
            .name(format!("mpd-reader-{}", endpoint))
            .spawn(move || reader_loop(read_stream, tx, read_buffer_size))?;

        Ok(Self {
            stream,
            events,
            reader_handle: Some(reader_handle),
            endpoint,
        })
    }

    /// A handle to write commands on
    pub fn writer(&self) -> Result<TcpStream> {
        Ok(self.stream.try_clone()?)
    }

    pub fn events(&self) -> &Receiver<DaemonEvent> {
        &self.events
    }

    pub fn endpoint(&self) -> &DaemonEndpoint {
        &self.endpoint
    }

    /// Close both directions; the reader thread then reports `Closed`
    pub fn shutdown(&self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            tracing::trace!("mpd shutdown: {}", e);
        }
    }
}

impl Drop for DaemonLink {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.join();
        }
    }
}

fn reader_loop(mut stream: TcpStream, tx: Sender<DaemonEvent>, read_buffer_size: usize) {
    let mut buf = vec![0u8; read_buffer_size];

    loop {
        let event = match stream.read(&mut buf) {
            Ok(0) => DaemonEvent::Closed,
            Ok(n) => DaemonEvent::Data(Bytes::copy_from_slice(&buf[..n])),
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => DaemonEvent::Failed(e.to_string()),
        };

        let last = !matches!(event, DaemonEvent::Data(_));
        // Receiver gone: the connection is already tearing down
        if tx.send(event).is_err() || last {
            break;
        }
    }
}
