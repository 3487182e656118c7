//! Command queue
//!
//! Serializes commands to the daemon so that exactly one response is being
//! decoded at a time.
//!
//! ## Exceptions to strict FIFO
//! - `noidle` skips the queue. It is written at once while an `idle` is in
//!   flight and dropped otherwise.
//! - The response to `password` is decoded like any other but never handed
//!   back to the caller.

use std::collections::VecDeque;
use std::io::Write;

use bytes::BytesMut;

use crate::error::{BridgeError, Result};
use super::codec::write_command;
use super::command::{is_noidle, CommandKind, ResponseKind};
use super::decoder::Decoder;
use super::response::Response;

/// The decoder currently waiting on the daemon, and who it answers
#[derive(Debug)]
struct InFlight {
    /// `None` for the greeting, which answers no command
    command: Option<CommandKind>,
    decoder: Decoder,
}

/// Per-connection command serializer
///
/// `W` is the daemon side of the link. Completed responses are returned
/// from [`CommandQueue::receive`] rather than pushed through a callback.
pub struct CommandQueue<W: Write> {
    /// Daemon writer
    writer: W,

    /// Commands waiting for the in-flight one to finish
    pending: VecDeque<String>,

    /// At most one active decoder
    active: Option<InFlight>,

    /// Bytes received but not yet consumed by the active decoder
    buffer: BytesMut,

    /// Write failure held back so the response finished alongside it
    /// still reaches the client; reported by the next call
    deferred: Option<BridgeError>,
}

impl<W: Write> CommandQueue<W> {
    /// Create a queue that first waits for the daemon greeting
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pending: VecDeque::new(),
            active: Some(InFlight {
                command: None,
                decoder: Decoder::new(ResponseKind::Welcome),
            }),
            buffer: BytesMut::new(),
            deferred: None,
        }
    }

    /// Queue a client command, or write `noidle` straight through
    pub fn submit(&mut self, command: impl Into<String>) -> Result<()> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }
        let command = command.into();

        if is_noidle(&command) {
            if self.active_command() == Some(CommandKind::Idle) {
                tracing::trace!("--> mpd {}", command);
                write_command(&mut self.writer, &command)?;
            } else {
                tracing::debug!("Dropping noidle with no idle in flight");
            }
            return Ok(());
        }

        self.pending.push_back(command);
        self.dispatch()
    }

    /// Feed bytes read from the daemon
    ///
    /// Returns the completed response, if this chunk finished one that is
    /// meant for the client.
    pub fn receive(&mut self, chunk: &[u8]) -> Result<Option<Response>> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }
        tracing::trace!("<-- mpd {} bytes", chunk.len());

        let Some(in_flight) = self.active.as_mut() else {
            tracing::warn!("Discarding {} bytes with no command in flight", chunk.len());
            return Ok(None);
        };

        self.buffer.extend_from_slice(chunk);

        let Some(response) = in_flight.decoder.decode(&mut self.buffer)? else {
            return Ok(None);
        };

        let command = in_flight.command;
        self.active = None;

        if !self.buffer.is_empty() {
            tracing::warn!(
                "Discarding {} bytes trailing a complete response",
                self.buffer.len()
            );
        }
        self.buffer = BytesMut::new();

        let dispatched = self.dispatch();

        if command == Some(CommandKind::Password) {
            tracing::debug!("Suppressing password response");
            dispatched?;
            return Ok(None);
        }

        if let Err(e) = dispatched {
            tracing::warn!("Write to mpd failed after a completed response: {}", e);
            self.deferred = Some(e);
        }

        Ok(Some(response))
    }

    /// Start the next command if nothing is in flight
    fn dispatch(&mut self) -> Result<()> {
        if self.active.is_some() {
            return Ok(());
        }
        let Some(command) = self.pending.pop_front() else {
            return Ok(());
        };

        let kind = CommandKind::of(&command);
        self.active = Some(InFlight {
            command: Some(kind),
            decoder: Decoder::new(kind.response_kind()),
        });

        tracing::trace!("--> mpd {}", command);
        write_command(&mut self.writer, &command)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Number of commands waiting behind the in-flight one
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// True while a response is being decoded
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Kind of the command whose response is being decoded
    ///
    /// `None` both when idle and while waiting for the greeting.
    pub fn active_command(&self) -> Option<CommandKind> {
        self.active.as_ref().and_then(|in_flight| in_flight.command)
    }

    /// Response kind of the active decoder
    pub fn active_response_kind(&self) -> Option<ResponseKind> {
        self.active.as_ref().map(|in_flight| in_flight.decoder.kind())
    }

    /// The daemon writer
    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }
}
