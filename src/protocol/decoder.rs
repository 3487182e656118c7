//! Response decoder
//!
//! A per-response state machine fed from the daemon byte stream. Bytes are
//! appended to a buffer owned by the caller; each call to [`Decoder::decode`]
//! consumes as much of the buffer as the current phase allows and returns
//! the response once its status line has arrived.
//!
//! ## Binary responses
//! ```text
//! Size ──> Length ──> Segment ──> Terminal ──> done
//!   │       ↺ headers
//!   └── OK / ACK ──> done
//! ```
//! A phase that lacks bytes leaves the buffer untouched and is resumed on the
//! next call. Finished phases are never re-entered.

use bytes::BytesMut;

use crate::error::{BridgeError, Result};
use super::codec::{parse_trailing_number, take_line, take_segment, MAX_SEGMENT_SIZE};
use super::command::ResponseKind;
use super::response::{is_status_line, Line, Response};

/// Key of the line announcing the segment length
const BINARY_FIELD: &str = "binary:";

/// Where a binary response currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryPhase {
    Size,
    Length { size: usize },
    Segment { size: usize, length: usize },
    Terminal { size: usize },
}

/// Per-kind decoding state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Welcome,
    Normal,
    Binary(BinaryPhase),
}

/// Decodes exactly one daemon response
#[derive(Debug)]
pub struct Decoder {
    kind: ResponseKind,
    state: State,
    lines: Vec<Line>,
}

impl Decoder {
    pub fn new(kind: ResponseKind) -> Self {
        let state = match kind {
            ResponseKind::Welcome => State::Welcome,
            ResponseKind::Normal => State::Normal,
            ResponseKind::Binary => State::Binary(BinaryPhase::Size),
        };

        Self {
            kind,
            state,
            lines: Vec::new(),
        }
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    /// Lines assembled so far
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Total artifact size announced by a binary response, once known
    pub fn declared_size(&self) -> Option<usize> {
        match self.state {
            State::Binary(BinaryPhase::Length { size })
            | State::Binary(BinaryPhase::Segment { size, .. })
            | State::Binary(BinaryPhase::Terminal { size }) => Some(size),
            _ => None,
        }
    }

    /// Consume buffered bytes
    ///
    /// Returns `Ok(Some(response))` once the response is complete. After
    /// that the decoder is spent and must be dropped.
    pub fn decode(&mut self, buffer: &mut BytesMut) -> Result<Option<Response>> {
        match self.state {
            State::Welcome => Ok(self.decode_welcome(buffer)),
            State::Normal => Ok(self.decode_normal(buffer)),
            State::Binary(_) => self.decode_binary(buffer),
        }
    }

    fn decode_welcome(&mut self, buffer: &mut BytesMut) -> Option<Response> {
        let line = take_line(buffer)?;
        self.lines.push(Line::Text(line));
        Some(self.finish())
    }

    fn decode_normal(&mut self, buffer: &mut BytesMut) -> Option<Response> {
        while let Some(line) = take_line(buffer) {
            let done = is_status_line(&line);
            self.lines.push(Line::Text(line));
            if done {
                return Some(self.finish());
            }
        }
        None
    }

    fn decode_binary(&mut self, buffer: &mut BytesMut) -> Result<Option<Response>> {
        loop {
            let State::Binary(phase) = self.state else {
                return Ok(None);
            };

            let next = match phase {
                BinaryPhase::Size => {
                    let Some(line) = take_line(buffer) else {
                        return Ok(None);
                    };
                    // ACK, or a bare OK from readpicture: no picture
                    if is_status_line(&line) {
                        self.lines.push(Line::Text(line));
                        return Ok(Some(self.finish()));
                    }
                    let size = parse_trailing_number(&line)?;
                    tracing::trace!(size, "binary response size");
                    self.lines.push(Line::Text(line));
                    BinaryPhase::Length { size }
                }
                BinaryPhase::Length { size } => {
                    let Some(line) = take_line(buffer) else {
                        return Ok(None);
                    };
                    if is_status_line(&line) {
                        self.lines.push(Line::Text(line));
                        return Ok(Some(self.finish()));
                    }
                    // headers such as `type: image/jpeg` precede the length
                    if !line.starts_with(BINARY_FIELD) {
                        self.lines.push(Line::Text(line));
                        BinaryPhase::Length { size }
                    } else {
                        let length = parse_trailing_number(&line)?;
                        if length > MAX_SEGMENT_SIZE {
                            return Err(BridgeError::Protocol(format!(
                                "binary segment too large: {} bytes (max {})",
                                length, MAX_SEGMENT_SIZE
                            )));
                        }
                        tracing::trace!(length, "binary segment length");
                        self.lines.push(Line::Text(line));
                        BinaryPhase::Segment { size, length }
                    }
                }
                BinaryPhase::Segment { size, length } => {
                    let Some(segment) = take_segment(buffer, length) else {
                        return Ok(None);
                    };
                    tracing::trace!(received = segment.len(), "binary segment");
                    self.lines.push(Line::Binary(segment));
                    BinaryPhase::Terminal { size }
                }
                BinaryPhase::Terminal { .. } => {
                    let Some(line) = take_line(buffer) else {
                        return Ok(None);
                    };
                    self.lines.push(Line::Text(line));
                    return Ok(Some(self.finish()));
                }
            };

            self.state = State::Binary(next);
        }
    }

    fn finish(&mut self) -> Response {
        Response::new(std::mem::take(&mut self.lines))
    }
}
