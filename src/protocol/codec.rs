//! Protocol codec
//!
//! Low-level primitives shared by the decoder and the queue.
//!
//! ## Wire Format
//!
//! ### Command (bridge -> daemon)
//! ```text
//! ┌─────────────────────────────┬────┐
//! │        command text         │ \n │
//! └─────────────────────────────┴────┘
//! ```
//!
//! ### Response (daemon -> bridge)
//! ```text
//! key: value\n            (zero or more)
//! binary: <len>\n         (binary responses only)
//! <len raw bytes>\n
//! OK\n | ACK [...] ...\n  (status line)
//! ```

use std::io::Write;

use bytes::{Buf, BytesMut};

use crate::error::{BridgeError, Result};

/// Line terminator on the wire
pub const LINE_FEED: u8 = b'\n';

/// Largest binary segment accepted from the daemon (16 MB)
pub const MAX_SEGMENT_SIZE: usize = 16 * 1024 * 1024;

/// Separator between a key and its value
const FIELD_SEPARATOR: &str = ": ";

// =============================================================================
// Extraction
// =============================================================================

/// Take one line off the front of `buffer`
///
/// Returns `None` and leaves the buffer untouched when no line feed has
/// arrived yet. The line feed is consumed but not returned.
pub fn take_line(buffer: &mut BytesMut) -> Option<String> {
    let index = buffer.iter().position(|&b| b == LINE_FEED)?;
    let line = buffer.split_to(index);
    buffer.advance(1);
    Some(String::from_utf8_lossy(&line).into_owned())
}

/// Take a `length` byte segment plus its trailing separator
///
/// Returns `None` until `length + 1` bytes are buffered.
pub fn take_segment(buffer: &mut BytesMut, length: usize) -> Option<Vec<u8>> {
    if buffer.len() < length + 1 {
        return None;
    }
    let segment = buffer.split_to(length);
    buffer.advance(1);
    Some(segment.to_vec())
}

/// Parse the number after the last `": "` of a line
///
/// A line without a separator is parsed whole.
pub fn parse_trailing_number(line: &str) -> Result<usize> {
    let field = line
        .rsplit_once(FIELD_SEPARATOR)
        .map(|(_, value)| value)
        .unwrap_or(line);

    field.trim().parse::<usize>().map_err(|_| {
        BridgeError::Protocol(format!("expected a numeric field, got {:?}", line))
    })
}

// =============================================================================
// Commands
// =============================================================================

/// Write one command to the daemon, newline terminated
pub fn write_command<W: Write>(writer: &mut W, command: &str) -> Result<()> {
    let mut bytes = Vec::with_capacity(command.len() + 1);
    bytes.extend_from_slice(command.as_bytes());
    bytes.push(LINE_FEED);

    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
