//! Response definitions
//!
//! A decoded daemon response, ready to be forwarded to a client.

use serde::Serialize;

/// Prefix of the success status line
pub const OK_PREFIX: &str = "OK";

/// Prefix of the error status line
pub const ACK_PREFIX: &str = "ACK";

/// One element of a response
///
/// Serializes untagged: text lines become JSON strings and the binary
/// segment becomes an array of byte values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Line {
    Text(String),
    Binary(Vec<u8>),
}

impl Line {
    /// The text of this line, if it is not the binary segment
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Line::Text(text) => Some(text),
            Line::Binary(_) => None,
        }
    }

    /// True for a line that terminates a response
    pub fn is_status(&self) -> bool {
        self.as_text().is_some_and(is_status_line)
    }
}

impl From<&str> for Line {
    fn from(text: &str) -> Self {
        Line::Text(text.to_string())
    }
}

impl From<String> for Line {
    fn from(text: String) -> Self {
        Line::Text(text)
    }
}

impl From<Vec<u8>> for Line {
    fn from(data: Vec<u8>) -> Self {
        Line::Binary(data)
    }
}

/// A complete response, in the order its lines arrived
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Response {
    pub lines: Vec<Line>,
}

impl Response {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The terminating status line, if the response has one
    pub fn status(&self) -> Option<&str> {
        self.lines.last().and_then(Line::as_text).filter(|l| is_status_line(l))
    }

    /// True when the daemon reported an error
    pub fn is_ack(&self) -> bool {
        self.status().is_some_and(|l| l.starts_with(ACK_PREFIX))
    }

    /// JSON text sent to the client
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// True for a line starting with `OK` or `ACK`
pub fn is_status_line(line: &str) -> bool {
    line.starts_with(OK_PREFIX) || line.starts_with(ACK_PREFIX)
}
