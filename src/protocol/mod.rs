//! Protocol Module
//!
//! The MPD side of the bridge: command classification, response decoding
//! and command serialization.
//!
//! ## Flow
//! ```text
//!  client command ──> CommandQueue ──> "cmd\n" ──> daemon
//!                          │
//!                          ▼
//!                       Decoder <── byte chunks <── daemon
//!                          │
//!                          ▼
//!                       Response ──> client (JSON array)
//! ```
//!
//! ### Response Kinds
//! - Welcome: the single greeting line, `OK MPD <version>`
//! - Normal:  lines up to `OK` or `ACK ...`
//! - Binary:  `size: N`, `binary: L`, L raw bytes, `OK`

mod codec;
mod command;
mod decoder;
mod queue;
mod response;

pub use codec::{
    parse_trailing_number, take_line, take_segment, write_command, LINE_FEED, MAX_SEGMENT_SIZE,
};
pub use command::{classify, is_noidle, CommandKind, ResponseKind, NOIDLE};
pub use decoder::Decoder;
pub use queue::CommandQueue;
pub use response::{is_status_line, Line, Response, ACK_PREFIX, OK_PREFIX};
