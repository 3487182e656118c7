//! # ws2mpd
//!
//! A bridge between WebSocket clients and the Music Player Daemon:
//! - One daemon connection per WebSocket client
//! - Exactly one MPD command in flight at a time
//! - Streaming response decoding, including binary album art
//! - Responses delivered to clients as JSON arrays
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    WebSocket Server                          │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ text message = one command
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Command Queue                              │
//! │        (FIFO, noidle bypass, password suppression)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  "cmd\n"    │          │   Decoder   │
//!   │  (write)    │          │ (per reply) │
//!   └──────┬──────┘          └──────▲──────┘
//!          │                        │ byte chunks
//!          ▼                        │
//!   ┌───────────────────────────────┴─────┐
//!   │              MPD (TCP)              │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BridgeError, Result};
pub use config::Config;
pub use network::Server;
pub use protocol::{CommandQueue, Response};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ws2mpd
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
