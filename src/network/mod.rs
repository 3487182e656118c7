//! Network Module
//!
//! WebSocket server and daemon link handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One thread per bridged client, owning the WebSocket and the queue
//! - One reader thread per daemon link, feeding bytes over a channel

mod connection;
mod daemon;
mod endpoint;
mod origin;
mod server;

pub use connection::Connection;
pub use daemon::{DaemonEvent, DaemonLink};
pub use endpoint::{DaemonEndpoint, SERVER_PARAM};
pub use origin::OriginPolicy;
pub use server::Server;
