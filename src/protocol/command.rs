//! Command classification
//!
//! Maps a client command string to the decoding strategy its response needs.

/// The interrupt command that cancels a pending `idle`
pub const NOIDLE: &str = "noidle";

/// Shape of the response the daemon will send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// The unsolicited greeting line sent on connect
    Welcome,

    /// Lines up to an `OK` / `ACK` status line
    Normal,

    /// Size line, length line, one binary segment, status line
    Binary,
}

/// Command categories the queue cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `password`: response is never forwarded to the client
    Password,

    /// `idle`: the only state in which `noidle` is allowed through
    Idle,

    /// `albumart` / `readpicture`
    Binary,

    /// Everything else
    Normal,
}

impl CommandKind {
    /// Classify a command by its leading word
    pub fn of(command: &str) -> Self {
        let name = command.split_whitespace().next().unwrap_or("");
        match name {
            "password" => CommandKind::Password,
            "idle" => CommandKind::Idle,
            "albumart" | "readpicture" => CommandKind::Binary,
            _ => CommandKind::Normal,
        }
    }

    /// The decoding strategy for this kind of command
    pub fn response_kind(self) -> ResponseKind {
        match self {
            CommandKind::Binary => ResponseKind::Binary,
            CommandKind::Password | CommandKind::Idle | CommandKind::Normal => {
                ResponseKind::Normal
            }
        }
    }
}

/// Classify a command straight to its response kind
pub fn classify(command: &str) -> ResponseKind {
    CommandKind::of(command).response_kind()
}

/// True for the interrupt command
pub fn is_noidle(command: &str) -> bool {
    command.trim() == NOIDLE
}
