//! Configuration for ws2mpd
//!
//! Centralized configuration with sensible defaults.

use crate::error::{BridgeError, Result};

/// Main configuration for a ws2mpd bridge instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Listener Configuration
    // -------------------------------------------------------------------------
    /// WebSocket listen address (host:port)
    pub listen_addr: String,

    /// Max concurrent bridged connections
    pub max_connections: usize,

    /// Regular expression the `Origin` header must match.
    /// `None` accepts every origin.
    pub origin_pattern: Option<String>,

    // -------------------------------------------------------------------------
    // Daemon Configuration
    // -------------------------------------------------------------------------
    /// MPD host used when the client does not name one
    pub daemon_host: String,

    /// MPD port used when the client does not name one
    pub daemon_port: u16,

    // -------------------------------------------------------------------------
    // Connection Loop Configuration
    // -------------------------------------------------------------------------
    /// How long a WebSocket read may block before daemon events are drained
    /// (milliseconds)
    pub poll_interval_ms: u64,

    /// Size of each read from the daemon socket (bytes)
    pub read_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            max_connections: 1024,
            origin_pattern: None,
            daemon_host: "127.0.0.1".to_string(),
            daemon_port: 6600,
            poll_interval_ms: 10,
            read_buffer_size: 8192,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the settings that cannot be expressed in the types alone
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(BridgeError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.read_buffer_size == 0 {
            return Err(BridgeError::Config(
                "read buffer size must be greater than zero".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(BridgeError::Config(
                "max connections must be greater than zero".to_string(),
            ));
        }
        if let Some(pattern) = &self.origin_pattern {
            regex::Regex::new(pattern).map_err(|e| {
                BridgeError::Config(format!("invalid origin pattern {:?}: {}", pattern, e))
            })?;
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the WebSocket listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Only accept upgrade requests whose origin matches `pattern`
    pub fn origin_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.origin_pattern = Some(pattern.into());
        self
    }

    /// Set the fallback MPD host
    pub fn daemon_host(mut self, host: impl Into<String>) -> Self {
        self.config.daemon_host = host.into();
        self
    }

    /// Set the fallback MPD port
    pub fn daemon_port(mut self, port: u16) -> Self {
        self.config.daemon_port = port;
        self
    }

    /// Set the WebSocket poll interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the daemon read buffer size (in bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
