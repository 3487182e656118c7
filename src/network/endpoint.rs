//! Daemon endpoint selection
//!
//! A client picks its daemon with `?server=host:port` on the upgrade URL.
//! Missing parts fall back to the configured defaults.

use std::fmt;

use crate::config::Config;

/// Query parameter naming the daemon
pub const SERVER_PARAM: &str = "server";

/// Address of an MPD daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonEndpoint {
    pub host: String,
    pub port: u16,
}

impl DaemonEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Pick the endpoint from an upgrade request query string
    pub fn from_query(query: Option<&str>, config: &Config) -> Self {
        let server = query
            .and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(key, _)| key == SERVER_PARAM)
                    .map(|(_, value)| value.into_owned())
            })
            .unwrap_or_default();

        Self::parse(&server, config)
    }

    /// Parse `host:port`, `host`, `:port`, `[v6]:port`, a bare IPv6
    /// literal or an empty string
    pub fn parse(server: &str, config: &Config) -> Self {
        let (host, port) = split_host_port(server);

        let host = if host.is_empty() {
            config.daemon_host.clone()
        } else {
            host.to_string()
        };

        let port = match port.parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => config.daemon_port,
        };

        Self { host, port }
    }
}

/// Split off a port only where the colon cannot belong to an IPv6 address
fn split_host_port(server: &str) -> (&str, &str) {
    if let Some(rest) = server.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((host, tail)) => (host, tail.strip_prefix(':').unwrap_or("")),
            None => (rest, ""),
        };
    }

    match server.rsplit_once(':') {
        Some((host, _)) if host.contains(':') => (server, ""),
        Some((host, port)) => (host, port),
        None => (server, ""),
    }
}

impl fmt::Display for DaemonEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
