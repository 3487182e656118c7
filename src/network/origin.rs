//! Origin validation for WebSocket upgrades

use regex::Regex;

use crate::config::Config;
use crate::error::{BridgeError, Result};

/// Decides which `Origin` headers may open a bridge
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    pattern: Option<Regex>,
}

impl OriginPolicy {
    /// Accept every origin
    pub fn allow_all() -> Self {
        Self { pattern: None }
    }

    /// Accept origins matching `pattern`
    pub fn matching(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            BridgeError::Config(format!("invalid origin pattern {:?}: {}", pattern, e))
        })?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.origin_pattern {
            Some(pattern) => Self::matching(pattern),
            None => Ok(Self::allow_all()),
        }
    }

    /// With a pattern set, a request without an origin is refused
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match (&self.pattern, origin) {
            (None, _) => true,
            (Some(pattern), Some(origin)) => pattern.is_match(origin),
            (Some(_), None) => false,
        }
    }
}
