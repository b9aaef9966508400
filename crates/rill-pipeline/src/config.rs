//! # Endpoint Configuration
//!
//! TOML description of a sender's endpoint set. Each entry is a URI whose
//! scheme selects the protocol and whose authority is the destination
//! address:
//!
//! ```toml
//! version = 1
//!
//! [[endpoints]]
//! uri = "media+fec://192.0.2.10:5004"
//!
//! [[endpoints]]
//! uri = "control://192.0.2.10:5005"
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;
use thiserror::Error;

use crate::proto::Protocol;

pub const CONFIG_VERSION: u32 = 1;

/// Configuration rejection reasons.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config version {0}")]
    Version(u32),
    #[error("endpoint {index}: `{uri}` is not a scheme://ip:port uri")]
    MalformedUri { index: usize, uri: String },
    #[error("endpoint {index}: unknown scheme `{scheme}`")]
    UnknownScheme { index: usize, scheme: String },
    #[error("endpoint {index}: bad destination address `{addr}`: {source}")]
    BadAddress {
        index: usize,
        addr: String,
        source: std::net::AddrParseError,
    },
}

// ─── Raw Input ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointSetConfigInput {
    pub version: u32,
    pub endpoints: Vec<EndpointConfigInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointConfigInput {
    pub uri: String,
}

// ─── Resolved Configuration ─────────────────────────────────────────────────

/// Resolved description of one endpoint, ready to feed
/// [`SenderEndpoint::new`](crate::endpoint::SenderEndpoint::new).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    pub protocol: Protocol,
    pub dest: SocketAddr,
}

/// Resolved endpoint set for one sender.
#[derive(Debug, Clone)]
pub struct EndpointSetConfig {
    pub version: u32,
    pub endpoints: Vec<EndpointConfig>,
}

impl Default for EndpointSetConfig {
    fn default() -> Self {
        EndpointSetConfig {
            version: CONFIG_VERSION,
            endpoints: Vec::new(),
        }
    }
}

impl EndpointSetConfigInput {
    /// Validate and resolve the raw input. Blank entries are skipped,
    /// duplicates collapse to their first occurrence.
    pub fn resolve(self) -> Result<EndpointSetConfig, ConfigError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(ConfigError::Version(version));
        }

        let mut seen = HashSet::new();
        let mut endpoints = Vec::new();
        for (index, entry) in self.endpoints.into_iter().enumerate() {
            let uri = entry.uri.trim();
            if uri.is_empty() {
                continue;
            }
            let (scheme, authority) =
                uri.split_once("://").ok_or_else(|| ConfigError::MalformedUri {
                    index,
                    uri: uri.to_string(),
                })?;
            let protocol =
                Protocol::from_scheme(scheme).ok_or_else(|| ConfigError::UnknownScheme {
                    index,
                    scheme: scheme.to_string(),
                })?;
            let dest: SocketAddr = authority.parse().map_err(|source| ConfigError::BadAddress {
                index,
                addr: authority.to_string(),
                source,
            })?;
            if !seen.insert((protocol, dest)) {
                continue;
            }
            endpoints.push(EndpointConfig { protocol, dest });
        }

        Ok(EndpointSetConfig { version, endpoints })
    }
}

impl EndpointSetConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(EndpointSetConfig::default());
        }
        let parsed: EndpointSetConfigInput = toml::from_str(input)?;
        parsed.resolve()
    }
}
