//! Service discovery — maps logical service names to live endpoints
//!
//! The gateway core treats discovery as an opaque collaborator: it hands
//! over a namespaced service name and gets back one endpoint, selected by
//! whatever policy the implementation carries. Nothing is cached across
//! requests by the callers.

mod registry;
mod static_table;

pub use registry::RegistryDiscovery;
pub use static_table::StaticDiscovery;

use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete backend instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Render the endpoint as a `host:port` authority
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse a `host:port` string into an endpoint
    pub fn parse(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| GatewayError::Config(format!("Expected host:port, got '{}'", s)))?;
        if host.is_empty() {
            return Err(GatewayError::Config(format!(
                "Empty host in endpoint '{}'",
                s
            )));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| GatewayError::Config(format!("Invalid port in endpoint '{}': {}", s, e)))?;
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Discovery client — resolves a namespaced service name to one endpoint
///
/// Implementations own the selection policy (round-robin, weighted, ...);
/// callers see a single endpoint or an error when none is available.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Select one healthy endpoint for the given namespaced service name
    async fn select(&self, service: &str) -> Result<Endpoint>;
}
