//! Configuration types for webgate
//!
//! Uses HCL (HashiCorp Configuration Language) as the configuration format.
//! The model is deliberately small: a listen address, the discovery
//! namespace, a static service table, and an optional registry endpoint.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use crate::discovery::Endpoint;
use crate::error::{GatewayError, Result};
use crate::resolve::is_valid_service_name;

/// Top-level gateway configuration
///
/// # HCL Example
///
/// ```hcl
/// listen    = "0.0.0.0:8000"
/// namespace = "micro.web"
///
/// services "search" {
///   endpoints = ["10.0.0.5:9000", "10.0.0.6:9000"]
/// }
///
/// discovery {
///   registry_url = "http://127.0.0.1:8500"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address to bind the gateway listener to
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Namespace prefix joined to service names for discovery lookups
    /// (e.g. namespace "micro.web" + path segment "search" → "micro.web.search")
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Static service table: service name → fixed endpoint list
    #[serde(default)]
    pub services: HashMap<String, ServiceConfig>,

    /// Registry-backed discovery; takes precedence over the static table
    #[serde(default)]
    pub discovery: Option<DiscoveryConfig>,
}

/// A statically configured service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Backend endpoints as `host:port` strings
    pub endpoints: Vec<String>,
}

/// Registry-backed discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Base URL of the service registry
    pub registry_url: String,

    /// Registry request timeout in seconds (default: 5)
    #[serde(default = "default_discovery_timeout")]
    pub timeout_secs: u64,
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_namespace() -> String {
    "micro.web".to_string()
}

fn default_discovery_timeout() -> u64 {
    5
}

impl GatewayConfig {
    /// Load configuration from an HCL file.
    ///
    /// The file must contain valid HCL content regardless of extension.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            GatewayError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_hcl(&content)
    }

    /// Parse configuration from an HCL string
    pub fn from_hcl(content: &str) -> Result<Self> {
        hcl::from_str(content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse HCL config: {}", e)))
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<()> {
        self.listen.parse::<SocketAddr>().map_err(|e| {
            GatewayError::Config(format!("Invalid listen address '{}': {}", self.listen, e))
        })?;

        if self.namespace.is_empty() {
            return Err(GatewayError::Config(
                "Namespace must not be empty".to_string(),
            ));
        }

        for (name, svc) in &self.services {
            if !is_valid_service_name(name) {
                return Err(GatewayError::Config(format!(
                    "Service name '{}' must match [A-Za-z0-9]+",
                    name
                )));
            }
            if svc.endpoints.is_empty() {
                return Err(GatewayError::Config(format!(
                    "Service '{}' has no endpoints configured",
                    name
                )));
            }
            for ep in &svc.endpoints {
                Endpoint::parse(ep).map_err(|e| {
                    GatewayError::Config(format!(
                        "Service '{}' endpoint '{}': {}",
                        name, ep, e
                    ))
                })?;
            }
        }

        if self.services.is_empty() && self.discovery.is_none() {
            return Err(GatewayError::Config(
                "No discovery configured: define services blocks or a discovery block".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            namespace: default_namespace(),
            services: HashMap::new(),
            discovery: None,
        }
    }
}
