//! Registry-backed discovery — per-request lookups against an HTTP registry
//!
//! ## Contract
//!
//! The registry answers `GET {registry_url}/services/{name}` with a JSON
//! list of live instances:
//!
//! ```json
//! [
//!   { "host": "10.0.0.5", "port": 9000 },
//!   { "host": "10.0.0.6", "port": 9000 }
//! ]
//! ```
//!
//! Every lookup hits the registry fresh; the gateway holds no instance
//! cache, so registration changes take effect on the next request.

use super::{Discovery, Endpoint};
use crate::config::DiscoveryConfig;
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Discovery against an external HTTP service registry
pub struct RegistryDiscovery {
    registry_url: String,
    client: reqwest::Client,
    rr_counter: AtomicUsize,
}

impl RegistryDiscovery {
    /// Create a new registry discovery client with the given config
    pub fn new(config: &DiscoveryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
            client,
            rr_counter: AtomicUsize::new(0),
        }
    }

    /// Fetch the live instance list for a service
    async fn instances(&self, service: &str) -> Result<Vec<Endpoint>> {
        let url = format!("{}/services/{}", self.registry_url, service);

        let resp = self.client.get(&url).send().await.map_err(|e| {
            GatewayError::Discovery(format!("Registry request to {} failed: {}", url, e))
        })?;

        if !resp.status().is_success() {
            return Err(GatewayError::Discovery(format!(
                "Registry returned status {} for '{}'",
                resp.status(),
                service
            )));
        }

        resp.json().await.map_err(|e| {
            GatewayError::Discovery(format!(
                "Failed to parse instance list for '{}': {}",
                service, e
            ))
        })
    }
}

#[async_trait]
impl Discovery for RegistryDiscovery {
    async fn select(&self, service: &str) -> Result<Endpoint> {
        let instances = self.instances(service).await?;

        if instances.is_empty() {
            return Err(GatewayError::Discovery(format!(
                "No instances registered for '{}'",
                service
            )));
        }

        let idx = self.rr_counter.fetch_add(1, Ordering::Relaxed) % instances.len();
        Ok(instances[idx].clone())
    }
}
