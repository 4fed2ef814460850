//! Static discovery — fixed endpoint table with round-robin rotation

use super::{Discovery, Endpoint};
use crate::config::ServiceConfig;
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One service's endpoints plus its rotation counter
struct ServiceEntry {
    endpoints: Vec<Endpoint>,
    rr_counter: AtomicUsize,
}

/// Discovery over a fixed, in-config endpoint table
///
/// Each lookup rotates round-robin through the service's endpoint list.
pub struct StaticDiscovery {
    services: HashMap<String, ServiceEntry>,
}

impl StaticDiscovery {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Add a service with its endpoints (builder style)
    pub fn with_service(mut self, name: impl Into<String>, endpoints: Vec<Endpoint>) -> Self {
        self.services.insert(
            name.into(),
            ServiceEntry {
                endpoints,
                rr_counter: AtomicUsize::new(0),
            },
        );
        self
    }

    /// Build the table from static config, namespacing each service name
    /// the same way the resolver namespaces its lookups
    pub fn from_config(
        services: &HashMap<String, ServiceConfig>,
        namespace: &str,
    ) -> Result<Self> {
        let mut table = Self::new();
        for (name, svc) in services {
            let endpoints = svc
                .endpoints
                .iter()
                .map(|ep| Endpoint::parse(ep))
                .collect::<Result<Vec<_>>>()?;
            table = table.with_service(format!("{}.{}", namespace, name), endpoints);
        }
        Ok(table)
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for StaticDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn select(&self, service: &str) -> Result<Endpoint> {
        let entry = self.services.get(service).ok_or_else(|| {
            GatewayError::Discovery(format!("Service '{}' not found", service))
        })?;

        if entry.endpoints.is_empty() {
            return Err(GatewayError::Discovery(format!(
                "Service '{}' has no endpoints",
                service
            )));
        }

        let idx = entry.rr_counter.fetch_add(1, Ordering::Relaxed) % entry.endpoints.len();
        Ok(entry.endpoints[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_select_unknown_service() {
        let discovery = StaticDiscovery::new();
        let err = discovery.select("micro.web.search").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_select_single_endpoint() {
        let discovery = StaticDiscovery::new()
            .with_service("micro.web.search", vec![Endpoint::new("10.0.0.5", 9000)]);
        let ep = discovery.select("micro.web.search").await.unwrap();
        assert_eq!(ep.authority(), "10.0.0.5:9000");
    }

    #[tokio::test]
    async fn test_select_round_robin() {
        let discovery = StaticDiscovery::new().with_service(
            "micro.web.api",
            vec![
                Endpoint::new("10.0.0.1", 9000),
                Endpoint::new("10.0.0.2", 9000),
                Endpoint::new("10.0.0.3", 9000),
            ],
        );

        let mut hosts = Vec::new();
        for _ in 0..6 {
            hosts.push(discovery.select("micro.web.api").await.unwrap().host);
        }
        assert_eq!(
            hosts,
            vec![
                "10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.1", "10.0.0.2", "10.0.0.3"
            ]
        );
    }

    #[tokio::test]
    async fn test_select_no_endpoints() {
        let discovery = StaticDiscovery::new().with_service("micro.web.empty", vec![]);
        let err = discovery.select("micro.web.empty").await.unwrap_err();
        assert!(err.to_string().contains("no endpoints"));
    }

    #[tokio::test]
    async fn test_from_config_namespaces_names() {
        let mut services = HashMap::new();
        services.insert(
            "search".to_string(),
            ServiceConfig {
                endpoints: vec!["10.0.0.5:9000".to_string()],
            },
        );
        let discovery = StaticDiscovery::from_config(&services, "micro.web").unwrap();
        assert_eq!(discovery.len(), 1);

        // Lookups go through the namespaced name, not the bare one
        assert!(discovery.select("search").await.is_err());
        let ep = discovery.select("micro.web.search").await.unwrap();
        assert_eq!(ep.authority(), "10.0.0.5:9000");
    }

    #[test]
    fn test_from_config_bad_endpoint() {
        let mut services = HashMap::new();
        services.insert(
            "search".to_string(),
            ServiceConfig {
                endpoints: vec!["nonsense".to_string()],
            },
        );
        assert!(StaticDiscovery::from_config(&services, "micro.web").is_err());
    }
}
