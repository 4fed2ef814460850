//! Path resolver — maps request paths to backend routing directives
//!
//! The first path segment names a logical service. The resolver validates
//! it, asks discovery for a live endpoint under the configured namespace,
//! and produces a `RouteDirective` describing how to rewrite the request.
//! Any failure yields an explicit `Unroutable` resolution; an unroutable
//! request can never reach a forwarder with a live target, so the
//! fail-closed behavior of the gateway does not depend on sentinel values.

use crate::discovery::Discovery;
use crate::error::{GatewayError, Result};
use http::header::{HeaderValue, HOST};
use std::sync::Arc;

/// Header carrying the externally visible prefix stripped from the path,
/// so backends can reconstruct absolute URLs
pub const BASE_PATH_HEADER: &str = "x-webgate-base-path";

/// Check a service-name token: non-empty, `[A-Za-z0-9]+` only
pub fn is_valid_service_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// The rewrite plan for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDirective {
    /// Bare service name from the path
    pub service: String,
    /// Target `host:port`
    pub authority: String,
    /// Path remainder after the service segment (always starts with `/`)
    pub path: String,
    /// Stripped prefix, `/` + service name
    pub base_path: String,
}

/// Why a request could not be routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnroutableReason {
    /// Fewer than two `/`-separated path segments
    PathTooShort,
    /// Service-name segment violates the token rule
    InvalidServiceName,
    /// Discovery returned no endpoint
    Discovery(String),
}

/// Outcome of resolving one request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The request can be forwarded according to the directive
    Routed(RouteDirective),
    /// The request has no routable target; the caller must reject it
    Unroutable(UnroutableReason),
}

impl RouteDirective {
    /// Apply the directive to a request head: rewrite the URI to the
    /// backend target (preserving the original query), point `Host` at the
    /// backend, and inject the base-path header.
    pub fn apply(&self, parts: &mut http::request::Parts) -> Result<()> {
        let path_and_query = match parts.uri.query() {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        };

        parts.uri = http::Uri::builder()
            .scheme("http")
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| {
                GatewayError::Other(format!(
                    "Failed to build upstream URI for {}: {}",
                    self.authority, e
                ))
            })?;

        let host = HeaderValue::from_str(&self.authority)
            .map_err(|e| GatewayError::Other(format!("Invalid Host value: {}", e)))?;
        parts.headers.insert(HOST, host);

        let base_path = HeaderValue::from_str(&self.base_path)
            .map_err(|e| GatewayError::Other(format!("Invalid base path value: {}", e)))?;
        parts.headers.insert(BASE_PATH_HEADER, base_path);

        Ok(())
    }
}

/// Path resolver — the shared resolution logic for both forwarding modes
pub struct PathResolver {
    discovery: Arc<dyn Discovery>,
    namespace: String,
}

impl PathResolver {
    /// Create a resolver over a discovery client and a namespace prefix
    pub fn new(discovery: Arc<dyn Discovery>, namespace: impl Into<String>) -> Self {
        Self {
            discovery,
            namespace: namespace.into(),
        }
    }

    /// Resolve a request path to a routing directive.
    ///
    /// Stateless: the same path with the same discovery answer always
    /// produces the same directive. No retries; a discovery failure is
    /// terminal for the request.
    pub async fn resolve(&self, path: &str) -> Resolution {
        let segments: Vec<&str> = path.split('/').collect();

        if segments.len() < 2 {
            tracing::debug!(path, "Path too short to route");
            return Resolution::Unroutable(UnroutableReason::PathTooShort);
        }

        let service = segments[1];
        if !is_valid_service_name(service) {
            tracing::debug!(path, "Invalid service name segment");
            return Resolution::Unroutable(UnroutableReason::InvalidServiceName);
        }

        let namespaced = format!("{}.{}", self.namespace, service);
        let endpoint = match self.discovery.select(&namespaced).await {
            Ok(ep) => ep,
            Err(e) => {
                tracing::debug!(service = namespaced, error = %e, "Discovery lookup failed");
                return Resolution::Unroutable(UnroutableReason::Discovery(e.to_string()));
            }
        };

        Resolution::Routed(RouteDirective {
            service: service.to_string(),
            authority: endpoint.authority(),
            path: format!("/{}", segments[2..].join("/")),
            base_path: format!("/{}", service),
        })
    }
}
