//! Centralized error types for webgate

use thiserror::Error;

/// Gateway error types
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration is invalid or could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service discovery failed (no instances, transport error)
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Upstream backend is unreachable or refused the request
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Upstream did not respond within the deadline
    #[error("Upstream timeout after {0}ms")]
    UpstreamTimeout(u64),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, GatewayError>;
