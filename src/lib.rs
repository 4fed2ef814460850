//! # webgate
//!
//! A path-routed reverse-proxy gateway for micro web services. The first
//! path segment of every request names a logical service; discovery
//! resolves that name to a live backend endpoint, the request is rewritten
//! to target it, and one of two forwarders carries it:
//!
//! ```text
//! Request → Dispatcher ─┬─ buffered ──→ Path Resolver → HTTP proxy ──→ Backend
//!                       └─ upgrade  ──→ Path Resolver → raw tunnel ──→ Backend
//! ```
//!
//! ## Core Features
//!
//! - **Path-convention routing**: `/{service}/{rest...}` with strict
//!   `[A-Za-z0-9]+` service tokens
//! - **Pluggable discovery**: static endpoint tables or an HTTP registry,
//!   each owning its own selection policy
//! - **Dual-mode forwarding**: buffered reverse proxy for ordinary
//!   traffic, raw full-duplex TCP tunneling for WebSocket upgrades
//! - **Fail-closed resolution**: unroutable requests are rejected
//!   explicitly, never proxied to a default
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use webgate::config::GatewayConfig;
//! use webgate::discovery::StaticDiscovery;
//! use webgate::proxy::HttpProxy;
//! use webgate::resolve::PathResolver;
//! use webgate::server::{self, GatewayState};
//!
//! #[tokio::main]
//! async fn main() -> webgate::Result<()> {
//!     let config = GatewayConfig::from_file("gateway.hcl").await?;
//!     config.validate()?;
//!
//!     let discovery = StaticDiscovery::from_config(&config.services, &config.namespace)?;
//!     let state = Arc::new(GatewayState {
//!         resolver: PathResolver::new(Arc::new(discovery), config.namespace.clone()),
//!         http_proxy: HttpProxy::new(),
//!     });
//!
//!     let (_addr, handle) = server::start(config.listen.parse().unwrap(), state).await?;
//!     let _ = handle.await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod proxy;
pub mod resolve;
pub mod server;

// Re-export main types
pub use discovery::{Discovery, Endpoint, RegistryDiscovery, StaticDiscovery};
pub use error::{GatewayError, Result};
pub use resolve::{PathResolver, Resolution, RouteDirective, UnroutableReason, BASE_PATH_HEADER};
