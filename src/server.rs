//! HTTP server — accept loop, request dispatch, and error responses
//!
//! One spawned task per connection, one logical task per request. Each
//! request runs the same pipeline: upgrade detection on the original
//! headers, path resolution, then the matching forwarder. Every failure
//! is scoped to its request; nothing here is fatal to the process.

use crate::error::{GatewayError, Result};
use crate::proxy::{self, HttpProxy};
use crate::resolve::{PathResolver, Resolution};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state for request handling
pub struct GatewayState {
    /// Shared resolution logic for both forwarding modes
    pub resolver: PathResolver,
    /// Buffered forwarder
    pub http_proxy: HttpProxy,
}

/// Bind the gateway listener and start serving in a background task.
///
/// The listener is bound before this returns, so callers may connect to
/// the returned address as soon as they hold the handle.
pub async fn start(
    addr: SocketAddr,
    state: Arc<GatewayState>,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::Other(format!("Failed to bind {}: {}", addr, e)))?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Gateway listening");

    let handle = tokio::spawn(async move {
        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                    continue;
                }
            };

            let state = state.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let _ = http1::Builder::new()
                    .serve_connection(
                        io,
                        service_fn(|req| handle_request(req, remote_addr, state.clone())),
                    )
                    .with_upgrades()
                    .await;
            });
        }
    });

    Ok((local_addr, handle))
}

/// Handle an individual HTTP request
async fn handle_request(
    req: Request<Incoming>,
    remote_addr: SocketAddr,
    state: Arc<GatewayState>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();

    // The bare root never names a service
    if path == "/" {
        return Ok(index_response());
    }

    // Upgrade detection runs on the original, unmutated headers
    if proxy::is_upgrade_request(req.headers()) {
        Ok(handle_tunnel(req, &path, remote_addr, state).await)
    } else {
        Ok(handle_buffered(req, &path, remote_addr, state).await)
    }
}

/// Tunnel path: resolve, then hand the request to the tunnel forwarder
async fn handle_tunnel(
    req: Request<Incoming>,
    path: &str,
    remote_addr: SocketAddr,
    state: Arc<GatewayState>,
) -> Response<Full<Bytes>> {
    let directive = match state.resolver.resolve(path).await {
        Resolution::Routed(directive) => directive,
        Resolution::Unroutable(reason) => {
            tracing::debug!(path, reason = ?reason, remote = %remote_addr, "Unroutable upgrade request");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "invalid host");
        }
    };

    match proxy::tunnel(req, &directive).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                error = %e,
                authority = directive.authority,
                remote = %remote_addr,
                "Tunnel setup failed"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Buffered path: collect the body, resolve, rewrite, forward
async fn handle_buffered(
    req: Request<Incoming>,
    path: &str,
    remote_addr: SocketAddr,
    state: Arc<GatewayState>,
) -> Response<Full<Bytes>> {
    let (mut parts, body) = req.into_parts();

    let body_bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };

    let directive = match state.resolver.resolve(path).await {
        Resolution::Routed(directive) => directive,
        Resolution::Unroutable(reason) => {
            tracing::debug!(path, reason = ?reason, remote = %remote_addr, "Unroutable request");
            return error_response(StatusCode::BAD_GATEWAY, "no route to service");
        }
    };

    if let Err(e) = directive.apply(&mut parts) {
        tracing::error!(error = %e, authority = directive.authority, "Failed to rewrite request");
        return error_response(StatusCode::BAD_GATEWAY, "no route to service");
    }

    match state
        .http_proxy
        .forward(&parts.method, &parts.uri, &parts.headers, body_bytes)
        .await
    {
        Ok(proxy_resp) => {
            let mut builder = Response::builder().status(proxy_resp.status);
            for (key, value) in proxy_resp.headers.iter() {
                builder = builder.header(key, value);
            }
            builder
                .body(Full::new(proxy_resp.body))
                .unwrap_or_else(|_| {
                    error_response(StatusCode::BAD_GATEWAY, "invalid backend response")
                })
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                authority = directive.authority,
                remote = %remote_addr,
                "Buffered forward failed"
            );
            error_response(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

/// Short plain-text error response
fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(message.to_string())))
        .unwrap()
}

/// Gateway identity response for the bare root path
fn index_response() -> Response<Full<Bytes>> {
    let body = format!(
        r#"{{"name":"webgate","version":"{}"}}"#,
        env!("CARGO_PKG_VERSION")
    );
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
