//! Tunnel proxy — raw bidirectional relay for protocol-upgrade requests
//!
//! A buffered proxy cannot carry the byte stream that follows a WebSocket
//! handshake. For upgrade requests the gateway instead dials the backend
//! directly, replays the rewritten request head verbatim, hands the
//! backend's `101` head back to the caller, takes ownership of the client
//! connection once the HTTP layer releases it, and relays raw bytes in
//! both directions until either side closes.

use crate::error::{GatewayError, Result};
use crate::resolve::RouteDirective;
use bytes::{Bytes, BytesMut};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::upgrade::OnUpgrade;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Upper bound on the backend's response head during the handshake
const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Forward an upgrade request through a raw TCP tunnel.
///
/// Returns the response to hand back to the caller. On `101 Switching
/// Protocols` the relay continues in a background task as soon as the
/// HTTP layer releases the client connection; any other backend status is
/// relayed as a normal response and the session ends there. Errors before
/// the handshake completes are returned to the caller; once the tunnel is
/// piping, I/O failures only close the session.
pub async fn tunnel(
    req: Request<Incoming>,
    directive: &RouteDirective,
) -> Result<Response<Full<Bytes>>> {
    if directive.authority.is_empty() {
        return Err(GatewayError::Other("invalid host".to_string()));
    }

    let (mut parts, _body) = req.into_parts();

    // Claim on the raw client connection; resolves only after the 101
    // response below has been written out by the HTTP layer.
    let on_upgrade = parts.extensions.remove::<OnUpgrade>().ok_or_else(|| {
        GatewayError::Other("failed to connect: transport does not support upgrades".to_string())
    })?;

    directive.apply(&mut parts)?;

    let mut backend = TcpStream::connect(directive.authority.as_str())
        .await
        .map_err(|e| {
            GatewayError::ServiceUnavailable(format!(
                "Tunnel connection to {} failed: {}",
                directive.authority, e
            ))
        })?;

    // Replay the rewritten request head verbatim onto the raw connection
    backend.write_all(&serialize_request_head(&parts)).await?;

    let (response, leftover) = read_response_head(&mut backend).await?;

    if response.status() != StatusCode::SWITCHING_PROTOCOLS {
        tracing::debug!(
            status = %response.status(),
            authority = directive.authority,
            "Backend declined upgrade"
        );
        return Ok(response);
    }

    let authority = directive.authority.clone();
    tokio::spawn(async move {
        match on_upgrade.await {
            Ok(upgraded) => {
                let client = TokioIo::new(upgraded);
                match relay(client, backend, leftover).await {
                    Ok((sent, received)) => {
                        tracing::debug!(
                            authority,
                            bytes_sent = sent,
                            bytes_received = received,
                            "Tunnel closed"
                        );
                    }
                    Err(e) => {
                        tracing::debug!(authority, error = %e, "Tunnel ended with error");
                    }
                }
            }
            Err(e) => {
                tracing::debug!(authority, error = %e, "Client upgrade failed");
                let _ = backend.shutdown().await;
            }
        }
    });

    Ok(response)
}

/// Serialize a request head using on-wire HTTP/1.1 framing
fn serialize_request_head(parts: &http::request::Parts) -> Vec<u8> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut head = format!("{} {} HTTP/1.1\r\n", parts.method, path_and_query).into_bytes();
    for (name, value) in parts.headers.iter() {
        head.extend_from_slice(name.as_str().as_bytes());
        head.extend_from_slice(b": ");
        head.extend_from_slice(value.as_bytes());
        head.extend_from_slice(b"\r\n");
    }
    head.extend_from_slice(b"\r\n");
    head
}

/// Read the backend's response head off the raw connection.
///
/// Returns the parsed head and any bytes the backend sent past it; those
/// belong to the tunneled stream and must reach the client first.
async fn read_response_head<S>(stream: &mut S) -> Result<(Response<Full<Bytes>>, Bytes)>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(1024);

    loop {
        if buf.len() > MAX_HEAD_BYTES {
            return Err(GatewayError::Other(
                "Backend response head too large".to_string(),
            ));
        }

        let n = stream.read_buf(&mut buf).await?;
        if n == 0 {
            return Err(GatewayError::ServiceUnavailable(
                "Backend closed connection during handshake".to_string(),
            ));
        }

        if let Some(end) = head_end(&buf) {
            let head_bytes = buf.split_to(end);
            let response = parse_response_head(&head_bytes)?;
            return Ok((response, buf.freeze()));
        }
    }
}

/// Find the end of an HTTP head (the byte after `\r\n\r\n`), if complete
fn head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

/// Parse a raw response head into a relayable empty-body response
fn parse_response_head(raw: &[u8]) -> Result<Response<Full<Bytes>>> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut parsed = httparse::Response::new(&mut headers);

    match parsed.parse(raw) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(GatewayError::Other(
                "Truncated backend response head".to_string(),
            ));
        }
        Err(e) => {
            return Err(GatewayError::Other(format!(
                "Malformed backend response head: {}",
                e
            )));
        }
    }

    let status = parsed
        .code
        .and_then(|c| StatusCode::from_u16(c).ok())
        .ok_or_else(|| GatewayError::Other("Invalid backend status code".to_string()))?;

    let mut builder = Response::builder().status(status);
    for header in parsed.headers.iter() {
        builder = builder.header(header.name, header.value);
    }

    builder
        .body(Full::default())
        .map_err(|e| GatewayError::Other(format!("Invalid backend response head: {}", e)))
}

/// Relay bytes bidirectionally between the client and backend connections.
///
/// Copies client→backend and backend→client concurrently; the first
/// direction to finish (EOF or error) ends the session, and the opposite
/// write half is shut down so teardown propagates to both peers. Both
/// connections are dropped (closed) on every exit path.
pub(crate) async fn relay<C, B>(client: C, backend: B, initial: Bytes) -> Result<(u64, u64)>
where
    C: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut backend_read, mut backend_write) = tokio::io::split(backend);

    // Bytes the backend sent on the heels of its 101 head
    if !initial.is_empty() {
        client_write.write_all(&initial).await?;
    }

    let client_to_backend = tokio::io::copy(&mut client_read, &mut backend_write);
    let backend_to_client = tokio::io::copy(&mut backend_read, &mut client_write);

    let result = tokio::select! {
        result = client_to_backend => {
            let bytes_sent = result.map_err(|e| {
                GatewayError::Other(format!("Tunnel client→backend error: {}", e))
            })?;
            let _ = backend_write.shutdown().await;
            (bytes_sent, 0u64)
        }
        result = backend_to_client => {
            let bytes_received = result.map_err(|e| {
                GatewayError::Other(format!("Tunnel backend→client error: {}", e))
            })?;
            let _ = client_write.shutdown().await;
            (0u64, bytes_received)
        }
    };

    Ok(result)
}
