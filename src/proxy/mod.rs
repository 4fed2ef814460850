//! Proxy layer — request forwarding to backends
//!
//! A request is forwarded one of two ways: buffered HTTP reverse proxying
//! for ordinary traffic, or a raw byte tunnel for protocol upgrades. The
//! dispatcher below picks the mode from the original request headers.

pub mod http_proxy;
pub mod tunnel;

pub use http_proxy::{HttpProxy, ProxyResponse};
pub use tunnel::tunnel;

use http::header::{HeaderName, CONNECTION, UPGRADE};
use http::HeaderMap;

/// Check if a request asks for a WebSocket protocol upgrade.
///
/// True iff the `Connection` header's token list contains `upgrade` and
/// the `Upgrade` header's token list contains `websocket`. Token lists are
/// comma-separated, case-insensitive, and whitespace-trimmed; a missing
/// header fails its condition. Pure — must run before any request
/// mutation, since both forwarding paths need the original headers.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    header_contains_token(headers, CONNECTION, "upgrade")
        && header_contains_token(headers, UPGRADE, "websocket")
}

fn header_contains_token(headers: &HeaderMap, name: HeaderName, token: &str) -> bool {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|t| t.trim().eq_ignore_ascii_case(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_upgrade_request() {
        let h = headers(&[("Connection", "Upgrade"), ("Upgrade", "websocket")]);
        assert!(is_upgrade_request(&h));
    }

    #[test]
    fn test_upgrade_case_insensitive() {
        let h = headers(&[("Connection", "uPgRaDe"), ("Upgrade", "WebSocket")]);
        assert!(is_upgrade_request(&h));
    }

    #[test]
    fn test_upgrade_token_lists_with_whitespace() {
        let h = headers(&[
            ("Connection", "keep-alive,  Upgrade "),
            ("Upgrade", " websocket"),
        ]);
        assert!(is_upgrade_request(&h));
    }

    #[test]
    fn test_no_headers() {
        assert!(!is_upgrade_request(&HeaderMap::new()));
    }

    #[test]
    fn test_keep_alive_only() {
        let h = headers(&[("Connection", "keep-alive")]);
        assert!(!is_upgrade_request(&h));
    }

    #[test]
    fn test_connection_upgrade_without_upgrade_header() {
        let h = headers(&[("Connection", "upgrade")]);
        assert!(!is_upgrade_request(&h));
    }

    #[test]
    fn test_upgrade_header_without_connection_token() {
        let h = headers(&[("Connection", "keep-alive"), ("Upgrade", "websocket")]);
        assert!(!is_upgrade_request(&h));
    }

    #[test]
    fn test_upgrade_to_other_protocol() {
        let h = headers(&[("Connection", "Upgrade"), ("Upgrade", "h2c")]);
        assert!(!is_upgrade_request(&h));
    }

    #[test]
    fn test_multiple_header_lines() {
        let h = headers(&[
            ("Connection", "keep-alive"),
            ("Connection", "Upgrade"),
            ("Upgrade", "websocket"),
        ]);
        assert!(is_upgrade_request(&h));
    }

    #[test]
    fn test_partial_token_does_not_match() {
        // "upgraded" is not the token "upgrade"
        let h = headers(&[("Connection", "upgraded"), ("Upgrade", "websocket")]);
        assert!(!is_upgrade_request(&h));
    }
}
