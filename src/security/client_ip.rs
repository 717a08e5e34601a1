//! Client IP extraction for rate-limit keys.
//!
//! # Responsibilities
//! - Pick a best-guess client address out of proxy headers
//! - Normalize it so equivalent spellings share one key
//!
//! # Design Decisions
//! - `X-Forwarded-For` (first hop) is preferred over `X-Real-IP`
//! - Result is a rate-limit key only, not an identity: both headers are
//!   client-controlled unless a trusted proxy rewrites them
//! - Anything unparseable collapses to the shared `"unknown"` key

use std::net::IpAddr;

use axum::http::HeaderMap;

/// Key returned when no header yields a valid address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Upper bound on the length of a returned key.
pub const MAX_IP_LENGTH: usize = 64;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Case-insensitive header access.
pub trait HeaderLookup {
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderLookup for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        // HeaderMap names are already lowercase; non-UTF-8 values count as absent.
        self.get(name).and_then(|v| v.to_str().ok())
    }
}

impl HeaderLookup for [(&str, &str)] {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

impl<const N: usize> HeaderLookup for [(&str, &str); N] {
    fn header(&self, name: &str) -> Option<&str> {
        self.as_slice().header(name)
    }
}

/// Derive the rate-limit key for a request from its proxy headers.
///
/// Returns the first candidate that is a valid IPv4/IPv6 literal after
/// normalization, or [`UNKNOWN_CLIENT`].
pub fn normalize_client_ip<H: HeaderLookup + ?Sized>(headers: &H) -> String {
    let forwarded = headers
        .header(X_FORWARDED_FOR)
        .map(|xff| xff.split(',').next().unwrap_or_default());
    let real_ip = headers.header(X_REAL_IP);

    [forwarded, real_ip]
        .into_iter()
        .flatten()
        .map(normalize_candidate)
        .find(|candidate| !candidate.is_empty() && candidate.parse::<IpAddr>().is_ok())
        .map(|ip| truncate(ip, MAX_IP_LENGTH))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn normalize_candidate(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let without_port = strip_ipv4_port(trimmed);
    let without_zone = without_port.split('%').next().unwrap_or(without_port);
    without_zone.to_ascii_lowercase()
}

/// `192.168.1.1:8080` -> `192.168.1.1`. Plain IPv6 has no `.`, so it is
/// left alone; IPv4-mapped IPv6 with a dot is cut at the last `:` and then
/// fails validation.
fn strip_ipv4_port(raw: &str) -> &str {
    if raw.contains('.') && raw.contains(':') {
        match raw.rfind(':') {
            Some(idx) => &raw[..idx],
            None => raw,
        }
    } else {
        raw
    }
}

fn truncate(mut value: String, max: usize) -> String {
    if value.len() > max {
        // IP literals are ASCII, so any byte index is a char boundary.
        value.truncate(max);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_prefers_first_forwarded_hop_and_strips_port() {
        let headers = [
            ("X-Forwarded-For", " 192.168.1.10:8080, 10.0.0.1 "),
            ("x-real-ip", "172.16.0.1"),
        ];
        assert_eq!(normalize_client_ip(&headers), "192.168.1.10");
    }

    #[test]
    fn test_falls_back_to_real_ip() {
        let headers = [("x-forwarded-for", "not-an-ip"), ("x-real-ip", "2001:db8::1")];
        assert_eq!(normalize_client_ip(&headers), "2001:db8::1");
    }

    #[test]
    fn test_empty_headers_yield_unknown() {
        let headers: [(&str, &str); 0] = [];
        assert_eq!(normalize_client_ip(&headers), UNKNOWN_CLIENT);
        assert_eq!(normalize_client_ip(&HeaderMap::new()), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_only_first_forwarded_entry_is_considered() {
        // A bad first hop does not fall through to later hops.
        let headers = [("x-forwarded-for", "garbage, 10.0.0.1")];
        assert_eq!(normalize_client_ip(&headers), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_ipv6_zone_and_case_are_normalized() {
        let headers = [("x-real-ip", "FE80::1%eth0")];
        assert_eq!(normalize_client_ip(&headers), "fe80::1");

        let headers = [("x-forwarded-for", "2001:DB8::ABCD")];
        assert_eq!(normalize_client_ip(&headers), "2001:db8::abcd");
    }

    #[test]
    fn test_plain_ipv6_keeps_all_groups() {
        let headers = [("x-forwarded-for", "2001:db8::1:8080")];
        assert_eq!(normalize_client_ip(&headers), "2001:db8::1:8080");
    }

    #[test]
    fn test_blank_forwarded_for_uses_real_ip() {
        let headers = [("x-forwarded-for", "   "), ("x-real-ip", "10.1.2.3")];
        assert_eq!(normalize_client_ip(&headers), "10.1.2.3");
    }

    #[test]
    fn test_header_map_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(" 10.0.0.7 "));
        assert_eq!(normalize_client_ip(&headers), "10.0.0.7");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_bytes(b"\xff\xfe").unwrap(),
        );
        // Non-UTF-8 forwarded header is skipped.
        assert_eq!(normalize_client_ip(&headers), "10.0.0.7");
    }

    #[test]
    fn test_normalization_is_stable() {
        let headers = [("x-forwarded-for", "192.168.1.10:443")];
        let first = normalize_client_ip(&headers);
        let again = [("x-forwarded-for", first.as_str())];
        assert_eq!(normalize_client_ip(&again), first);
    }

    #[test]
    fn test_truncate_caps_length() {
        let long = "a".repeat(100);
        assert_eq!(truncate(long, MAX_IP_LENGTH).len(), MAX_IP_LENGTH);
    }
}
