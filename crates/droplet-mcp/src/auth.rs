//! Bearer token extraction for the HTTP transport.
//!
//! A token sent in `Authorization: Bearer <token>` replaces the configured
//! DigitalOcean token for that request.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// Token from an Authorization header value, with or without the
/// `Bearer` scheme (matched case-insensitively). A bare scheme is no token.
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let value = header_value.trim();
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

/// Token from a request's headers, if one is present and readable.
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer)
        .map(str::to_string)
}
