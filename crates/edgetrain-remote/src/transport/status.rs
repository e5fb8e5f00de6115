//! Mapping HTTP outcomes onto [`RemoteError`].

use edgetrain_core::errors::RemoteError;
use reqwest::StatusCode;

/// Longest response body echoed into an error reason.
const MAX_REASON_BODY: usize = 256;

/// Classify a non-success HTTP status.
///
/// 401/403 → `Unauthorized`, 404 → `NotFound`, 429 → `RateLimited`,
/// 5xx → `Unavailable`, anything else → `Unknown`.
pub fn classify_status(status: StatusCode, body: &str) -> RemoteError {
    let reason = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", truncate(body.trim(), MAX_REASON_BODY))
    };
    match status.as_u16() {
        401 | 403 => RemoteError::Unauthorized { reason },
        404 => RemoteError::NotFound { reason },
        429 => RemoteError::RateLimited { reason },
        500..=599 => RemoteError::Unavailable { reason },
        _ => RemoteError::Unknown { reason },
    }
}

/// Classify a request that never produced a usable response.
pub fn classify_send_error(err: &reqwest::Error) -> RemoteError {
    let reason = err.to_string();
    if err.is_timeout() || err.is_connect() || err.is_request() {
        RemoteError::Unavailable { reason }
    } else if err.is_decode() || err.is_body() {
        RemoteError::Unknown {
            reason: format!("malformed response: {reason}"),
        }
    } else {
        RemoteError::Unavailable { reason }
    }
}

/// Classify a failed mutating request (`POST`).
///
/// Only a connection that was never established is safe to resend. A
/// timeout or a broken response means the platform may already have acted
/// on the request.
pub fn classify_post_send_error(err: &reqwest::Error) -> RemoteError {
    if err.is_connect() || err.is_builder() {
        return RemoteError::Unavailable {
            reason: err.to_string(),
        };
    }
    RemoteError::OutcomeUnknown {
        reason: err.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
