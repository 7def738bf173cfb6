use thiserror::Error;

/// Longest response body preview carried in an error message.
const MAX_BODY_PREVIEW: usize = 500;

/// Top-level error type for the `classdesk-api` crate.
///
/// Covers every failure of a single request: the auth gate, HTTP status
/// failures, and network/timeout failures. `classdesk-core` maps these
/// into the errors stored on cache entries and mutation results.
#[derive(Debug, Error)]
pub enum Error {
    // ── Gating ──────────────────────────────────────────────────────
    /// The call requires a bearer token and the session has none.
    /// No request was sent.
    #[error("Authentication required -- no access token in session")]
    AuthRequired,

    // ── HTTP ────────────────────────────────────────────────────────
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Connection refused, DNS failure, reset, etc.
    #[error("HTTP transport error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request did not complete within the configured bound.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// URL parsing or joining failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// Response body was not valid JSON.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Build a status error, truncating the body so logs stay readable.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        Self::Status {
            status: status.as_u16(),
            body: truncate_body(body),
        }
    }

    /// HTTP status of the failure, `None` for gate/network/timeout errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Network and timeout failures and 5xx are transient. The auth gate
    /// and every 4xx are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    /// Returns `true` if the server rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::Status { status: 401, .. })
    }
}

/// Failure of the token refresh flow.
///
/// Kept apart from [`Error`] so callers can decide whether to clear the
/// session: a refresh failure never clears it by itself.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no refresh token in session")]
    MissingRefreshToken,

    #[error("refresh rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("session changed while the refresh was in flight")]
    SessionChanged,

    #[error("refresh response missing {field}")]
    MalformedResponse { field: &'static str },

    #[error("refresh request failed: {0}")]
    Transport(#[from] Error),
}

/// Longest prefix of `body` that fits in `max` bytes without splitting a char.
pub(crate) fn body_preview(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_BODY_PREVIEW {
        return body.to_owned();
    }
    format!(
        "{}... (truncated, {} total bytes)",
        body_preview(body, MAX_BODY_PREVIEW),
        body.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(Error::Timeout { timeout_secs: 30 }.is_transient());
        assert!(
            Error::Status {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !Error::Status {
                status: 429,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !Error::Status {
                status: 422,
                body: String::new()
            }
            .is_transient()
        );
        assert!(!Error::AuthRequired.is_transient());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2_000);
        let err = Error::from_status(reqwest::StatusCode::BAD_REQUEST, &body);
        let Error::Status { status, body } = err else {
            panic!("expected status error");
        };
        assert_eq!(status, 400);
        assert!(body.contains("truncated, 2000 total bytes"));
    }

    #[test]
    fn gate_error_has_no_status() {
        assert_eq!(Error::AuthRequired.status(), None);
        assert!(Error::AuthRequired.is_unauthorized());
    }
}
