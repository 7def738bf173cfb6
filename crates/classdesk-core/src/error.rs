// ── Core error types ──
//
// Errors surfaced to dashboard consumers, either returned from a mutation
// or stored on a cache entry. The `From<classdesk_api::Error>` impl
// translates transport-layer errors into these variants.

use thiserror::Error;

use crate::operation::OperationKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Gating ───────────────────────────────────────────────────────
    /// No access token in the session. Nothing was sent over the wire.
    #[error("Authentication required")]
    AuthRequired,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Transport ────────────────────────────────────────────────────
    /// Non-2xx response (`status` set) or network/timeout failure
    /// (`status` is `None`).
    #[error("Request failed: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
        transient: bool,
    },

    // ── Operation errors ─────────────────────────────────────────────
    /// A write failed remotely; carries which operation it was.
    #[error("{operation} failed: {source}")]
    Mutation {
        operation: OperationKind,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for network, timeout and 5xx failures.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { transient, .. } => *transient,
            Self::Mutation { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Returns `true` if the failure was the missing-token gate, looking
    /// through mutation context.
    pub fn is_auth_required(&self) -> bool {
        match self {
            Self::AuthRequired => true,
            Self::Mutation { source, .. } => source.is_auth_required(),
            _ => false,
        }
    }

    /// HTTP status of the underlying failure, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Mutation { source, .. } => source.status(),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<classdesk_api::Error> for CoreError {
    fn from(err: classdesk_api::Error) -> Self {
        let transient = err.is_transient();
        match err {
            classdesk_api::Error::AuthRequired => CoreError::AuthRequired,
            classdesk_api::Error::Status { status, body } => CoreError::Transport {
                status: Some(status),
                message: format!("HTTP {status}: {body}"),
                transient,
            },
            classdesk_api::Error::Network(ref e) => CoreError::Transport {
                status: e.status().map(|s| s.as_u16()),
                message: err.to_string(),
                transient,
            },
            classdesk_api::Error::Timeout { .. } => CoreError::Transport {
                status: None,
                message: err.to_string(),
                transient,
            },
            classdesk_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            classdesk_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            classdesk_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl From<classdesk_api::AuthError> for CoreError {
    fn from(err: classdesk_api::AuthError) -> Self {
        match err {
            classdesk_api::AuthError::Transport(e) => e.into(),
            other => CoreError::AuthenticationFailed {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_keep_status_and_transience() {
        let err: CoreError = classdesk_api::Error::Status {
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert_eq!(err.status(), Some(502));
        assert!(err.is_transient());

        let err: CoreError = classdesk_api::Error::Status {
            status: 404,
            body: String::new(),
        }
        .into();
        assert!(!err.is_transient());
    }

    #[test]
    fn timeout_has_no_status() {
        let err: CoreError = classdesk_api::Error::Timeout { timeout_secs: 30 }.into();
        assert_eq!(err.status(), None);
        assert!(err.is_transient());
    }

    #[test]
    fn mutation_context_is_transparent_to_queries() {
        let err = CoreError::Mutation {
            operation: OperationKind::DeleteTeacher,
            source: Box::new(CoreError::Transport {
                status: Some(500),
                message: "HTTP 500".into(),
                transient: true,
            }),
        };
        assert_eq!(err.status(), Some(500));
        assert!(err.is_transient());
        assert!(!err.is_auth_required());
        assert!(err.to_string().starts_with("deleteTeacher failed"));
    }
}
