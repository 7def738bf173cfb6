//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use classdesk_config::ConfigError;
use classdesk_core::{AuthError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Not signed in")]
    #[diagnostic(
        code(classdesk::auth_required),
        help("Run: classdesk login --profile {profile}")
    )]
    AuthRequired { profile: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(classdesk::auth_failed),
        help(
            "Verify your email and password, or sign in again.\n\
             Run: classdesk login"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(classdesk::no_credentials),
        help(
            "Set email in the profile or pass --email.\n\
             Provide the password via CLASSDESK_PASSWORD, the keyring (--remember), or --password-stdin."
        )
    )]
    NoCredentials { profile: String },

    // ── Remote API ───────────────────────────────────────────────────
    #[error("API request failed with HTTP {status}: {message}")]
    #[diagnostic(code(classdesk::http))]
    Http { status: u16, message: String },

    #[error("Could not reach the API: {message}")]
    #[diagnostic(
        code(classdesk::connection_failed),
        help("Check --base-url and that the API is reachable. Try --timeout to wait longer.")
    )]
    ConnectionFailed { message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(classdesk::internal))]
    Internal { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(classdesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(classdesk::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API configured")]
    #[diagnostic(
        code(classdesk::no_config),
        help(
            "Pass --base-url, or add a profile with base_url to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(classdesk::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(classdesk::json), help("Check the JSON payload and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthRequired { .. } | Self::AuthFailed { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::Http { status, .. } => match status {
                401 => exit_code::AUTH,
                403 => exit_code::PERMISSION,
                404 => exit_code::NOT_FOUND,
                409 => exit_code::CONFLICT,
                _ => exit_code::GENERAL,
            },
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Translate a core error by reference (cache entries share theirs).
    pub fn from_core(err: &CoreError, profile: &str) -> Self {
        match err {
            CoreError::AuthRequired => Self::AuthRequired {
                profile: profile.into(),
            },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                message: message.clone(),
            },
            CoreError::Transport {
                status: Some(status),
                message,
                ..
            } => Self::Http {
                status: *status,
                message: message.clone(),
            },
            CoreError::Transport { message, .. } => Self::ConnectionFailed {
                message: message.clone(),
            },
            CoreError::Mutation { operation, source } => match Self::from_core(source, profile) {
                Self::Http { status, message } => Self::Http {
                    status,
                    message: format!("{operation}: {message}"),
                },
                other => other,
            },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message.clone(),
            },
            CoreError::Config { message } | CoreError::Internal(message) => Self::Internal {
                message: message.clone(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        Self::AuthFailed {
            message: err.to_string(),
        }
    }
}
