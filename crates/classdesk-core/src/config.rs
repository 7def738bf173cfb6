// ── Runtime dashboard configuration ──
//
// These types describe *where* the admin API lives and how the cache
// behaves. They never touch disk: the CLI (via `classdesk-config`)
// constructs a `DashboardConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use classdesk_api::TlsMode;
use url::Url;

use crate::cache::ReadOptions;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (development backends with self-signed certs).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Configuration for one dashboard instance.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// API root (e.g. `https://admin.example.com/api`).
    pub base_url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How long a successful read stays fresh.
    pub stale_time: Duration,
    /// Retries for a transient read failure.
    pub query_retry: u32,
    /// Where the session is persisted. `None` keeps it in memory only.
    pub session_file: Option<PathBuf>,
}

impl DashboardConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            stale_time: Duration::from_secs(60),
            query_retry: 1,
            session_file: None,
        }
    }

    /// Default read options derived from this config.
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions::default()
            .stale_time(self.stale_time)
            .retry(self.query_retry)
    }
}
