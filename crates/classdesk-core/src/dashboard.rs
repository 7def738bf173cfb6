// ── Dashboard facade ──
//
// Owns one session store, API client, query cache and mutation runner,
// wired together explicitly from a `DashboardConfig`. Views read and
// write through this type and never touch the stores' internals.

use std::sync::Arc;

use classdesk_api::{ApiClient, AuthError, Session, SessionStore, TlsMode, TransportConfig};
use secrecy::SecretString;
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, QueryCache, QueryStream, ReadOptions};
use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::invalidation::InvalidationRouter;
use crate::mutation::MutationRunner;
use crate::operation::OperationKind;
use crate::resource::ResourceQuery;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    session: Arc<SessionStore>,
    client: Arc<ApiClient>,
    cache: QueryCache<Value>,
    mutations: MutationRunner,
}

impl Dashboard {
    /// Build every store from `config`, restoring a persisted session if
    /// one is configured. Nothing is sent over the wire.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let session = Arc::new(match &config.session_file {
            Some(path) => SessionStore::persistent(path),
            None => SessionStore::new(),
        });
        let transport = TransportConfig {
            tls: TlsMode::from(&config.tls),
            timeout: config.timeout,
        };
        let client = Arc::new(ApiClient::new(
            config.base_url.clone(),
            Arc::clone(&session),
            &transport,
        )?);
        Ok(Self::assemble(config, session, client, InvalidationRouter::standard()))
    }

    /// Build from pre-constructed parts (custom HTTP client or rules).
    pub fn with_parts(
        config: DashboardConfig,
        client: Arc<ApiClient>,
        router: InvalidationRouter,
    ) -> Self {
        let session = Arc::clone(client.session());
        Self::assemble(config, session, client, router)
    }

    fn assemble(
        config: DashboardConfig,
        session: Arc<SessionStore>,
        client: Arc<ApiClient>,
        router: InvalidationRouter,
    ) -> Self {
        let cache = QueryCache::new();
        let mutations = MutationRunner::new(Arc::clone(&client), cache.clone(), Arc::new(router));
        Self {
            inner: Arc::new(DashboardInner {
                config,
                session,
                client,
                cache,
                mutations,
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.inner.client
    }

    pub fn cache(&self) -> &QueryCache<Value> {
        &self.inner.cache
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Subscribe to `query` with the configured read options.
    pub fn read(&self, query: &ResourceQuery) -> QueryStream<Value> {
        self.read_with(query, self.inner.config.read_options())
    }

    /// Subscribe to `query`.
    ///
    /// Without an access token the entry records
    /// [`CoreError::AuthRequired`] and nothing is fetched, whatever its
    /// freshness. A query missing its parameter is read disabled.
    pub fn read_with(&self, query: &ResourceQuery, options: ReadOptions) -> QueryStream<Value> {
        let key = query.key();
        if !self.inner.session.is_authenticated() {
            return self.inner.cache.gate(key, CoreError::AuthRequired);
        }

        let enabled = options.enabled && query.is_ready();
        let client = Arc::clone(&self.inner.client);
        let query = query.clone();
        self.inner.cache.read(
            key,
            move || {
                let client = Arc::clone(&client);
                let query = query.clone();
                async move { query.fetch(&client).await }
            },
            options.enabled(enabled),
        )
    }

    /// Read `query` and wait for it to settle.
    pub async fn fetch(&self, query: &ResourceQuery) -> Arc<CacheEntry<Value>> {
        self.read(query).settled().await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Run a write; see [`MutationRunner::run`].
    pub async fn run(
        &self,
        operation: OperationKind,
        payload: Value,
        target_id: Option<&str>,
    ) -> Result<Value, CoreError> {
        self.inner.mutations.run(operation, payload, target_id).await
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Sign in. Cached data from any previous session is dropped.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Arc<Session>, CoreError> {
        let session = self.inner.client.login(email, password).await?;
        self.inner.cache.clear();
        Ok(session)
    }

    /// Exchange the refresh token. A failure leaves the session as it
    /// was; the caller decides whether to [`logout`](Self::logout).
    pub async fn refresh(&self) -> Result<Arc<Session>, AuthError> {
        let session = self.inner.client.refresh().await;
        if let Err(ref err) = session {
            debug!(error = %err, "token refresh failed");
        }
        session
    }

    /// Drop the session and every cached entry.
    pub fn logout(&self) {
        self.inner.client.logout();
        self.inner.cache.clear();
    }
}
