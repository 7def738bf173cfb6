// ── Mutation runner ──
//
// Executes one write through the API client and, only once the server
// confirms it, marks the affected cache prefixes stale.

use std::sync::Arc;
use std::time::Duration;

use classdesk_api::{ApiClient, RequestOptions};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, QueryCache};
use crate::error::CoreError;
use crate::invalidation::InvalidationRouter;
use crate::operation::{MutationRequest, OperationKind};

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Runs writes and couples them to cache invalidation.
#[derive(Clone)]
pub struct MutationRunner {
    client: Arc<ApiClient>,
    cache: QueryCache<Value>,
    router: Arc<InvalidationRouter>,
}

impl MutationRunner {
    pub fn new(
        client: Arc<ApiClient>,
        cache: QueryCache<Value>,
        router: Arc<InvalidationRouter>,
    ) -> Self {
        Self {
            client,
            cache,
            router,
        }
    }

    pub fn router(&self) -> &InvalidationRouter {
        &self.router
    }

    /// Execute `operation` and return the server's response body.
    ///
    /// Fails with [`CoreError::AuthRequired`] before anything is sent when
    /// there is no access token, and with [`CoreError::ValidationFailed`]
    /// for a malformed request. A transient transport failure is retried
    /// once. Remote failures come back as [`CoreError::Mutation`].
    pub async fn run(
        &self,
        operation: OperationKind,
        payload: Value,
        target_id: Option<&str>,
    ) -> Result<Value, CoreError> {
        if !self.client.session().is_authenticated() {
            debug!(%operation, "no access token, mutation not sent");
            return Err(CoreError::AuthRequired);
        }

        let request = MutationRequest::new(operation, payload, target_id)?;
        let response = self.send(&request).await.map_err(|err| match err {
            CoreError::AuthRequired => CoreError::AuthRequired,
            other => CoreError::Mutation {
                operation,
                source: Box::new(other),
            },
        })?;

        let stale = self.apply_invalidation(operation);
        info!(%operation, target = ?request.target_id, invalidated = stale.len(), "mutation succeeded");
        Ok(response)
    }

    /// Invalidate every prefix mapped to `operation`, returning them.
    fn apply_invalidation(&self, operation: OperationKind) -> Vec<CacheKey> {
        let prefixes = self.router.rules_for(operation);
        for prefix in &prefixes {
            self.cache.invalidate(prefix);
        }
        prefixes
    }

    async fn send(&self, request: &MutationRequest) -> Result<Value, CoreError> {
        let endpoint = request.operation.endpoint();
        let body = request.body();
        let attempt = || {
            self.client.request(
                endpoint.method.clone(),
                endpoint.path,
                Some(&body),
                RequestOptions::AUTHENTICATED,
            )
        };

        match attempt().await {
            Ok(value) => Ok(value),
            Err(err) if err.is_transient() => {
                warn!(
                    operation = %request.operation,
                    error = %err,
                    "transient failure, retrying once"
                );
                tokio::time::sleep(RETRY_DELAY).await;
                Ok(attempt().await?)
            }
            Err(err) => Err(err.into()),
        }
    }
}
