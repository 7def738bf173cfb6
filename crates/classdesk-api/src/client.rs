// Admin API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token attachment
// from the shared session store, and uniform status/JSON handling. Auth
// flows (login, refresh, logout) live in `auth.rs` as inherent methods.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, body_preview};
use crate::session::SessionStore;
use crate::transport::TransportConfig;

/// Per-request knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Refuse to send the request when the session has no access token.
    pub require_auth: bool,
}

impl RequestOptions {
    pub const AUTHENTICATED: Self = Self { require_auth: true };
    pub const PUBLIC: Self = Self {
        require_auth: false,
    };
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::AUTHENTICATED
    }
}

/// HTTP client for the remote admin API.
///
/// Reads the access token from the [`SessionStore`] on every call and never
/// writes to it, except through the auth flows. Response bodies are returned
/// as untyped JSON; their shape belongs to the caller.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<SessionStore>,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root; request paths are appended to it.
    pub fn new(
        base_url: Url,
        session: Arc<SessionStore>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            session,
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, session: Arc<SessionStore>) -> Self {
        Self {
            http,
            base_url,
            session,
            timeout: TransportConfig::default().timeout,
        }
    }

    /// The session store this client reads tokens from.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join `path` onto the base URL, keeping any path prefix on the base.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Issue one request and return the decoded JSON body.
    ///
    /// With `require_auth` and no token the call fails with
    /// [`Error::AuthRequired`] before anything is sent. A present token is
    /// attached regardless of `require_auth`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: RequestOptions,
    ) -> Result<Value, Error> {
        let token = self.session.access_token();
        if options.require_auth && token.is_none() {
            debug!(%method, path, "no access token, request not sent");
            return Err(Error::AuthRequired);
        }

        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method, url);
        if let Some(ref token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| self.send_error(e))?;
        self.parse_response(resp).await
    }

    /// Authenticated `GET`.
    pub async fn get(&self, path: &str) -> Result<Value, Error> {
        self.request(Method::GET, path, None, RequestOptions::AUTHENTICATED)
            .await
    }

    /// Authenticated `POST` with a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.request(Method::POST, path, Some(body), RequestOptions::AUTHENTICATED)
            .await
    }

    fn send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Network(err)
        }
    }

    /// Map non-2xx to [`Error::Status`] and decode the body.
    /// An empty 2xx body decodes to `Value::Null`.
    async fn parse_response(&self, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            return Err(Error::from_status(status, &body));
        }

        trace!(%status, bytes = body.len(), "response received");

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview = body_preview(&body, 200);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Arc::new(SessionStore::new()),
        )
    }

    #[test]
    fn url_keeps_base_prefix() {
        let c = client("https://admin.example.com/api/v1/");
        assert_eq!(
            c.url("teacher/list-select").unwrap().as_str(),
            "https://admin.example.com/api/v1/teacher/list-select"
        );
        assert_eq!(
            c.url("/unit/pdf/list").unwrap().as_str(),
            "https://admin.example.com/api/v1/unit/pdf/list"
        );
    }

    #[tokio::test]
    async fn gated_request_never_reaches_the_network() {
        // Unroutable base: any attempt to send would fail with a network error.
        let c = client("http://127.0.0.1:9");
        let err = c.get("teacher/list-select").await.unwrap_err();
        assert!(matches!(err, Error::AuthRequired), "got {err:?}");
    }
}
