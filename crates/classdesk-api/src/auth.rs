// Bearer-token authentication flows
//
// Login exchanges credentials for an access/refresh token pair, refresh
// trades the stored refresh token for a new access token, and logout
// drops the local session. Each successful flow writes the session store
// through `set_tokens`; failures leave it untouched.

use std::sync::Arc;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::client::{ApiClient, RequestOptions};
use crate::error::{AuthError, Error};
use crate::session::Session;

const LOGIN_PATH: &str = "auth/login";
const REFRESH_PATH: &str = "auth/refresh";

/// Token payload returned by the login and refresh endpoints.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    /// Numeric on some deployments, string on others.
    user_id: Option<Value>,
}

impl TokenResponse {
    fn user_id(&self) -> Option<String> {
        match self.user_id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl ApiClient {
    /// Authenticate with email/password and store the issued tokens.
    ///
    /// The login endpoint is public; no token is required to call it.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Arc<Session>, Error> {
        debug!(email, "logging in");

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let value = self
            .request(Method::POST, LOGIN_PATH, Some(&body), RequestOptions::PUBLIC)
            .await?;

        let tokens: TokenResponse =
            serde_json::from_value(value).map_err(|e| Error::Deserialization {
                message: format!("login response: {e}"),
                body: String::new(),
            })?;
        let user_id = tokens.user_id();
        let access = tokens.access_token.ok_or_else(|| Error::Deserialization {
            message: "login response missing access_token".into(),
            body: String::new(),
        })?;

        self.session().set_tokens(
            SecretString::from(access),
            tokens.refresh_token.map(SecretString::from),
            user_id,
        );

        info!("login successful");
        Ok(self.session().snapshot())
    }

    /// Exchange the stored refresh token for fresh credentials.
    ///
    /// Sends the refresh token and user id; on success replaces the tokens
    /// (keeping the old refresh token and user id when the response omits
    /// them). On failure the previous tokens stay in place and the caller
    /// decides whether to [`logout`](Self::logout). The store is never
    /// locked, so requests already in flight keep the token they attached.
    ///
    /// If the session is replaced or cleared while the request is in
    /// flight, the response is dropped and [`AuthError::SessionChanged`]
    /// is returned.
    pub async fn refresh(&self) -> Result<Arc<Session>, AuthError> {
        let current = self.session().snapshot();
        let refresh_token = current
            .refresh_token
            .as_ref()
            .ok_or(AuthError::MissingRefreshToken)?;

        debug!(user_id = ?current.user_id, "refreshing access token");

        let body = json!({
            "refresh_token": refresh_token.expose_secret(),
            "user_id": current.user_id,
        });
        let value = match self
            .request(Method::POST, REFRESH_PATH, Some(&body), RequestOptions::PUBLIC)
            .await
        {
            Ok(v) => v,
            Err(Error::Status { status, body }) => {
                warn!(status, "refresh rejected");
                return Err(AuthError::Rejected { status, body });
            }
            Err(e) => return Err(AuthError::Transport(e)),
        };

        let tokens: TokenResponse = serde_json::from_value(value)
            .map_err(|_| AuthError::MalformedResponse { field: "body" })?;
        let user_id = tokens.user_id().or_else(|| current.user_id.clone());
        let access = tokens
            .access_token
            .ok_or(AuthError::MalformedResponse {
                field: "access_token",
            })?;
        let refresh = tokens
            .refresh_token
            .map(SecretString::from)
            .or_else(|| current.refresh_token.clone());

        if !self
            .session()
            .replace_if_current(&current, SecretString::from(access), refresh, user_id)
        {
            warn!("session changed during refresh, discarding new tokens");
            return Err(AuthError::SessionChanged);
        }

        debug!("access token refreshed");
        Ok(self.session().snapshot())
    }

    /// Drop the local session. The remote API keeps no server-side
    /// session to end.
    pub fn logout(&self) {
        self.session().clear();
        info!("logged out");
    }
}
