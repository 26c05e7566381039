//! Bearer tokens for the resource manager
//!
//! [`ClientSecretCredential`] performs the OAuth2 client-credentials exchange
//! against `{authority}/{tenant}/oauth2/token` and caches the token until it
//! is close to expiry. [`StaticToken`] hands out a fixed token.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::error::{CoreError, Result};

/// Refresh tokens this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// A bearer token and its expiry
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let margin = chrono::Duration::seconds(EXPIRY_MARGIN.as_secs() as i64);
        self.expires_at - margin > now
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<REDACTED>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of bearer tokens for control-plane requests
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<AccessToken>;
}

/// A pre-issued token that never refreshes
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenCredential for StaticToken {
    async fn token(&self) -> Result<AccessToken> {
        Ok(AccessToken::new(
            self.0.clone(),
            DateTime::<Utc>::MAX_UTC,
        ))
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    resource: &'a str,
}

/// The v1 endpoint returns `expires_in` as a string; v2 as a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(u64),
    Text(String),
}

impl Seconds {
    fn as_secs(&self) -> Option<u64> {
        match self {
            Seconds::Number(n) => Some(*n),
            Seconds::Text(s) => s.parse().ok(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<Seconds>,
}

/// Service principal credential using a client secret
pub struct ClientSecretCredential {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    resource: String,
    cached: Mutex<Option<AccessToken>>,
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<REDACTED>")
            .field("resource", &self.resource)
            .finish()
    }
}

impl ClientSecretCredential {
    /// Build a credential for `tenant_id` at `authority`.
    ///
    /// `resource` is the token audience, normally the resource manager
    /// endpoint with a trailing slash.
    pub fn new(
        http: reqwest::Client,
        authority: &Url,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        resource: impl Into<String>,
    ) -> Result<Self> {
        let mut token_url = authority.clone();
        token_url
            .path_segments_mut()
            .map_err(|_| CoreError::validation("authority", "cannot be a base URL"))?
            .pop_if_empty()
            .extend([tenant_id, "oauth2", "token"]);

        Ok(Self {
            http,
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            resource: resource.into(),
            cached: Mutex::new(None),
        })
    }

    async fn request_token(&self) -> Result<AccessToken> {
        let form = serde_urlencoded::to_string(TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            resource: &self.resource,
        })
        .map_err(|e| CoreError::Auth(format!("failed to encode token request: {}", e)))?;

        tracing::debug!("Requesting token from {}", self.token_url);
        let response = self
            .http
            .post(self.token_url.clone())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CoreError::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        let lifetime = token
            .expires_in
            .as_ref()
            .and_then(Seconds::as_secs)
            .unwrap_or(3600);
        let expires_at = Utc::now() + chrono::Duration::seconds(lifetime as i64);
        tracing::debug!("Token acquired, expires at {}", expires_at);

        Ok(AccessToken::new(token.access_token, expires_at))
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Utc::now())
        {
            return Ok(token.clone());
        }

        let token = self.request_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}
