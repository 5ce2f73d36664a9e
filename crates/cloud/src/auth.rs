//! OAuth2 bearer tokens for Google APIs.
//!
//! Three sources are supported:
//!
//! - [`TokenProvider::anonymous`] -- no `Authorization` header (emulators).
//! - [`TokenProvider::fixed`] -- a pre-minted access token, e.g. from
//!   `gcloud auth print-access-token`.
//! - [`TokenProvider::service_account`] -- an RS256-signed JWT assertion
//!   exchanged for an access token at the key's `token_uri`. The token is
//!   cached and refreshed shortly before it expires.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::CloudError;

/// OAuth scope granting access to both Datastore and BigQuery.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Lifetime requested for each JWT assertion, in seconds (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh a cached token this many seconds before it actually expires.
const REFRESH_MARGIN_SECS: i64 = 60;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The fields of a service-account key file that token minting needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Read a JSON key file as downloaded from the cloud console.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CloudError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CloudError::Auth(format!("cannot read key file {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| CloudError::Auth(format!("invalid key file {}: {e}", path.display())))
    }
}

/// Claims of the JWT assertion sent to the token endpoint.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

enum TokenSource {
    Anonymous,
    Fixed(String),
    ServiceAccount {
        key: ServiceAccountKey,
        http: reqwest::Client,
        cached: Mutex<Option<CachedToken>>,
    },
}

/// Cheaply cloneable source of bearer tokens.
#[derive(Clone)]
pub struct TokenProvider {
    source: Arc<TokenSource>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.source.as_ref() {
            TokenSource::Anonymous => "anonymous",
            TokenSource::Fixed(_) => "fixed",
            TokenSource::ServiceAccount { .. } => "service_account",
        };
        f.debug_struct("TokenProvider").field("kind", &kind).finish()
    }
}

impl TokenProvider {
    pub fn anonymous() -> Self {
        Self {
            source: Arc::new(TokenSource::Anonymous),
        }
    }

    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: Arc::new(TokenSource::Fixed(token.into())),
        }
    }

    pub fn service_account(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            source: Arc::new(TokenSource::ServiceAccount {
                key,
                http,
                cached: Mutex::new(None),
            }),
        }
    }

    /// The current bearer token, minting or refreshing it when needed.
    pub async fn bearer(&self) -> Result<Option<String>, CloudError> {
        match self.source.as_ref() {
            TokenSource::Anonymous => Ok(None),
            TokenSource::Fixed(token) => Ok(Some(token.clone())),
            TokenSource::ServiceAccount { key, http, cached } => {
                let mut guard = cached.lock().await;
                let now = Utc::now();
                if let Some(token) = guard.as_ref() {
                    if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                        return Ok(Some(token.value.clone()));
                    }
                }

                let fresh = mint_token(key, http).await?;
                tracing::debug!(client_email = %key.client_email, "Minted cloud access token");
                let value = fresh.value.clone();
                *guard = Some(fresh);
                Ok(Some(value))
            }
        }
    }

    /// Add an `Authorization: Bearer` header when a token is available.
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, CloudError> {
        Ok(match self.bearer().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }
}

/// Build the signed JWT assertion for `key`, issued at `now_secs`.
fn build_assertion(key: &ServiceAccountKey, now_secs: i64) -> Result<String, CloudError> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: CLOUD_PLATFORM_SCOPE,
        aud: &key.token_uri,
        iat: now_secs,
        exp: now_secs + ASSERTION_LIFETIME_SECS,
    };
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| CloudError::Auth(format!("invalid private key: {e}")))?;
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| CloudError::Auth(format!("cannot sign assertion: {e}")))
}

async fn mint_token(
    key: &ServiceAccountKey,
    http: &reqwest::Client,
) -> Result<CachedToken, CloudError> {
    let now = Utc::now();
    let assertion = build_assertion(key, now.timestamp())?;

    let response = http
        .post(&key.token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(CloudError::Auth(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| CloudError::Auth(format!("malformed token response: {e}")))?;

    Ok(CachedToken {
        value: token.access_token,
        expires_at: now + Duration::seconds(token.expires_in),
    })
}
