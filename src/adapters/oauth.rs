use jwt_simple::prelude::{Claims, Duration, RS256KeyPair, RSAKeyPairLike};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECS: u64 = 3600;
const REFRESH_MARGIN: time::Duration = time::Duration::seconds(60);

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("failed to read service account key {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid service account key: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid service account private key: {0}")]
    InvalidKey(String),
    #[error("failed to sign token assertion: {0}")]
    Sign(String),
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token request rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Fields of a Google service account JSON key used for token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> Result<Self, OAuthError> {
        let contents = std::fs::read_to_string(path).map_err(|source| OAuthError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Bearer tokens for Google APIs, shared by the store and the sender.
#[derive(Clone)]
pub struct TokenSource {
    inner: Arc<Inner>,
}

enum Inner {
    ServiceAccount(ServiceAccountTokens),
    Fixed(String),
}

struct ServiceAccountTokens {
    key: ServiceAccountKey,
    key_pair: RS256KeyPair,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: OffsetDateTime,
}

#[derive(Serialize, Deserialize)]
struct ScopeClaim {
    scope: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl TokenSource {
    pub fn service_account(key: ServiceAccountKey, client: reqwest::Client) -> Result<Self, OAuthError> {
        let mut key_pair = RS256KeyPair::from_pem(&key.private_key)
            .map_err(|err| OAuthError::InvalidKey(err.to_string()))?;
        if let Some(key_id) = key.private_key_id.as_deref() {
            key_pair = key_pair.with_key_id(key_id);
        }
        Ok(Self {
            inner: Arc::new(Inner::ServiceAccount(ServiceAccountTokens {
                key,
                key_pair,
                client,
                cached: Mutex::new(None),
            })),
        })
    }

    /// A constant token, e.g. `owner` for the Firestore emulator.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner::Fixed(token.into())),
        }
    }

    pub async fn access_token(&self) -> Result<String, OAuthError> {
        match self.inner.as_ref() {
            Inner::ServiceAccount(tokens) => tokens.access_token().await,
            Inner::Fixed(token) => Ok(token.clone()),
        }
    }
}

impl ServiceAccountTokens {
    async fn access_token(&self) -> Result<String, OAuthError> {
        let mut cached = self.cached.lock().await;
        let now = OffsetDateTime::now_utc();
        if let Some(token) = cached.as_ref()
            && token.expires_at - REFRESH_MARGIN > now
        {
            return Ok(token.value.clone());
        }

        let assertion = self.assertion()?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let token: TokenResponse = response.json().await?;
        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "refreshed access token"
        );
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: now + time::Duration::seconds(token.expires_in),
        });
        Ok(token.access_token)
    }

    fn assertion(&self) -> Result<String, OAuthError> {
        let claims = Claims::with_custom_claims(
            ScopeClaim {
                scope: SCOPE.to_string(),
            },
            Duration::from_secs(ASSERTION_TTL_SECS),
        )
        .with_issuer(&self.key.client_email)
        .with_audience(&self.key.token_uri);
        self.key_pair
            .sign(claims)
            .map_err(|err| OAuthError::Sign(err.to_string()))
    }
}
