use crate::adapters::oauth::{OAuthError, TokenSource};
use crate::ports;
use crate::types::push::PushMessage;

use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://fcm.googleapis.com/v1";

#[derive(Debug, Error)]
pub enum FcmError {
    #[error(transparent)]
    Auth(#[from] OAuthError),
    #[error("fcm request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("fcm rejected message ({status} {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },
}

impl FcmError {
    /// The token is no longer registered to an app instance.
    pub fn is_stale_token(&self) -> bool {
        matches!(self, FcmError::Rejected { code, .. } if code == "UNREGISTERED")
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a PushMessage,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

/// Firebase Cloud Messaging HTTP v1 sender.
#[derive(Clone)]
pub struct FcmSender {
    client: reqwest::Client,
    tokens: TokenSource,
    send_url: String,
}

impl FcmSender {
    pub fn new(client: reqwest::Client, tokens: TokenSource, project_id: &str) -> Self {
        Self {
            client,
            tokens,
            send_url: send_url(DEFAULT_BASE_URL, project_id),
        }
    }

    pub fn with_base_url(mut self, base_url: &str, project_id: &str) -> Self {
        self.send_url = send_url(base_url.trim_end_matches('/'), project_id);
        self
    }

    async fn deliver(&self, message: &PushMessage) -> Result<(), FcmError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(token)
            .json(&SendRequest { message })
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(rejection(status.as_u16(), &body))
    }
}

fn send_url(base_url: &str, project_id: &str) -> String {
    format!("{base_url}/projects/{project_id}/messages:send")
}

fn rejection(status: u16, body: &str) -> FcmError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope
                .error
                .details
                .into_iter()
                .find_map(|detail| detail.error_code)
                .unwrap_or(envelope.error.status);
            FcmError::Rejected {
                status,
                code,
                message: envelope.error.message,
            }
        }
        Err(_) => FcmError::Rejected {
            status,
            code: String::new(),
            message: body.to_string(),
        },
    }
}

impl ports::PushSender for FcmSender {
    type Error = FcmError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, message: &'a PushMessage) -> Self::Fut<'a> {
        Box::pin(self.deliver(message))
    }
}
