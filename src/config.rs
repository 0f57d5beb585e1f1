use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATABASE: &str = "(default)";
const DEFAULT_ICON: &str = "/icons/Icon-192.png";
const DEFAULT_SDK_VERSION: &str = "10.7.0";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub backend: Backend,
    pub skip_notified: bool,
    pub web_config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum Backend {
    Firestore(FirestoreConfig),
    Memory { seed: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub credentials: PathBuf,
    /// Overrides the project of the service account key.
    pub project_id: Option<String>,
    pub database: String,
    pub firestore_url: Option<String>,
    pub fcm_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid web config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Static settings of the browser background worker:
///
/// ```toml
/// icon = "/icons/Icon-192.png"
///
/// [firebase]
/// api_key = "..."
/// app_id = "..."
/// messaging_sender_id = "..."
/// project_id = "..."
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    pub firebase: FirebaseWebConfig,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_sdk_version")]
    pub sdk_version: String,
}

/// Firebase web app options, written to the worker in the SDK's camelCase form.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all(deserialize = "snake_case", serialize = "camelCase"))]
pub struct FirebaseWebConfig {
    pub api_key: String,
    pub app_id: String,
    pub messaging_sender_id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bucket: Option<String>,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

fn default_sdk_version() -> String {
    DEFAULT_SDK_VERSION.to_string()
}

impl WebConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn web_config__should_apply_defaults() {
        // Given
        let raw = r#"
[firebase]
api_key = "key"
app_id = "1:1:web:1"
messaging_sender_id = "1"
project_id = "book-bridge"
"#;

        // When
        let config = WebConfig::from_toml(raw).expect("parse web config");

        // Then
        assert_eq!(config.icon, DEFAULT_ICON);
        assert_eq!(config.sdk_version, DEFAULT_SDK_VERSION);
        assert!(config.firebase.auth_domain.is_none());
    }

    #[test]
    fn firebase_web_config__should_serialize_in_sdk_form() {
        // Given
        let config = FirebaseWebConfig {
            api_key: "key".to_string(),
            app_id: "app".to_string(),
            messaging_sender_id: "42".to_string(),
            project_id: "book-bridge".to_string(),
            auth_domain: Some("book-bridge.firebaseapp.com".to_string()),
            storage_bucket: None,
        };

        // When
        let value = serde_json::to_value(&config).expect("serialize");

        // Then
        assert_eq!(
            value,
            serde_json::json!({
                "apiKey": "key",
                "appId": "app",
                "messagingSenderId": "42",
                "projectId": "book-bridge",
                "authDomain": "book-bridge.firebaseapp.com"
            })
        );
    }

    #[test]
    fn web_config__should_reject_missing_firebase_table() {
        assert!(matches!(
            WebConfig::from_toml("icon = \"/x.png\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
