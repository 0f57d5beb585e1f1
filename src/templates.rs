use crate::config::WebConfig;

use askama::Template;
use thiserror::Error;

#[derive(Template)]
#[template(path = "firebase-messaging-sw.js", escape = "none")]
pub(crate) struct ServiceWorkerTemplate<'a> {
    pub(crate) sdk_version: &'a str,
    pub(crate) firebase_config: String,
    pub(crate) icon: String,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid firebase sdk version '{0}'")]
    SdkVersion(String),
    #[error("failed to encode worker config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to render service worker: {0}")]
    Render(#[from] askama::Error),
}

/// Renders the background push worker; config values are embedded as JSON literals.
pub fn render_service_worker(web: &WebConfig) -> Result<String, TemplateError> {
    let version = web.sdk_version.trim();
    if version.is_empty() || !version.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
        return Err(TemplateError::SdkVersion(web.sdk_version.clone()));
    }
    let template = ServiceWorkerTemplate {
        sdk_version: version,
        firebase_config: serde_json::to_string_pretty(&web.firebase)?,
        icon: serde_json::to_string(&web.icon)?,
    };
    Ok(template.render()?)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::config::FirebaseWebConfig;

    fn web_config() -> WebConfig {
        WebConfig {
            firebase: FirebaseWebConfig {
                api_key: "key".to_string(),
                app_id: "1:42:web:abc".to_string(),
                messaging_sender_id: "42".to_string(),
                project_id: "book-bridge".to_string(),
                auth_domain: None,
                storage_bucket: None,
            },
            icon: "/icons/Icon-192.png".to_string(),
            sdk_version: "10.7.0".to_string(),
        }
    }

    #[test]
    fn render_service_worker__should_embed_config_and_icon() {
        // When
        let script = render_service_worker(&web_config()).expect("render");

        // Then
        assert!(script.contains("firebasejs/10.7.0/firebase-messaging-compat.js"));
        assert!(script.contains("\"projectId\": \"book-bridge\""));
        assert!(script.contains("icon: \"/icons/Icon-192.png\""));
        assert!(script.contains("if (!notification) return;"));
    }

    #[test]
    fn render_service_worker__should_escape_string_values() {
        // Given
        let mut config = web_config();
        config.icon = "/icons/\"quoted\".png".to_string();

        // When
        let script = render_service_worker(&config).expect("render");

        // Then
        assert!(script.contains(r#"icon: "/icons/\"quoted\".png""#));
    }

    #[test]
    fn render_service_worker__should_reject_unexpected_sdk_version() {
        let mut config = web_config();
        config.sdk_version = "10.7.0'); alert('x".to_string();

        assert!(matches!(
            render_service_worker(&config),
            Err(TemplateError::SdkVersion(_))
        ));
    }
}
