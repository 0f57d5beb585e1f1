use serde::{Deserialize, Serialize};

/// The part of `users/{uid}` the notifier reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(default)]
    pub fcm_token: Option<String>,
}

impl UserDocument {
    pub fn device_token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn device_token__should_skip_missing_and_empty_tokens() {
        // Given
        let missing: UserDocument = serde_json::from_str(r#"{"fcmToken": null}"#).expect("parse user");
        let empty: UserDocument = serde_json::from_str(r#"{"fcmToken": ""}"#).expect("parse user");
        let present: UserDocument = serde_json::from_str(r#"{"fcmToken": "t-1"}"#).expect("parse user");

        // Then
        assert_eq!(missing.device_token(), None);
        assert_eq!(empty.device_token(), None);
        assert_eq!(present.device_token(), Some("t-1"));
    }
}
