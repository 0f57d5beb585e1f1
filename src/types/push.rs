use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outbound message in the FCM HTTP v1 `message` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub token: String,
    pub notification: PushNotification,
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AndroidPriority {
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidConfig {
    pub priority: AndroidPriority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aps {
    pub sound: String,
    pub badge: u32,
}

impl PushMessage {
    /// High priority on Android, default sound and a badge of 1 on Apple devices.
    pub fn alert(token: String, title: String, body: String, data: BTreeMap<String, String>) -> Self {
        Self {
            token,
            notification: PushNotification { title, body },
            data,
            android: AndroidConfig {
                priority: AndroidPriority::High,
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        sound: "default".to_string(),
                        badge: 1,
                    },
                },
            },
        }
    }
}
