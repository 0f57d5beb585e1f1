use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const WISHLIST_MATCH: &str = "wishlist_match";

/// Durable feed entry written to `notifications/{auto}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub target_uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub body: String,
    pub data: NotificationData,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub book_info_id: String,
}
