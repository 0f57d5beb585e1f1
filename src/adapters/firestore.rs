use crate::adapters::oauth::{OAuthError, TokenSource};
use crate::ports;
use crate::types::notification::NotificationRecord;
use crate::types::user::UserDocument;
use crate::types::wishlist::Wishlist;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::pin::Pin;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_DATABASE: &str = "(default)";

pub const WISHLISTS: &str = "wishlists";
pub const NOTIFICATIONS: &str = "notifications";
pub const USERS: &str = "users";

#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error(transparent)]
    Auth(#[from] OAuthError),
    #[error("firestore request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("firestore returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode document '{name}': {source}")]
    Decode {
        name: String,
        source: serde_json::Error,
    },
    #[error("failed to encode timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// A Firestore `Value`, tagged by its JSON key (`stringValue`, `mapValue`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(Option<String>),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    fn string(value: impl Into<String>) -> Self {
        Value::StringValue(value.into())
    }

    /// Plain JSON view used to deserialize documents into domain types.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::NullValue(_) => serde_json::Value::Null,
            Value::BooleanValue(value) => serde_json::Value::Bool(value),
            Value::IntegerValue(raw) => match raw.parse::<i64>() {
                Ok(value) => serde_json::Value::from(value),
                Err(_) => serde_json::Value::String(raw),
            },
            Value::DoubleValue(value) => serde_json::Number::from_f64(value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::TimestampValue(raw)
            | Value::StringValue(raw)
            | Value::BytesValue(raw)
            | Value::ReferenceValue(raw) => serde_json::Value::String(raw),
            Value::GeoPointValue(raw) => raw,
            Value::ArrayValue(array) => {
                serde_json::Value::Array(array.values.into_iter().map(Value::into_json).collect())
            }
            Value::MapValue(map) => fields_into_json(map.fields),
        }
    }
}

fn fields_into_json(fields: BTreeMap<String, Value>) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key, value.into_json()))
            .collect(),
    )
}

impl Document {
    /// Last path segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, FirestoreError> {
        let name = self.name;
        serde_json::from_value(fields_into_json(self.fields))
            .map_err(|source| FirestoreError::Decode { name, source })
    }
}

pub(crate) fn notification_fields(
    record: &NotificationRecord,
) -> Result<BTreeMap<String, Value>, FirestoreError> {
    let data = BTreeMap::from([
        ("type".to_string(), Value::string(&record.data.kind)),
        ("id".to_string(), Value::string(&record.data.id)),
        (
            "bookInfoId".to_string(),
            Value::string(&record.data.book_info_id),
        ),
    ]);
    Ok(BTreeMap::from([
        ("targetUid".to_string(), Value::string(&record.target_uid)),
        ("type".to_string(), Value::string(&record.kind)),
        ("title".to_string(), Value::string(&record.title)),
        ("body".to_string(), Value::string(&record.body)),
        ("data".to_string(), Value::MapValue(MapValue { fields: data })),
        ("isRead".to_string(), Value::BooleanValue(record.is_read)),
        (
            "createdAt".to_string(),
            Value::TimestampValue(record.created_at.format(&Rfc3339)?),
        ),
    ]))
}

#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<Document>,
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
}

/// Firestore REST v1 adapter.
#[derive(Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    tokens: TokenSource,
    base_url: String,
    database: String,
}

impl FirestoreStore {
    pub fn new(client: reqwest::Client, tokens: TokenSource, project_id: &str) -> Self {
        Self {
            client,
            tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
            database: database_path(project_id, DEFAULT_DATABASE),
        }
    }

    /// Points the adapter at another endpoint, e.g. `http://localhost:8080/v1` for the emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_database(mut self, project_id: &str, database_id: &str) -> Self {
        self.database = database_path(project_id, database_id);
        self
    }

    fn documents_url(&self) -> String {
        format!("{}/{}/documents", self.base_url, self.database)
    }

    async fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FirestoreError> {
        let token = self.tokens.access_token().await?;
        let response = builder.bearer_auth(token).send().await?;
        Ok(response)
    }

    async fn query_wishlists(&self, book_info_id: &str) -> Result<Vec<Wishlist>, FirestoreError> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": WISHLISTS }],
                "where": {
                    "compositeFilter": {
                        "op": "AND",
                        "filters": [
                            {
                                "fieldFilter": {
                                    "field": { "fieldPath": "bookInfoId" },
                                    "op": "EQUAL",
                                    "value": { "stringValue": book_info_id }
                                }
                            },
                            {
                                "fieldFilter": {
                                    "field": { "fieldPath": "alertEnabled" },
                                    "op": "EQUAL",
                                    "value": { "booleanValue": true }
                                }
                            }
                        ]
                    }
                }
            }
        });
        let url = format!("{}:runQuery", self.documents_url());
        let response = self.authorized(self.client.post(url).json(&body)).await?;
        let items: Vec<RunQueryItem> = ensure_success(response).await?.json().await?;
        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|document| -> Result<Wishlist, FirestoreError> {
                let id = document.id().to_string();
                let mut wishlist: Wishlist = document.decode()?;
                wishlist.id = id;
                Ok(wishlist)
            })
            .collect()
    }

    async fn set_notified(&self, wishlist_id: &str) -> Result<(), FirestoreError> {
        let url = format!("{}/{}/{}", self.documents_url(), WISHLISTS, wishlist_id);
        let body = json!({ "fields": { "isNotified": { "booleanValue": true } } });
        let request = self
            .client
            .patch(url)
            .query(&[
                ("updateMask.fieldPaths", "isNotified"),
                ("currentDocument.exists", "true"),
            ])
            .json(&body);
        ensure_success(self.authorized(request).await?).await?;
        Ok(())
    }

    async fn create_notification(
        &self,
        record: &NotificationRecord,
    ) -> Result<String, FirestoreError> {
        let url = format!("{}/{}", self.documents_url(), NOTIFICATIONS);
        let body = json!({ "fields": notification_fields(record)? });
        let response = self.authorized(self.client.post(url).json(&body)).await?;
        let document: Document = ensure_success(response).await?.json().await?;
        Ok(document.id().to_string())
    }

    async fn user_token(&self, uid: &str) -> Result<Option<String>, FirestoreError> {
        let url = format!("{}/{}/{}", self.documents_url(), USERS, uid);
        let request = self
            .client
            .get(url)
            .query(&[("mask.fieldPaths", "fcmToken")]);
        let response = self.authorized(request).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: Document = ensure_success(response).await?.json().await?;
        let user: UserDocument = document.decode()?;
        Ok(user.device_token().map(str::to_string))
    }
}

fn database_path(project_id: &str, database_id: &str) -> String {
    format!("projects/{project_id}/databases/{database_id}")
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, FirestoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => format!("{} {}", envelope.error.status, envelope.error.message),
        Err(_) => body,
    };
    Err(FirestoreError::Status {
        status: status.as_u16(),
        message,
    })
}

impl ports::DocumentStore for FirestoreStore {
    type Error = FirestoreError;
    type Fut<'a, T>
        = Pin<Box<dyn Future<Output = Result<T, Self::Error>> + Send + 'a>>
    where
        Self: 'a,
        T: Send + 'a;

    fn alerting_wishlists<'a>(&'a self, book_info_id: &'a str) -> Self::Fut<'a, Vec<Wishlist>> {
        Box::pin(self.query_wishlists(book_info_id))
    }

    fn mark_notified<'a>(&'a self, wishlist_id: &'a str) -> Self::Fut<'a, ()> {
        Box::pin(self.set_notified(wishlist_id))
    }

    fn insert_notification<'a>(
        &'a self,
        record: &'a NotificationRecord,
    ) -> Self::Fut<'a, String> {
        Box::pin(self.create_notification(record))
    }

    fn device_token<'a>(&'a self, uid: &'a str) -> Self::Fut<'a, Option<String>> {
        Box::pin(self.user_token(uid))
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::types::listing::{Condition, ListingType};
    use crate::types::notification::NotificationData;
    use time::OffsetDateTime;

    #[test]
    fn document__should_decode_wishlist_fields() {
        // Given
        let raw = json!({
            "name": "projects/p/databases/(default)/documents/wishlists/W1",
            "fields": {
                "userUid": { "stringValue": "U2" },
                "bookInfoId": { "stringValue": "C1" },
                "alertEnabled": { "booleanValue": true },
                "preferredConditions": {
                    "arrayValue": { "values": [{ "stringValue": "good" }] }
                },
                "preferredListingTypes": { "arrayValue": {} },
                "createdAt": { "timestampValue": "2026-01-01T00:00:00Z" },
                "priority": { "integerValue": "3" }
            },
            "createTime": "2026-01-01T00:00:00Z"
        });
        let document: Document = serde_json::from_value(raw).expect("parse document");

        // When
        let id = document.id().to_string();
        let wishlist: Wishlist = document.decode().expect("decode wishlist");

        // Then
        assert_eq!(id, "W1");
        assert_eq!(wishlist.user_uid, "U2");
        assert_eq!(wishlist.book_info_id, "C1");
        assert!(wishlist.alert_enabled);
        assert_eq!(wishlist.conditions(), &[Condition::Good]);
        assert!(wishlist.listing_types().is_empty());
        assert!(!wishlist.is_notified);
    }

    #[test]
    fn document__should_report_decode_errors_with_name() {
        // Given
        let document = Document {
            name: "projects/p/databases/(default)/documents/wishlists/W9".to_string(),
            fields: BTreeMap::from([("userUid".to_string(), Value::BooleanValue(true))]),
        };

        // When
        let result = document.decode::<Wishlist>();

        // Then
        match result {
            Err(FirestoreError::Decode { name, .. }) => assert!(name.ends_with("/W9")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn notification_fields__should_encode_typed_values() {
        // Given
        let record = NotificationRecord {
            target_uid: "U2".to_string(),
            kind: "wishlist_match".to_string(),
            title: "Title".to_string(),
            body: "Body".to_string(),
            data: NotificationData {
                kind: "wishlist_match".to_string(),
                id: "B1".to_string(),
                book_info_id: "C1".to_string(),
            },
            is_read: false,
            created_at: OffsetDateTime::parse("2026-03-01T10:00:00Z", &Rfc3339)
                .expect("parse time"),
        };

        // When
        let fields = notification_fields(&record).expect("encode");
        let encoded = serde_json::to_value(&fields).expect("serialize");

        // Then
        assert_eq!(
            encoded,
            json!({
                "body": { "stringValue": "Body" },
                "createdAt": { "timestampValue": "2026-03-01T10:00:00Z" },
                "data": { "mapValue": { "fields": {
                    "bookInfoId": { "stringValue": "C1" },
                    "id": { "stringValue": "B1" },
                    "type": { "stringValue": "wishlist_match" }
                } } },
                "isRead": { "booleanValue": false },
                "targetUid": { "stringValue": "U2" },
                "title": { "stringValue": "Title" },
                "type": { "stringValue": "wishlist_match" }
            })
        );
    }

    #[test]
    fn value__should_convert_integers_and_maps_to_json() {
        let value = Value::MapValue(MapValue {
            fields: BTreeMap::from([
                ("count".to_string(), Value::IntegerValue("42".to_string())),
                ("type".to_string(), Value::string(ListingType::Sale.as_str())),
            ]),
        });

        assert_eq!(value.into_json(), json!({ "count": 42, "type": "sale" }));
    }

    #[test]
    fn with_base_url__should_build_emulator_urls() {
        let store = FirestoreStore::new(reqwest::Client::new(), TokenSource::fixed("owner"), "demo")
            .with_base_url("http://localhost:8080/v1/");

        assert_eq!(
            store.documents_url(),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents"
        );
    }
}
