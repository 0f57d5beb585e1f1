use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single offered copy of a book, as stored under `books/{bookId}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default)]
    pub status: Option<ListingStatus>,
    #[serde(default)]
    pub book_info_id: Option<String>,
    #[serde(default)]
    pub owner_uid: Option<String>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub listing_type: Option<ListingType>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Listing {
    pub fn is_available(&self) -> bool {
        matches!(self.status, Some(ListingStatus::Available))
    }

    /// Catalog id used for matching; an empty id counts as missing.
    pub fn catalog_id(&self) -> Option<&str> {
        self.book_info_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Listing type used for filtering and labels; unset or empty means exchange.
    pub fn effective_listing_type(&self) -> ListingType {
        match &self.listing_type {
            None => ListingType::Exchange,
            Some(ListingType::Other(raw)) if raw.is_empty() => ListingType::Exchange,
            Some(listing_type) => listing_type.clone(),
        }
    }
}

/// Payload of a created-document event for the listing collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingCreatedEvent {
    pub id: String,
    #[serde(default)]
    pub data: Option<Listing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListingStatus {
    Available,
    Other(String),
}

impl From<String> for ListingStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "available" => ListingStatus::Available,
            _ => ListingStatus::Other(value),
        }
    }
}

impl From<ListingStatus> for String {
    fn from(value: ListingStatus) -> Self {
        match value {
            ListingStatus::Available => "available".to_string(),
            ListingStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Best,
    Good,
    Fair,
    Poor,
    Other(String),
}

impl Condition {
    pub fn as_str(&self) -> &str {
        match self {
            Condition::Best => "best",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Poor => "poor",
            Condition::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Condition::Best => "최상",
            Condition::Good => "상",
            Condition::Fair => "중",
            Condition::Poor => "하",
            Condition::Other(raw) => raw,
        }
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        match value.as_str() {
            "best" => Condition::Best,
            "good" => Condition::Good,
            "fair" => Condition::Fair,
            "poor" => Condition::Poor,
            _ => Condition::Other(value),
        }
    }
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        Condition::from(value.to_string())
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        match value {
            Condition::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListingType {
    Exchange,
    Sale,
    Both,
    Other(String),
}

impl ListingType {
    pub fn as_str(&self) -> &str {
        match self {
            ListingType::Exchange => "exchange",
            ListingType::Sale => "sale",
            ListingType::Both => "both",
            ListingType::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ListingType::Exchange => "교환",
            ListingType::Sale => "판매",
            ListingType::Both => "교환/판매",
            ListingType::Other(raw) => raw,
        }
    }
}

impl From<String> for ListingType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "exchange" => ListingType::Exchange,
            "sale" => ListingType::Sale,
            "both" => ListingType::Both,
            _ => ListingType::Other(value),
        }
    }
}

impl From<&str> for ListingType {
    fn from(value: &str) -> Self {
        ListingType::from(value.to_string())
    }
}

impl From<ListingType> for String {
    fn from(value: ListingType) -> Self {
        match value {
            ListingType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn listing__should_deserialize_store_field_names() {
        // Given
        let raw = r#"{
            "status": "available",
            "bookInfoId": "C1",
            "ownerUid": "U1",
            "condition": "good",
            "listingType": "sale",
            "title": "Book A"
        }"#;

        // When
        let listing: Listing = serde_json::from_str(raw).expect("parse listing");

        // Then
        assert!(listing.is_available());
        assert_eq!(listing.catalog_id(), Some("C1"));
        assert_eq!(listing.owner_uid.as_deref(), Some("U1"));
        assert_eq!(listing.condition, Some(Condition::Good));
        assert_eq!(listing.listing_type, Some(ListingType::Sale));
        assert_eq!(listing.title, "Book A");
    }

    #[test]
    fn listing__should_keep_unknown_enum_values_raw() {
        // Given
        let raw = r#"{"status": "sold", "condition": "mint", "listingType": "rent"}"#;

        // When
        let listing: Listing = serde_json::from_str(raw).expect("parse listing");

        // Then
        assert!(!listing.is_available());
        assert_eq!(listing.condition, Some(Condition::Other("mint".to_string())));
        assert_eq!(listing.condition.as_ref().map(Condition::label), Some("mint"));
        assert_eq!(
            listing.listing_type.as_ref().map(ListingType::label),
            Some("rent")
        );
    }

    #[test]
    fn effective_listing_type__should_default_to_exchange() {
        let listing = Listing::default();

        assert_eq!(listing.effective_listing_type(), ListingType::Exchange);
    }

    #[test]
    fn catalog_id__should_only_treat_empty_as_missing() {
        let empty = Listing {
            book_info_id: Some(String::new()),
            ..Listing::default()
        };
        let blank = Listing {
            book_info_id: Some("  ".to_string()),
            ..Listing::default()
        };

        assert_eq!(empty.catalog_id(), None);
        assert_eq!(blank.catalog_id(), Some("  "));
    }

    #[test]
    fn effective_listing_type__should_treat_empty_as_exchange() {
        let listing: Listing =
            serde_json::from_str(r#"{"listingType": ""}"#).expect("parse listing");

        assert_eq!(listing.effective_listing_type(), ListingType::Exchange);
    }

    #[test]
    fn listing_created_event__should_accept_null_title() {
        // Given
        let raw = r#"{
            "id": "B1",
            "data": {"status": "available", "bookInfoId": "C1", "title": null}
        }"#;

        // When
        let event: ListingCreatedEvent = serde_json::from_str(raw).expect("parse event");

        // Then
        let listing = event.data.expect("listing data");
        assert_eq!(listing.title, "");
        assert_eq!(listing.catalog_id(), Some("C1"));
    }

    #[test]
    fn listing_created_event__should_accept_missing_data() {
        let event: ListingCreatedEvent =
            serde_json::from_str(r#"{"id": "B1"}"#).expect("parse event");

        assert_eq!(event.id, "B1");
        assert!(event.data.is_none());
    }
}
