use crate::types::listing::{Condition, ListingType};

use serde::{Deserialize, Serialize};

/// A user's standing interest in a catalog entry (`wishlists/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    /// Document id; not part of the stored fields.
    #[serde(skip)]
    pub id: String,
    pub user_uid: String,
    pub book_info_id: String,
    #[serde(default)]
    pub alert_enabled: bool,
    #[serde(default)]
    pub preferred_conditions: Option<Vec<Condition>>,
    #[serde(default)]
    pub preferred_listing_types: Option<Vec<ListingType>>,
    #[serde(default)]
    pub is_notified: bool,
}

impl Wishlist {
    pub fn conditions(&self) -> &[Condition] {
        self.preferred_conditions.as_deref().unwrap_or_default()
    }

    pub fn listing_types(&self) -> &[ListingType] {
        self.preferred_listing_types.as_deref().unwrap_or_default()
    }
}
