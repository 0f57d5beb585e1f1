use crate::types::listing::{Listing, ListingType};
use crate::types::notification::{NotificationData, NotificationRecord, WISHLIST_MATCH};
use crate::types::push::PushMessage;
use crate::types::wishlist::Wishlist;

use std::collections::BTreeMap;
use time::OffsetDateTime;

pub const MATCH_TITLE: &str = "원하시던 책이 등록되었어요!";

const MISSING_LABEL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OwnListing,
    Condition,
    ListingType,
    AlreadyNotified,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub skip_notified: bool,
}

/// Applies the per-wishlist filters in order and reports the first one that fails.
pub fn check(
    listing: &Listing,
    wishlist: &Wishlist,
    options: MatchOptions,
) -> Result<(), Rejection> {
    if options.skip_notified && wishlist.is_notified {
        return Err(Rejection::AlreadyNotified);
    }

    if listing.owner_uid.as_deref() == Some(wishlist.user_uid.as_str()) {
        return Err(Rejection::OwnListing);
    }

    let conditions = wishlist.conditions();
    if !conditions.is_empty() {
        let accepted = listing
            .condition
            .as_ref()
            .is_some_and(|condition| conditions.contains(condition));
        if !accepted {
            return Err(Rejection::Condition);
        }
    }

    let listing_types = wishlist.listing_types();
    if !listing_types.is_empty() {
        let effective = listing.effective_listing_type();
        let accepted = effective == ListingType::Both
            || listing_types.contains(&ListingType::Both)
            || listing_types.contains(&effective);
        if !accepted {
            return Err(Rejection::ListingType);
        }
    }

    Ok(())
}

pub fn is_eligible(listing: &Listing, wishlist: &Wishlist) -> bool {
    check(listing, wishlist, MatchOptions::default()).is_ok()
}

pub fn match_body(listing: &Listing) -> String {
    let condition = listing
        .condition
        .as_ref()
        .map(|condition| condition.label())
        .unwrap_or(MISSING_LABEL);
    let listing_type = listing.effective_listing_type();
    format!(
        "\"{}\" ({}, {}) - 지금 바로 확인해보세요",
        listing.title,
        condition,
        listing_type.label()
    )
}

/// Everything written or sent for one matched wishlist.
#[derive(Debug, Clone)]
pub struct Match {
    pub wishlist_id: String,
    pub record: NotificationRecord,
}

impl Match {
    pub fn compose(
        listing: &Listing,
        listing_id: &str,
        book_info_id: &str,
        wishlist: &Wishlist,
        now: OffsetDateTime,
    ) -> Self {
        let record = NotificationRecord {
            target_uid: wishlist.user_uid.clone(),
            kind: WISHLIST_MATCH.to_string(),
            title: MATCH_TITLE.to_string(),
            body: match_body(listing),
            data: NotificationData {
                kind: WISHLIST_MATCH.to_string(),
                id: listing_id.to_string(),
                book_info_id: book_info_id.to_string(),
            },
            is_read: false,
            created_at: now,
        };
        Self {
            wishlist_id: wishlist.id.clone(),
            record,
        }
    }

    pub fn target_uid(&self) -> &str {
        &self.record.target_uid
    }

    pub fn push_message(&self, token: String) -> PushMessage {
        let data = BTreeMap::from([
            ("type".to_string(), self.record.data.kind.clone()),
            ("id".to_string(), self.record.data.id.clone()),
        ]);
        PushMessage::alert(
            token,
            self.record.title.clone(),
            self.record.body.clone(),
            data,
        )
    }
}
