use crate::error::{DispatchError, NotifyError};
use crate::matching::{self, Match, MatchOptions};
use crate::ports;
use crate::types::listing::ListingCreatedEvent;

mod tasks;

use serde::Serialize;
use tasks::TaskSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoData,
    NotAvailable,
    NoCatalogId,
    NoWishlists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Skipped { reason: SkipReason },
    Processed { candidates: usize, matched: usize },
}

/// Reacts to newly created listings by notifying matching wishlist owners.
#[derive(Debug, Clone)]
pub struct WishlistNotifier<S, P, T> {
    store: S,
    sender: P,
    time: T,
    options: MatchOptions,
}

impl<S, P, T> WishlistNotifier<S, P, T>
where
    S: ports::DocumentStore,
    P: ports::PushSender,
    T: ports::TimeProvider,
{
    pub fn new(store: S, sender: P, time: T) -> Self {
        Self {
            store,
            sender,
            time,
            options: MatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Processes one created-listing event.
    ///
    /// Notification inserts and wishlist updates for every match run
    /// concurrently and are joined once; the first of them to fail is
    /// returned after all have settled. Push delivery failures are logged
    /// and never fail the call.
    pub async fn on_listing_created(
        &self,
        event: &ListingCreatedEvent,
    ) -> Result<Outcome, NotifyError> {
        let Some(listing) = event.data.as_ref() else {
            debug!(listing_id = %event.id, "event carries no listing data");
            return Ok(skipped(SkipReason::NoData));
        };
        if !listing.is_available() {
            debug!(listing_id = %event.id, "listing is not available");
            return Ok(skipped(SkipReason::NotAvailable));
        }
        let Some(book_info_id) = listing.catalog_id() else {
            debug!(listing_id = %event.id, "listing has no catalog id");
            return Ok(skipped(SkipReason::NoCatalogId));
        };

        let wishlists = self
            .store
            .alerting_wishlists(book_info_id)
            .await
            .map_err(|err| NotifyError::Query {
                book_info_id: book_info_id.to_string(),
                source: Box::new(err),
            })?;
        if wishlists.is_empty() {
            debug!(listing_id = %event.id, book_info_id, "no alerting wishlists");
            return Ok(skipped(SkipReason::NoWishlists));
        }

        let now = self.time.now();
        let mut tasks = TaskSet::new();
        let mut matched = 0usize;
        for wishlist in &wishlists {
            if let Err(rejection) = matching::check(listing, wishlist, self.options) {
                debug!(wishlist_id = %wishlist.id, ?rejection, "wishlist skipped");
                continue;
            }
            let found = Match::compose(listing, &event.id, book_info_id, wishlist, now);
            self.schedule(&mut tasks, found);
            matched += 1;
        }

        tasks.join().await?;
        info!(
            listing_id = %event.id,
            book_info_id,
            candidates = wishlists.len(),
            matched,
            "listing processed"
        );
        Ok(Outcome::Processed {
            candidates: wishlists.len(),
            matched,
        })
    }

    fn schedule<'a>(&'a self, tasks: &mut TaskSet<'a, NotifyError>, found: Match) {
        let record = found.record.clone();
        tasks.propagate(async move {
            self.store
                .insert_notification(&record)
                .await
                .map(|_| ())
                .map_err(|err| NotifyError::InsertNotification {
                    target_uid: record.target_uid.clone(),
                    source: Box::new(err),
                })
        });

        let wishlist_id = found.wishlist_id.clone();
        tasks.propagate(async move {
            self.store
                .mark_notified(&wishlist_id)
                .await
                .map_err(|err| NotifyError::MarkNotified {
                    wishlist_id: wishlist_id.clone(),
                    source: Box::new(err),
                })
        });

        let target_uid = found.target_uid().to_string();
        tasks.capture(
            async move { self.dispatch(&found).await },
            move |err: DispatchError| {
                warn!(target_uid = %target_uid, error = %err, "push dispatch failed");
            },
        );
    }

    async fn dispatch(&self, found: &Match) -> Result<(), DispatchError> {
        let token = self
            .store
            .device_token(found.target_uid())
            .await
            .map_err(|err| DispatchError::TokenLookup(Box::new(err)))?;
        let Some(token) = token else {
            debug!(target_uid = %found.target_uid(), "no device token registered");
            return Ok(());
        };
        let message = found.push_message(token);
        self.sender
            .send(&message)
            .await
            .map_err(|err| DispatchError::Send(Box::new(err)))
    }
}

fn skipped(reason: SkipReason) -> Outcome {
    Outcome::Skipped { reason }
}
