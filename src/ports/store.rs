use crate::types::notification::NotificationRecord;
use crate::types::wishlist::Wishlist;

/// The document collections the notifier reads and writes.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;
    type Fut<'a, T>: Future<Output = Result<T, Self::Error>> + Send + 'a
    where
        Self: 'a,
        T: Send + 'a;

    /// Wishlists with the given `bookInfoId` and `alertEnabled == true`.
    fn alerting_wishlists<'a>(&'a self, book_info_id: &'a str) -> Self::Fut<'a, Vec<Wishlist>>;

    /// Sets `isNotified` on an existing wishlist document.
    fn mark_notified<'a>(&'a self, wishlist_id: &'a str) -> Self::Fut<'a, ()>;

    /// Inserts a notification record and returns the generated id.
    fn insert_notification<'a>(
        &'a self,
        record: &'a NotificationRecord,
    ) -> Self::Fut<'a, String>;

    /// Registered push token of a user; `None` when the user or the token is absent.
    fn device_token<'a>(&'a self, uid: &'a str) -> Self::Fut<'a, Option<String>>;
}
