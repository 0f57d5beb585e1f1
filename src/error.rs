use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that abort a whole invocation and surface to the trigger.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("wishlist query for '{book_info_id}' failed: {source}")]
    Query {
        book_info_id: String,
        source: BoxError,
    },
    #[error("notification insert for user '{target_uid}' failed: {source}")]
    InsertNotification { target_uid: String, source: BoxError },
    #[error("marking wishlist '{wishlist_id}' as notified failed: {source}")]
    MarkNotified { wishlist_id: String, source: BoxError },
}

/// Push failures; logged per subscription and never propagated.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("device token lookup failed: {0}")]
    TokenLookup(#[source] BoxError),
    #[error("push send failed: {0}")]
    Send(#[source] BoxError),
}
