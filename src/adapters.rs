use std::convert::Infallible;

use time::OffsetDateTime;

use crate::ports;
use crate::types::push::PushMessage;

pub mod fcm;
pub mod firestore;
pub mod memory;
pub mod oauth;

pub use fcm::FcmSender;
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use oauth::{ServiceAccountKey, TokenSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Dry-run sender for local runs without messaging credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPushSender;

impl ports::PushSender for LogPushSender {
    type Error = Infallible;
    type Fut<'a>
        = std::future::Ready<Result<(), Self::Error>>
    where
        Self: 'a;

    fn send<'a>(&'a self, message: &'a PushMessage) -> Self::Fut<'a> {
        tracing::info!(
            token = %message.token,
            title = %message.notification.title,
            body = %message.notification.body,
            "push message (dry run)"
        );
        std::future::ready(Ok(()))
    }
}
