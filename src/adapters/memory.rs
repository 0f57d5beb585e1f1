use crate::ports;
use crate::types::notification::NotificationRecord;
use crate::types::user::UserDocument;
use crate::types::wishlist::Wishlist;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid seed file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("wishlist '{0}' does not exist")]
    MissingWishlist(String),
}

/// In-process collections, seeded from TOML:
///
/// ```toml
/// [wishlists.W1]
/// userUid = "U2"
/// bookInfoId = "C1"
/// alertEnabled = true
///
/// [users.U2]
/// fcmToken = "token"
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
}

#[derive(Debug, Default, Deserialize)]
struct Collections {
    #[serde(default)]
    wishlists: BTreeMap<String, Wishlist>,
    #[serde(default)]
    users: BTreeMap<String, UserDocument>,
    #[serde(skip)]
    notifications: Vec<(String, NotificationRecord)>,
    #[serde(skip)]
    calls: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, MemoryStoreError> {
        let contents = std::fs::read_to_string(path).map_err(|source| MemoryStoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, MemoryStoreError> {
        let mut collections: Collections = toml::from_str(contents)?;
        for (id, wishlist) in collections.wishlists.iter_mut() {
            wishlist.id = id.clone();
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(collections)),
        })
    }

    pub fn insert_wishlist(&self, wishlist: Wishlist) {
        let mut guard = self.inner.lock().expect("memory store lock");
        guard.wishlists.insert(wishlist.id.clone(), wishlist);
    }

    pub fn set_device_token(&self, uid: &str, token: &str) {
        let mut guard = self.inner.lock().expect("memory store lock");
        guard.users.insert(
            uid.to_string(),
            UserDocument {
                fcm_token: Some(token.to_string()),
            },
        );
    }

    pub fn wishlist(&self, id: &str) -> Option<Wishlist> {
        let guard = self.inner.lock().expect("memory store lock");
        guard.wishlists.get(id).cloned()
    }

    pub fn notifications(&self) -> Vec<NotificationRecord> {
        let guard = self.inner.lock().expect("memory store lock");
        guard
            .notifications
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Number of port calls served so far.
    pub fn calls(&self) -> usize {
        self.inner.lock().expect("memory store lock").calls
    }

    fn with<T>(&self, f: impl FnOnce(&mut Collections) -> T) -> T {
        let mut guard = self.inner.lock().expect("memory store lock");
        guard.calls += 1;
        f(&mut *guard)
    }
}

impl ports::DocumentStore for MemoryStore {
    type Error = MemoryStoreError;
    type Fut<'a, T>
        = std::future::Ready<Result<T, Self::Error>>
    where
        Self: 'a,
        T: Send + 'a;

    fn alerting_wishlists<'a>(&'a self, book_info_id: &'a str) -> Self::Fut<'a, Vec<Wishlist>> {
        let wishlists = self.with(|collections| {
            collections
                .wishlists
                .values()
                .filter(|wishlist| wishlist.book_info_id == book_info_id && wishlist.alert_enabled)
                .cloned()
                .collect()
        });
        std::future::ready(Ok(wishlists))
    }

    fn mark_notified<'a>(&'a self, wishlist_id: &'a str) -> Self::Fut<'a, ()> {
        let result = self.with(|collections| match collections.wishlists.get_mut(wishlist_id) {
            Some(wishlist) => {
                wishlist.is_notified = true;
                Ok(())
            }
            None => Err(MemoryStoreError::MissingWishlist(wishlist_id.to_string())),
        });
        std::future::ready(result)
    }

    fn insert_notification<'a>(
        &'a self,
        record: &'a NotificationRecord,
    ) -> Self::Fut<'a, String> {
        let id = self.with(|collections| {
            let id = format!("notification-{}", collections.notifications.len() + 1);
            collections.notifications.push((id.clone(), record.clone()));
            id
        });
        std::future::ready(Ok(id))
    }

    fn device_token<'a>(&'a self, uid: &'a str) -> Self::Fut<'a, Option<String>> {
        let token = self.with(|collections| {
            collections
                .users
                .get(uid)
                .and_then(UserDocument::device_token)
                .map(str::to_string)
        });
        std::future::ready(Ok(token))
    }
}
