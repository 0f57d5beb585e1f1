use crate::notifier::WishlistNotifier;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState<S, P, T> {
    pub notifier: Arc<WishlistNotifier<S, P, T>>,
    /// Rendered background worker script, when a web config is loaded.
    pub service_worker: Option<Arc<str>>,
}
