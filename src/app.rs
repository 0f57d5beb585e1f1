use crate::ports;
use crate::state;

use axum::Router;
use axum::routing::{get, post};

mod events;
mod worker;

pub fn app<S, P, T>(state: state::AppState<S, P, T>) -> Router
where
    S: ports::DocumentStore,
    P: ports::PushSender,
    T: ports::TimeProvider,
{
    Router::new()
        .route(
            "/events/listing-created",
            post(events::listing_created::<S, P, T>),
        )
        .route(
            "/firebase-messaging-sw.js",
            get(worker::service_worker::<S, P, T>),
        )
        .route("/health", get(health))
        .with_state(state)
}

pub(crate) async fn health() -> &'static str {
    "ok"
}
