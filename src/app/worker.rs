use crate::state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

pub(crate) async fn service_worker<S, P, T>(State(state): State<state::AppState<S, P, T>>) -> Response
where
    S: Clone + Send + Sync + 'static,
    P: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    match state.service_worker {
        Some(script) => (
            [
                (CONTENT_TYPE, "application/javascript"),
                (CACHE_CONTROL, "no-cache"),
            ],
            script.to_string(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
