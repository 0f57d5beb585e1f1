use crate::notifier::Outcome;
use crate::ports;
use crate::state;
use crate::types::listing::ListingCreatedEvent;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

/// Trigger endpoint for created listings. A 500 asks the caller to redeliver.
pub(crate) async fn listing_created<S, P, T>(
    State(state): State<state::AppState<S, P, T>>,
    Json(event): Json<ListingCreatedEvent>,
) -> Result<Json<Outcome>, (StatusCode, Json<ErrorResponse>)>
where
    S: ports::DocumentStore,
    P: ports::PushSender,
    T: ports::TimeProvider,
{
    match state.notifier.on_listing_created(&event).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(err) => {
            tracing::error!(listing_id = %event.id, error = %err, "listing event failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            ))
        }
    }
}
