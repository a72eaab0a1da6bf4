use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    dto::multiplayer::PollQuery,
    error::{AppError, ServiceError},
    services::poll_service,
    state::{SharedState, fingerprint::ChangeFingerprint, match_state::MatchId, notify::PollOutcome},
};

/// Long-poll route shared by the waiting room and live matches.
pub fn router() -> Router<SharedState> {
    Router::new().route("/multiplayer/updates/{id}", get(poll_updates))
}

/// Wait for the next change of a match; re-issue the request after every answer.
#[utoipa::path(
    get,
    path = "/multiplayer/updates/{id}",
    tag = "updates",
    params(
        ("id" = u32, Path, description = "Match id, or the staging id while waiting"),
        PollQuery
    ),
    responses(
        (status = 200, description = "Something changed", body = ChangeFingerprint),
        (status = 204, description = "No update yet; poll again"),
        (status = 404, description = "Unknown or retired match")
    )
)]
pub async fn poll_updates(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    Query(query): Query<PollQuery>,
) -> Result<Response, AppError> {
    let known = query.known().map_err(ServiceError::from)?;
    let outcome = poll_service::poll(&state, id, known).await?;
    Ok(match outcome {
        PollOutcome::Updated(fingerprint) => Json(fingerprint).into_response(),
        PollOutcome::NoUpdate => StatusCode::NO_CONTENT.into_response(),
    })
}
