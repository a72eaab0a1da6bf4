use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::multiplayer::{
        AnswerRequest, AnswerResponse, JoinResponse, MatchSnapshot, PlayerNameRequest,
        PlayerSummary, RemovedResponse, ScoreRequest, StartResponse, UsernameResponse,
    },
    error::AppError,
    services::{match_service, staging_service},
    state::{SharedState, match_state::MatchId},
};

/// Routes of the waiting room and of live matches.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/multiplayer/start", post(start_match))
        .route("/multiplayer/matches/{id}", get(get_match))
        .route("/multiplayer/matches/{id}/players", get(get_match_players))
        .route("/multiplayer/matches/{id}/score", post(submit_score))
        .route("/multiplayer/matches/{id}/answers", post(submit_answer))
        .route("/multiplayer/matches/{id}/players/leave", post(leave_match))
        .route(
            "/multiplayer/staging/players",
            get(list_staging).post(join_staging),
        )
        .route("/multiplayer/staging/players/leave", post(leave_staging))
        .route("/multiplayer/staging/username", post(check_username))
}

/// Start a match from the staging area if enough questions are staged.
#[utoipa::path(
    post,
    path = "/multiplayer/start",
    tag = "matches",
    responses((status = 200, description = "Start attempt outcome", body = StartResponse))
)]
pub async fn start_match(
    State(state): State<SharedState>,
) -> Result<Json<StartResponse>, AppError> {
    let response = match_service::start_match(&state).await?;
    Ok(Json(response))
}

/// Full state of a match, for clients joining late.
#[utoipa::path(
    get,
    path = "/multiplayer/matches/{id}",
    tag = "matches",
    params(("id" = u32, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match state", body = MatchSnapshot),
        (status = 404, description = "Unknown or retired match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<MatchSnapshot>, AppError> {
    let snapshot = match_service::match_snapshot(&state, id).await?;
    Ok(Json(snapshot))
}

/// Leaderboard of a match.
#[utoipa::path(
    get,
    path = "/multiplayer/matches/{id}/players",
    tag = "matches",
    params(("id" = u32, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Players sorted by score, highest first", body = [PlayerSummary]),
        (status = 404, description = "Unknown or retired match")
    )
)]
pub async fn get_match_players(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<Vec<PlayerSummary>>, AppError> {
    let players = match_service::match_roster(&state, id).await?;
    Ok(Json(players))
}

/// Overwrite a player's score with a client-computed total.
#[utoipa::path(
    post,
    path = "/multiplayer/matches/{id}/score",
    tag = "matches",
    params(("id" = u32, Path, description = "Match identifier")),
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Updated player", body = PlayerSummary),
        (status = 400, description = "Negative score or invalid name"),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Player is not part of the match")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    Valid(Json(payload)): Valid<Json<ScoreRequest>>,
) -> Result<Json<PlayerSummary>, AppError> {
    let player = match_service::submit_score(&state, id, payload).await?;
    Ok(Json(player))
}

/// Submit an answer to the current question; the server evaluates and scores it.
#[utoipa::path(
    post,
    path = "/multiplayer/matches/{id}/answers",
    tag = "matches",
    params(("id" = u32, Path, description = "Match identifier")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer scored", body = AnswerResponse),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Player unknown, already answered, or no question on screen")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<Json<AnswerResponse>, AppError> {
    let response = match_service::submit_answer(&state, id, payload).await?;
    Ok(Json(response))
}

/// Leave a running match.
#[utoipa::path(
    post,
    path = "/multiplayer/matches/{id}/players/leave",
    tag = "matches",
    params(("id" = u32, Path, description = "Match identifier")),
    request_body = PlayerNameRequest,
    responses(
        (status = 200, description = "Whether the player was removed", body = RemovedResponse),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn leave_match(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    Valid(Json(payload)): Valid<Json<PlayerNameRequest>>,
) -> Result<Json<RemovedResponse>, AppError> {
    let removed = match_service::leave_match(&state, id, &payload.name).await?;
    Ok(Json(RemovedResponse { removed }))
}

/// Join the waiting room.
#[utoipa::path(
    post,
    path = "/multiplayer/staging/players",
    tag = "staging",
    request_body = PlayerNameRequest,
    responses(
        (status = 200, description = "Joined; poll the returned id", body = JoinResponse),
        (status = 400, description = "Invalid name"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn join_staging(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<PlayerNameRequest>>,
) -> Result<Json<JoinResponse>, AppError> {
    let response = staging_service::join(&state, &payload.name).await?;
    Ok(Json(response))
}

/// Leave the waiting room.
#[utoipa::path(
    post,
    path = "/multiplayer/staging/players/leave",
    tag = "staging",
    request_body = PlayerNameRequest,
    responses((status = 200, description = "Whether the player was removed", body = RemovedResponse))
)]
pub async fn leave_staging(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<PlayerNameRequest>>,
) -> Json<RemovedResponse> {
    let removed = staging_service::leave(&state, &payload.name).await;
    Json(RemovedResponse { removed })
}

/// Players currently in the waiting room.
#[utoipa::path(
    get,
    path = "/multiplayer/staging/players",
    tag = "staging",
    responses((status = 200, description = "Waiting players in join order", body = [PlayerSummary]))
)]
pub async fn list_staging(State(state): State<SharedState>) -> Json<Vec<PlayerSummary>> {
    Json(staging_service::list(&state).await)
}

/// Check whether a name can be used to join.
#[utoipa::path(
    post,
    path = "/multiplayer/staging/username",
    tag = "staging",
    request_body = PlayerNameRequest,
    responses((status = 200, description = "Whether the name is free", body = UsernameResponse))
)]
pub async fn check_username(
    State(state): State<SharedState>,
    Json(payload): Json<PlayerNameRequest>,
) -> Json<UsernameResponse> {
    let available = staging_service::username_available(&state, &payload.name).await;
    Json(UsernameResponse { available })
}
