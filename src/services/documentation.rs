use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Quizzz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::multiplayer::start_match,
        crate::routes::multiplayer::get_match,
        crate::routes::multiplayer::get_match_players,
        crate::routes::multiplayer::submit_score,
        crate::routes::multiplayer::submit_answer,
        crate::routes::multiplayer::leave_match,
        crate::routes::multiplayer::join_staging,
        crate::routes::multiplayer::leave_staging,
        crate::routes::multiplayer::list_staging,
        crate::routes::multiplayer::check_username,
        crate::routes::poll::poll_updates,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::multiplayer::PlayerSummary,
            crate::dto::multiplayer::StartResponse,
            crate::dto::multiplayer::MatchSnapshot,
            crate::dto::multiplayer::PlayerNameRequest,
            crate::dto::multiplayer::JoinResponse,
            crate::dto::multiplayer::RemovedResponse,
            crate::dto::multiplayer::UsernameResponse,
            crate::dto::multiplayer::ScoreRequest,
            crate::dto::multiplayer::AnswerRequest,
            crate::dto::multiplayer::AnswerResponse,
            crate::state::fingerprint::ChangeFingerprint,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Live match operations"),
        (name = "staging", description = "Waiting room operations"),
        (name = "updates", description = "Long-poll change notifications"),
    )
)]
pub struct ApiDoc;
