use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// Health check.
pub mod health;
/// Waiting room and match routes.
pub mod multiplayer;
/// Long-poll route.
pub mod poll;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(multiplayer::router())
        .merge(poll::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
