use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report degraded mode while the staging area cannot be stocked with questions.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if state.is_degraded() {
        let missing = state.staging().lock().await.missing_questions();
        warn!(missing, "question supply stalled (degraded mode)");
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
