//! Use cases of the waiting room.

use tracing::info;

use crate::{
    dto::multiplayer::{JoinResponse, PlayerSummary},
    error::ServiceError,
    state::{SharedState, player::Player},
};

/// Add a player to the staging area and notify the waiting room.
pub async fn join(state: &SharedState, name: &str) -> Result<JoinResponse, ServiceError> {
    let mut staging = state.staging().lock().await;
    let staging_id = staging.join(Player::new(name))?;
    let delivered = state
        .registry()
        .deliver(staging_id, &staging.fingerprint());
    info!(staging_id, player = %name, delivered, "player joined staging area");
    Ok(JoinResponse { staging_id })
}

/// Remove a player from the staging area; notifies only if someone left.
pub async fn leave(state: &SharedState, name: &str) -> bool {
    let mut staging = state.staging().lock().await;
    let Some(player) = staging.player(name).cloned() else {
        return false;
    };
    if !staging.leave(&player) {
        return false;
    }

    let staging_id = staging.next_match_id();
    let delivered = state
        .registry()
        .deliver(staging_id, &staging.fingerprint());
    info!(staging_id, player = %name, delivered, "player left staging area");
    true
}

/// Players currently waiting, in join order.
pub async fn list(state: &SharedState) -> Vec<PlayerSummary> {
    let staging = state.staging().lock().await;
    staging.players().iter().map(PlayerSummary::from).collect()
}

/// Whether `name` can be used to join right now.
pub async fn username_available(state: &SharedState, name: &str) -> bool {
    if name.trim().is_empty() {
        return false;
    }
    !state.staging().lock().await.contains_name(name)
}
