//! Use cases of live matches: start, inspect, score, answer and leave.

use tokio::time::Instant;
use tracing::info;

use crate::{
    dto::multiplayer::{
        AnswerRequest, AnswerResponse, MatchSnapshot, PlayerSummary, ScoreRequest, StartResponse,
    },
    error::ServiceError,
    services::{question_supplier, scheduler},
    state::{
        SharedState,
        match_state::MatchId,
        player::{Player, sort_by_score_desc},
    },
};

fn match_not_found(match_id: MatchId) -> ServiceError {
    ServiceError::NotFound(format!("match {match_id}"))
}

/// Turn the staging area into a match if enough questions are staged.
///
/// The flush, the insertion of the match and the delivery of its `LOADING`
/// fingerprint happen under the staging lock, so no join lands in between.
pub async fn start_match(state: &SharedState) -> Result<StartResponse, ServiceError> {
    let mut staging = state.staging().lock().await;
    if !staging.is_ready() {
        let missing = staging.missing_questions();
        drop(staging);
        info!(missing, "not enough questions staged; match not started");
        question_supplier::ensure_running(state);
        return Ok(StartResponse {
            started: false,
            match_id: None,
        });
    }

    let mut game = staging.flush();
    let match_id = game.id();
    let fingerprint = game.begin(&state.config().timings, Instant::now());
    let players = game.players().len();
    {
        let mut matches = state.matches().write().await;
        matches.insert(match_id, game);
        state.registry().deliver(match_id, &fingerprint);
    }
    drop(staging);

    info!(match_id, players, "match started");
    scheduler::spawn(state, match_id);
    question_supplier::ensure_running(state);

    Ok(StartResponse {
        started: true,
        match_id: Some(match_id),
    })
}

/// Full state of a live or recently ended match.
pub async fn match_snapshot(
    state: &SharedState,
    match_id: MatchId,
) -> Result<MatchSnapshot, ServiceError> {
    let matches = state.matches().read().await;
    matches
        .get(&match_id)
        .map(MatchSnapshot::from)
        .ok_or_else(|| match_not_found(match_id))
}

/// Players of a match, highest score first.
pub async fn match_roster(
    state: &SharedState,
    match_id: MatchId,
) -> Result<Vec<PlayerSummary>, ServiceError> {
    let mut players: Vec<Player> = {
        let matches = state.matches().read().await;
        matches
            .get(&match_id)
            .ok_or_else(|| match_not_found(match_id))?
            .players()
            .to_vec()
    };
    sort_by_score_desc(&mut players);
    Ok(players.iter().map(PlayerSummary::from).collect())
}

/// Overwrite a player's score with the total computed by the client.
pub async fn submit_score(
    state: &SharedState,
    match_id: MatchId,
    request: ScoreRequest,
) -> Result<PlayerSummary, ServiceError> {
    let mut matches = state.matches().write().await;
    let game = matches
        .get_mut(&match_id)
        .ok_or_else(|| match_not_found(match_id))?;
    let player = game.set_player_score(&request.name, request.score)?;
    Ok(PlayerSummary::from(&player))
}

/// Evaluate and score an answer to the current question.
pub async fn submit_answer(
    state: &SharedState,
    match_id: MatchId,
    request: AnswerRequest,
) -> Result<AnswerResponse, ServiceError> {
    let mut matches = state.matches().write().await;
    let game = matches
        .get_mut(&match_id)
        .ok_or_else(|| match_not_found(match_id))?;
    let outcome = game.submit_answer(&request.name, request.elapsed_seconds, request.answer)?;
    info!(
        match_id,
        player = %request.name,
        points = outcome.points_awarded,
        "answer scored"
    );
    Ok(outcome.into())
}

/// Remove a player from a match and tell the other clients.
pub async fn leave_match(
    state: &SharedState,
    match_id: MatchId,
    name: &str,
) -> Result<bool, ServiceError> {
    let mut matches = state.matches().write().await;
    let game = matches
        .get_mut(&match_id)
        .ok_or_else(|| match_not_found(match_id))?;
    // An unknown name never equals a roster entry; ended matches still decline it.
    let player = game
        .player(name)
        .cloned()
        .unwrap_or_else(|| Player::new(name));
    if !game.remove_player(&player)? {
        return Ok(false);
    }

    let fingerprint = game.compute_fingerprint();
    let delivered = state.registry().deliver(match_id, &fingerprint);
    info!(match_id, player = %name, delivered, "player left match");
    Ok(true)
}
