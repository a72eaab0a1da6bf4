//! Per-match task that walks a match through its phases.
//!
//! The next step and its deadline live in the [`MatchState`] itself; the task
//! only sleeps until the stored deadline and asks the match to fire the stored
//! step. A step that is no longer the armed one, or that targets an ended or
//! dropped match, does nothing.
//!
//! [`MatchState`]: crate::state::match_state::MatchState

use std::sync::Arc;

use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use crate::{
    dao::player_store::PlayerStore,
    state::{
        SharedState,
        match_state::{MatchId, PendingStep},
        player::Player,
    },
};

/// What happened when a step was due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    /// A phase change was delivered and another step may be armed.
    Advanced,
    /// The step was not the armed one anymore.
    Stale,
    /// The match ended or no longer exists.
    Finished,
}

/// Spawn the scheduler task of `match_id` and keep its handle.
pub fn spawn(state: &SharedState, match_id: MatchId) {
    let handle = tokio::spawn(run(state.clone(), match_id));
    state.track_scheduler(match_id, handle);
}

/// Drive `match_id` until it ends or disappears.
pub async fn run(state: SharedState, match_id: MatchId) {
    debug!(match_id, "scheduler started");
    while let Some(step) = armed_step(&state, match_id).await {
        sleep_until(step.due_at).await;
        match fire(&state, match_id, step).await {
            StepOutcome::Advanced | StepOutcome::Stale => continue,
            StepOutcome::Finished => break,
        }
    }
    state.forget_scheduler(match_id);
    debug!(match_id, "scheduler stopped");
}

async fn armed_step(state: &SharedState, match_id: MatchId) -> Option<PendingStep> {
    let matches = state.matches().read().await;
    matches.get(&match_id)?.pending_step()
}

async fn fire(state: &SharedState, match_id: MatchId, step: PendingStep) -> StepOutcome {
    let timings = state.config().timings;
    let mut matches = state.matches().write().await;
    let Some(game) = matches.get_mut(&match_id) else {
        return StepOutcome::Finished;
    };

    let fingerprint = match game.fire(step, &timings, Instant::now()) {
        Ok(Some(fingerprint)) => fingerprint,
        Ok(None) if game.phase().is_terminal() => return StepOutcome::Finished,
        Ok(None) => return StepOutcome::Stale,
        Err(err) => {
            error!(match_id, error = %err, "scheduled step rejected by the match");
            return StepOutcome::Finished;
        }
    };

    let delivered = state.registry().deliver(match_id, &fingerprint);
    info!(
        match_id,
        phase = %fingerprint.phase,
        question_index = fingerprint.question_index,
        delivered,
        "match advanced"
    );

    if !game.phase().is_terminal() {
        return StepOutcome::Advanced;
    }

    let players = game.players().to_vec();
    let grace = state.config().retired_match_grace;
    let before = matches.len();
    matches.retain(|id, game| {
        !(game.phase().is_terminal() && u64::from(*id) + u64::from(grace) <= u64::from(match_id))
    });
    let retired = before - matches.len();
    drop(matches);

    state.registry().retire(match_id);
    if retired > 0 {
        debug!(match_id, retired, "dropped matches past their grace window");
    }

    tokio::spawn(persist_players(state.player_store(), players));
    StepOutcome::Finished
}

/// Upsert the final scores of a finished match; failures are only logged.
async fn persist_players(store: Arc<dyn PlayerStore>, players: Vec<Player>) {
    let total = players.len();
    let mut saved = 0;
    for player in players {
        let name = player.name().to_string();
        match store.upsert(player).await {
            Ok(_) => saved += 1,
            Err(err) => warn!(player = %name, error = %err, "failed to persist player"),
        }
    }
    debug!(saved, total, "persisted match players");
}
