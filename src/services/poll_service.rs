//! Long-poll endpoint logic.

use tokio::time::sleep;

use crate::{
    error::ServiceError,
    state::{
        SharedState,
        fingerprint::ChangeFingerprint,
        match_state::MatchId,
        notify::PollOutcome,
    },
};

/// Wait for the next fingerprint of `match_id` (a live match or the staging id).
///
/// Answers right away when `known` is missing for an ended match, or when
/// `known` no longer matches the current state. A client that already holds
/// the END fingerprint gets [`PollOutcome::NoUpdate`] after the poll timeout.
/// Otherwise the waiter is registered while the state lock is held, so it
/// cannot miss a delivery that follows.
pub async fn poll(
    state: &SharedState,
    match_id: MatchId,
    known: Option<ChangeFingerprint>,
) -> Result<PollOutcome, ServiceError> {
    let wait = {
        let staging = state.staging().lock().await;
        let matches = state.matches().read().await;

        let (current, ended) = match matches.get(&match_id) {
            Some(game) => (game.compute_fingerprint(), game.phase().is_terminal()),
            None if staging.next_match_id() == match_id => (staging.fingerprint(), false),
            None => return Err(ServiceError::NotFound(format!("match {match_id}"))),
        };

        match known {
            Some(known) if known != current => return Ok(PollOutcome::Updated(current)),
            None if ended => return Ok(PollOutcome::Updated(current)),
            _ => {}
        }

        if ended {
            None
        } else {
            let (_token, wait) = state.registry().register(match_id);
            Some(wait)
        }
    };

    match wait {
        Some(wait) => Ok(wait.await),
        None => {
            // Nothing is ever delivered for an ended match.
            sleep(state.registry().poll_timeout()).await;
            Ok(PollOutcome::NoUpdate)
        }
    }
}
