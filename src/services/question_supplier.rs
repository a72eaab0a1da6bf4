//! Background loop keeping the staging area stocked with distinct questions.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{dao::question_source::SupplyError, state::SharedState};

/// Start the supply loop unless one is already running.
pub fn ensure_running(state: &SharedState) {
    if !state.try_begin_supply() {
        return;
    }

    let state = state.clone();
    tokio::spawn(async move {
        let result = fill_staging(&state).await;
        state.end_supply();
        match result {
            Ok(added) => debug!(added, "question supply finished"),
            Err(err) => warn!(error = %err, "question supply stopped"),
        }
    });
}

/// Draw questions until the staging area is ready.
///
/// Duplicates and supplier failures count as failed attempts; supplier
/// failures also back off exponentially and put the service in degraded mode.
/// After `max_attempts` consecutive failures the loop gives up with
/// [`SupplyError::Exhausted`] and the service stays degraded.
pub async fn fill_staging(state: &SharedState) -> Result<usize, SupplyError> {
    let policy = state.config().supply;
    let source = state.question_source();
    let mut delay = policy.initial_backoff;
    let mut failures = 0u32;
    let mut added = 0usize;

    loop {
        let missing = state.staging().lock().await.missing_questions();
        if missing == 0 {
            if state.is_degraded() {
                info!("staging area filled; leaving degraded mode");
            }
            state.update_degraded(false);
            return Ok(added);
        }

        match source.random_question().await {
            Ok(question) => {
                if state.staging().lock().await.add_question(question) {
                    added += 1;
                    failures = 0;
                    delay = policy.initial_backoff;
                } else {
                    failures += 1;
                    debug!(failures, "supplier returned a staged question again");
                }
            }
            Err(err) => {
                failures += 1;
                if !state.is_degraded() {
                    warn!(error = %err, missing, "question supply failed; entering degraded mode");
                    state.update_degraded(true);
                } else {
                    warn!(attempt = failures, error = %err, "question supply attempt failed");
                }
                sleep(delay).await;
                delay = (delay * 2).min(policy.max_backoff);
            }
        }

        if failures >= policy.max_attempts {
            warn!(attempts = failures, "exhausted question supply attempts; staying in degraded mode");
            state.update_degraded(true);
            return Err(SupplyError::Exhausted { attempts: failures });
        }
    }
}
