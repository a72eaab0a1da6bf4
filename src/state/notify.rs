//! Per-match long-poll waiters.
//!
//! Every poll registers a single-shot channel under its match id. A delivery
//! drains all channels of that match at once, so a waiter sees at most one
//! fingerprint and later registrations never observe an earlier delivery.

use std::{collections::HashMap, future::Future, time::Duration};

use dashmap::DashMap;
use tokio::{sync::oneshot, time::timeout};
use tracing::debug;
use uuid::Uuid;

use crate::state::{fingerprint::ChangeFingerprint, match_state::MatchId};

/// Opaque handle of one registered waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaiterToken(Uuid);

impl WaiterToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// What a long-poll resolved with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A fingerprint was delivered for the match.
    Updated(ChangeFingerprint),
    /// The timeout elapsed (or the match was retired) before any delivery.
    NoUpdate,
}

type Waiters = HashMap<WaiterToken, oneshot::Sender<ChangeFingerprint>>;

/// Registry of pending long-poll waiters keyed by match id.
pub struct NotificationRegistry {
    waiters: DashMap<MatchId, Waiters>,
    poll_timeout: Duration,
}

impl NotificationRegistry {
    /// Empty registry whose waits give up after `poll_timeout`.
    pub fn new(poll_timeout: Duration) -> Self {
        Self {
            waiters: DashMap::new(),
            poll_timeout,
        }
    }

    /// How long a poll waits before answering "no update yet".
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Register a waiter for `match_id`.
    ///
    /// The waiter is in place as soon as this returns, before the future is
    /// first polled. Dropping the future deregisters it.
    pub fn register(
        &self,
        match_id: MatchId,
    ) -> (WaiterToken, impl Future<Output = PollOutcome> + Send + '_) {
        let token = WaiterToken::new();
        let (tx, rx) = oneshot::channel();
        self.waiters.entry(match_id).or_default().insert(token, tx);

        let guard = WaiterGuard {
            registry: self,
            match_id,
            token,
        };
        let limit = self.poll_timeout;
        let wait = async move {
            let _guard = guard;
            match timeout(limit, rx).await {
                Ok(Ok(fingerprint)) => PollOutcome::Updated(fingerprint),
                Ok(Err(_)) | Err(_) => PollOutcome::NoUpdate,
            }
        };

        (token, wait)
    }

    /// Resolve every waiter of `match_id` with `fingerprint` and clear them.
    ///
    /// Returns how many waiters received it; with nobody waiting the
    /// fingerprint is dropped.
    pub fn deliver(&self, match_id: MatchId, fingerprint: &ChangeFingerprint) -> usize {
        let Some((_, waiters)) = self.waiters.remove(&match_id) else {
            return 0;
        };

        let delivered = waiters
            .into_values()
            .filter(|tx| !tx.is_closed())
            .map(|tx| tx.send(fingerprint.clone()).is_ok())
            .filter(|sent| *sent)
            .count();
        debug!(match_id, delivered, phase = %fingerprint.phase, "delivered fingerprint");
        delivered
    }

    /// Drop every waiter of `match_id`; they resolve with [`PollOutcome::NoUpdate`].
    pub fn retire(&self, match_id: MatchId) -> usize {
        self.waiters
            .remove(&match_id)
            .map(|(_, waiters)| waiters.len())
            .unwrap_or(0)
    }

    /// Number of waiters currently registered for `match_id`.
    pub fn waiting(&self, match_id: MatchId) -> usize {
        self.waiters
            .get(&match_id)
            .map(|waiters| waiters.len())
            .unwrap_or(0)
    }

    fn deregister(&self, match_id: MatchId, token: WaiterToken) {
        if let Some(mut waiters) = self.waiters.get_mut(&match_id) {
            waiters.remove(&token);
        }
        self.waiters
            .remove_if(&match_id, |_, waiters| waiters.is_empty());
    }
}

/// Removes a waiter when its poll future completes or is dropped.
struct WaiterGuard<'a> {
    registry: &'a NotificationRegistry,
    match_id: MatchId,
    token: WaiterToken,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.registry.deregister(self.match_id, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{fingerprint::ScreenPhase, player::Player};

    fn fingerprint(index: i32) -> ChangeFingerprint {
        ChangeFingerprint::new(&[Player::new("ann")], ScreenPhase::Question, index)
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_resolves_all_waiters_once() {
        let registry = NotificationRegistry::new(Duration::from_secs(5));
        let (a, first) = registry.register(1);
        let (b, second) = registry.register(1);
        assert_ne!(a, b);
        assert_eq!(registry.waiting(1), 2);

        assert_eq!(registry.deliver(1, &fingerprint(0)), 2);
        assert_eq!(registry.waiting(1), 0);
        assert_eq!(first.await, PollOutcome::Updated(fingerprint(0)));
        assert_eq!(second.await, PollOutcome::Updated(fingerprint(0)));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_yields_no_update_and_deregisters() {
        let registry = NotificationRegistry::new(Duration::from_secs(5));
        let (_, wait) = registry.register(3);
        assert_eq!(wait.await, PollOutcome::NoUpdate);
        assert_eq!(registry.waiting(3), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn late_registration_does_not_see_earlier_delivery() {
        let registry = NotificationRegistry::new(Duration::from_secs(5));
        assert_eq!(registry.deliver(2, &fingerprint(0)), 0);

        let (_, wait) = registry.register(2);
        assert_eq!(wait.await, PollOutcome::NoUpdate);
    }

    #[tokio::test(start_paused = true)]
    async fn deliveries_are_scoped_per_match() {
        let registry = NotificationRegistry::new(Duration::from_secs(5));
        let (_, other) = registry.register(8);
        assert_eq!(registry.deliver(7, &fingerprint(1)), 0);
        assert_eq!(registry.waiting(8), 1);
        assert_eq!(other.await, PollOutcome::NoUpdate);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_poll_is_removed() {
        let registry = NotificationRegistry::new(Duration::from_secs(5));
        let (_, wait) = registry.register(4);
        drop(wait);
        assert_eq!(registry.waiting(4), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retire_releases_waiters() {
        let registry = NotificationRegistry::new(Duration::from_secs(5));
        let (_, wait) = registry.register(9);
        assert_eq!(registry.retire(9), 1);
        assert_eq!(wait.await, PollOutcome::NoUpdate);
    }
}
