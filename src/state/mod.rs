//! In-memory domain and the shared application state.

/// Change fingerprints handed to polling clients.
pub mod fingerprint;
/// State of one running match.
pub mod match_state;
/// Long-poll waiter registry.
pub mod notify;
/// Players.
pub mod player;
/// Question variants.
pub mod question;
/// Points formula.
pub mod scoring;
/// Waiting room.
pub mod staging;
/// Match phases.
pub mod state_machine;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use indexmap::IndexMap;
use tokio::{
    sync::{Mutex, RwLock, watch},
    task::JoinHandle,
};

use crate::{
    config::AppConfig,
    dao::{player_store::PlayerStore, question_source::QuestionSource},
};

use self::{
    match_state::{MatchId, MatchState},
    notify::NotificationRegistry,
    staging::StagingArea,
};

/// Handle shared by routes, services and background tasks.
pub type SharedState = Arc<AppState>;

/// Central application state: the staging area, live matches and their waiters.
///
/// Lock order is staging first, then matches. Deliveries happen while the lock
/// guarding the delivered state is held, so waiters observe them in order.
pub struct AppState {
    config: AppConfig,
    staging: Mutex<StagingArea>,
    matches: RwLock<IndexMap<MatchId, MatchState>>,
    registry: NotificationRegistry,
    schedulers: DashMap<MatchId, JoinHandle<()>>,
    question_source: Arc<dyn QuestionSource>,
    player_store: Arc<dyn PlayerStore>,
    degraded: watch::Sender<bool>,
    supplying: AtomicBool,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: AppConfig,
        question_source: Arc<dyn QuestionSource>,
        player_store: Arc<dyn PlayerStore>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            staging: Mutex::new(StagingArea::new(config.question_count)),
            matches: RwLock::new(IndexMap::new()),
            registry: NotificationRegistry::new(config.poll_timeout),
            schedulers: DashMap::new(),
            question_source,
            player_store,
            degraded: degraded_tx,
            supplying: AtomicBool::new(false),
            config,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Players and questions waiting for the next match.
    pub fn staging(&self) -> &Mutex<StagingArea> {
        &self.staging
    }

    /// Live and recently ended matches, in start order.
    pub fn matches(&self) -> &RwLock<IndexMap<MatchId, MatchState>> {
        &self.matches
    }

    /// Waiters of every match and of the staging id.
    pub fn registry(&self) -> &NotificationRegistry {
        &self.registry
    }

    /// Collaborator producing questions.
    pub fn question_source(&self) -> Arc<dyn QuestionSource> {
        self.question_source.clone()
    }

    /// Collaborator persisting final scores.
    pub fn player_store(&self) -> Arc<dyn PlayerStore> {
        self.player_store.clone()
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag; unchanged values are ignored.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Claim the question supply loop; false if it is already running.
    pub fn try_begin_supply(&self) -> bool {
        self.supplying
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the question supply loop.
    pub fn end_supply(&self) {
        self.supplying.store(false, Ordering::Release);
    }

    /// Keep the scheduler task of `match_id` so it can be aborted on shutdown.
    pub fn track_scheduler(&self, match_id: MatchId, handle: JoinHandle<()>) {
        self.schedulers.retain(|_, handle| !handle.is_finished());
        if !handle.is_finished() {
            self.schedulers.insert(match_id, handle);
        }
    }

    /// Drop the handle of a scheduler that stopped.
    pub fn forget_scheduler(&self, match_id: MatchId) {
        self.schedulers.remove(&match_id);
    }

    /// Number of scheduler tasks still tracked.
    pub fn active_schedulers(&self) -> usize {
        self.schedulers.len()
    }

    /// Abort every scheduler task; pending steps are simply dropped.
    pub fn abort_schedulers(&self) {
        self.schedulers.retain(|_, handle| {
            handle.abort();
            false
        });
    }
}
