#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::{FutureExt, future::BoxFuture};
use quizzz_back::{
    config::AppConfig,
    dao::{
        player_store::InMemoryPlayerStore,
        question_source::{QuestionKind, QuestionSource, SupplyResult},
    },
    state::{
        AppState, SharedState,
        question::{Activity, ComparativeQuestion, Question},
    },
};

/// Hands out a fresh comparative question on every call.
#[derive(Default)]
pub struct SequentialSource {
    next: AtomicUsize,
}

impl QuestionSource for SequentialSource {
    fn random_question(&self) -> BoxFuture<'static, SupplyResult<Question>> {
        self.question_of_kind(QuestionKind::Comparative)
    }

    fn question_of_kind(&self, _kind: QuestionKind) -> BoxFuture<'static, SupplyResult<Question>> {
        let n = self.next.fetch_add(1, Ordering::Relaxed) as i64;
        futures::future::ready(Ok(comparative(n))).boxed()
    }
}

/// Comparative question over `[base+1, base+2, base+3]` Wh; answer index 2 when asking for the most.
pub fn comparative(base: i64) -> Question {
    let activities = (1..=3)
        .map(|offset| Activity {
            id: format!("{base}-{offset}"),
            title: format!("activity {base}-{offset}"),
            image_path: None,
            consumption_wh: base * 10 + offset,
            source: None,
        })
        .collect();
    Question::Comparative(ComparativeQuestion::new(activities, true))
}

pub struct Harness {
    pub state: SharedState,
    pub players: InMemoryPlayerStore,
}

pub fn harness(question_count: usize) -> Harness {
    let config = AppConfig {
        question_count,
        ..AppConfig::default()
    };
    let players = InMemoryPlayerStore::new();
    let state = AppState::new(
        config,
        Arc::new(SequentialSource::default()),
        Arc::new(players.clone()),
    );
    Harness { state, players }
}

/// Stage `count` questions that the sequential source will never produce.
pub async fn stage_questions(state: &SharedState, count: usize) {
    let mut staging = state.staging().lock().await;
    for n in 0..count {
        staging.add_question(comparative(1_000 + n as i64));
    }
}
