//! Live match: roster, questions, phase and the next scheduled step.

use std::{collections::HashMap, time::SystemTime};

use thiserror::Error;
use tokio::time::Instant;

use crate::{
    config::MatchTimings,
    state::{
        fingerprint::ChangeFingerprint,
        player::{Player, PlayerError},
        question::{AnswerInput, Question},
        scoring,
        state_machine::{InvalidTransition, MatchEvent, MatchPhase, MatchStateMachine},
    },
};

/// Identifier of a match, handed out by the staging area.
pub type MatchId = u32;

/// Next scheduled step of a match and the instant it is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStep {
    /// Event applied when the step fires.
    pub event: MatchEvent,
    /// Deadline on the tokio clock.
    pub due_at: Instant,
}

/// Declined operation on a live match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No player with that name takes part in the match.
    #[error("player `{0}` is not part of this match")]
    PlayerNotFound(String),
    /// The player already answered the question on screen.
    #[error("player `{name}` already answered question {question_index}")]
    AlreadyAnswered {
        /// Player who answered twice.
        name: String,
        /// Question the repeated answer targeted.
        question_index: usize,
    },
    /// No question is open for answers in this phase.
    #[error("answers are not accepted while the match is in {0}")]
    NotAcceptingAnswers(MatchPhase),
    /// The match is over and its roster is frozen.
    #[error("match already ended")]
    Ended,
    /// The player rejected the requested change.
    #[error(transparent)]
    Player(#[from] PlayerError),
}

/// Result of a scored answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Points added by this answer.
    pub points_awarded: u32,
    /// Player after scoring.
    pub player: Player,
}

/// In-memory state of one running match.
#[derive(Debug, Clone)]
pub struct MatchState {
    id: MatchId,
    players: Vec<Player>,
    questions: Vec<Question>,
    question_count: usize,
    /// Index of the current question, `None` before the first one.
    question_index: Option<usize>,
    machine: MatchStateMachine,
    pending: Option<PendingStep>,
    /// Last question index each player answered, keyed by name.
    answered: HashMap<String, usize>,
    started_at: SystemTime,
}

impl MatchState {
    /// Build a match in the loading phase. `question_count` is capped by the
    /// number of questions actually provided.
    pub fn new(
        id: MatchId,
        players: Vec<Player>,
        questions: Vec<Question>,
        question_count: usize,
    ) -> Self {
        let question_count = question_count.min(questions.len());
        Self {
            id,
            players,
            questions,
            question_count,
            question_index: None,
            machine: MatchStateMachine::new(),
            pending: None,
            answered: HashMap::new(),
            started_at: SystemTime::now(),
        }
    }

    /// Id the match was started under.
    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Roster in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Questions handed over by the staging area.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions the match plays.
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Index of the current question, `None` before the first one.
    pub fn question_index(&self) -> Option<usize> {
        self.question_index
    }

    /// Question index as exchanged with clients: `-1` before the first question.
    pub fn wire_question_index(&self) -> i32 {
        self.question_index
            .and_then(|index| i32::try_from(index).ok())
            .unwrap_or(-1)
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.machine.phase()
    }

    /// Wall-clock creation time.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Step the scheduler should fire next, if any.
    pub fn pending_step(&self) -> Option<PendingStep> {
        self.pending
    }

    /// Question on screen, if one was reached.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.question_index?)
    }

    /// Player called `name`, if part of the match.
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name() == name)
    }

    /// Remove a player equal to `player`; true if one was removed.
    ///
    /// The roster of an ended match is frozen.
    pub fn remove_player(&mut self, player: &Player) -> Result<bool, MatchError> {
        if self.phase().is_terminal() {
            return Err(MatchError::Ended);
        }
        match self.players.iter().position(|p| p == player) {
            Some(index) => {
                let removed = self.players.remove(index);
                self.answered.remove(removed.name());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Bump the question index. Callers pair this with a move to [`MatchPhase::Question`].
    pub fn advance_question(&mut self) {
        self.question_index = Some(self.question_index.map_or(0, |index| index + 1));
    }

    /// Move the match forward to `phase`; backwards or skipping moves fail.
    pub fn set_phase(&mut self, phase: MatchPhase) -> Result<(), InvalidTransition> {
        self.machine.advance_to(phase).map(|_| ())
    }

    /// Side-effect free snapshot of roster, phase and question index.
    pub fn compute_fingerprint(&self) -> ChangeFingerprint {
        ChangeFingerprint::new(
            &self.players,
            self.phase().into(),
            self.wire_question_index(),
        )
    }

    fn player_mut(&mut self, name: &str) -> Result<&mut Player, MatchError> {
        self.players
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| MatchError::PlayerNotFound(name.to_string()))
    }

    /// Run the scoring engine against the live score and streak of `name`.
    pub fn score_player_answer(
        &mut self,
        name: &str,
        elapsed_seconds: Option<u32>,
        quality: f64,
    ) -> Result<u32, MatchError> {
        let player = self.player_mut(name)?;
        Ok(scoring::apply_answer(player, elapsed_seconds, quality))
    }

    /// Overwrite the score of `name` with a client-computed total.
    pub fn set_player_score(&mut self, name: &str, score: i64) -> Result<Player, MatchError> {
        let player = self.player_mut(name)?;
        player.set_score(score)?;
        Ok(player.clone())
    }

    /// Evaluate an answer to the current question and score it.
    ///
    /// A missing answer, a wrong choice or an estimate outside the tolerance
    /// band all count as a miss.
    pub fn submit_answer(
        &mut self,
        name: &str,
        elapsed_seconds: Option<u32>,
        answer: Option<AnswerInput>,
    ) -> Result<AnswerOutcome, MatchError> {
        let phase = self.phase();
        let index = match (phase, self.question_index) {
            (MatchPhase::Question | MatchPhase::Leaderboard, Some(index)) => index,
            _ => return Err(MatchError::NotAcceptingAnswers(phase)),
        };

        self.player_mut(name)?;
        if self.answered.get(name) == Some(&index) {
            return Err(MatchError::AlreadyAnswered {
                name: name.to_string(),
                question_index: index,
            });
        }

        let quality = match (self.questions.get(index), answer) {
            (Some(question), Some(answer)) => question.evaluate(answer),
            _ => None,
        };
        let elapsed = quality.and(elapsed_seconds);
        let points_awarded = self.score_player_answer(name, elapsed, quality.unwrap_or(0.0))?;
        self.answered.insert(name.to_string(), index);

        let player = self.player_mut(name)?.clone();
        Ok(AnswerOutcome {
            points_awarded,
            player,
        })
    }

    /// Arm the first step of a freshly started match.
    pub fn begin(&mut self, timings: &MatchTimings, now: Instant) -> ChangeFingerprint {
        self.pending = Some(PendingStep {
            event: MatchEvent::AdvanceQuestion,
            due_at: now + timings.loading,
        });
        self.compute_fingerprint()
    }

    /// Fire `step` if it is still the armed one and arm the step after it.
    ///
    /// Returns the fingerprint to deliver, or `None` when the step is stale or
    /// the match already ended.
    pub fn fire(
        &mut self,
        step: PendingStep,
        timings: &MatchTimings,
        now: Instant,
    ) -> Result<Option<ChangeFingerprint>, InvalidTransition> {
        if self.pending != Some(step) || self.phase().is_terminal() {
            return Ok(None);
        }
        self.pending = None;

        match step.event {
            MatchEvent::AdvanceQuestion => {
                let next = self.question_index.map_or(0, |index| index + 1);
                if next < self.question_count {
                    self.set_phase(MatchPhase::Question)?;
                    self.advance_question();
                    self.pending = Some(PendingStep {
                        event: MatchEvent::ShowLeaderboard,
                        due_at: now + timings.question,
                    });
                } else {
                    self.set_phase(MatchPhase::End)?;
                }
            }
            MatchEvent::ShowLeaderboard => {
                self.set_phase(MatchPhase::Leaderboard)?;
                self.pending = Some(PendingStep {
                    event: MatchEvent::AdvanceQuestion,
                    due_at: now + timings.leaderboard,
                });
            }
            MatchEvent::Finish => {
                self.set_phase(MatchPhase::End)?;
            }
        }

        Ok(Some(self.compute_fingerprint()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::{
        fingerprint::ScreenPhase,
        question::{Activity, ComparativeQuestion, EstimationQuestion},
    };

    fn timings() -> MatchTimings {
        MatchTimings {
            loading: Duration::from_secs(3),
            question: Duration::from_secs(19),
            leaderboard: Duration::from_secs(4),
        }
    }

    fn activity(id: &str, consumption_wh: i64) -> Activity {
        Activity {
            id: id.into(),
            title: id.into(),
            image_path: None,
            consumption_wh,
            source: None,
        }
    }

    fn comparative() -> Question {
        Question::Comparative(ComparativeQuestion::new(
            vec![activity("a", 1), activity("b", 2), activity("c", 3)],
            true,
        ))
    }

    fn estimation() -> Question {
        Question::Estimation(EstimationQuestion {
            activity: activity("e", 100),
        })
    }

    fn players() -> Vec<Player> {
        vec![Player::new("ann"), Player::new("bob")]
    }

    fn fire_pending(game: &mut MatchState) -> Option<ChangeFingerprint> {
        let step = game.pending_step()?;
        game.fire(step, &timings(), step.due_at).unwrap()
    }

    #[test]
    fn new_match_starts_loading_before_first_question() {
        let game = MatchState::new(4, players(), vec![comparative()], 1);
        assert_eq!(game.id(), 4);
        assert_eq!(game.phase(), MatchPhase::Loading);
        assert_eq!(game.wire_question_index(), -1);
        assert!(game.current_question().is_none());
    }

    #[test]
    fn question_count_is_capped_by_available_questions() {
        let game = MatchState::new(0, players(), vec![comparative()], 20);
        assert_eq!(game.question_count(), 1);
    }

    #[test]
    fn scheduled_cycle_runs_until_end() {
        let mut game = MatchState::new(0, players(), vec![comparative(), estimation()], 2);
        let start = Instant::now();
        let loading = game.begin(&timings(), start);
        assert_eq!(loading.phase, ScreenPhase::Loading);
        assert_eq!(
            game.pending_step().unwrap().due_at,
            start + Duration::from_secs(3)
        );

        let expected = [
            (ScreenPhase::Question, 0),
            (ScreenPhase::Leaderboard, 0),
            (ScreenPhase::Question, 1),
            (ScreenPhase::Leaderboard, 1),
            (ScreenPhase::End, 1),
        ];
        for (phase, index) in expected {
            let fp = fire_pending(&mut game).unwrap();
            assert_eq!((fp.phase, fp.question_index), (phase, index));
        }
        assert!(game.pending_step().is_none());
    }

    #[test]
    fn stale_or_terminal_steps_are_noops() {
        let mut game = MatchState::new(0, players(), Vec::new(), 0);
        let now = Instant::now();
        game.begin(&timings(), now);
        let step = game.pending_step().unwrap();

        let stale = PendingStep {
            event: MatchEvent::ShowLeaderboard,
            due_at: now,
        };
        assert_eq!(game.fire(stale, &timings(), now), Ok(None));

        let end = game.fire(step, &timings(), now).unwrap().unwrap();
        assert_eq!(end.phase, ScreenPhase::End);
        assert_eq!(game.fire(step, &timings(), now), Ok(None));
        assert_eq!(game.phase(), MatchPhase::End);
    }

    #[test]
    fn removing_player_changes_fingerprint() {
        let mut game = MatchState::new(0, players(), Vec::new(), 0);
        let before = game.compute_fingerprint();
        assert_eq!(game.remove_player(&Player::new("bob")), Ok(true));
        assert_eq!(game.remove_player(&Player::new("bob")), Ok(false));
        assert_ne!(before, game.compute_fingerprint());
        assert_eq!(game.players().len(), 1);
    }

    #[test]
    fn removal_matches_the_whole_player() {
        let mut game = MatchState::new(0, players(), vec![comparative()], 1);
        game.set_player_score("bob", 40).unwrap();
        assert_eq!(game.remove_player(&Player::new("bob")), Ok(false));

        let bob = game.player("bob").cloned().unwrap();
        assert_eq!(game.remove_player(&bob), Ok(true));
        assert!(game.player("bob").is_none());
    }

    #[test]
    fn ended_match_keeps_its_roster() {
        let mut game = MatchState::new(0, players(), Vec::new(), 0);
        let now = Instant::now();
        game.begin(&timings(), now);
        fire_pending(&mut game).unwrap();
        let end = game.compute_fingerprint();

        let ann = game.player("ann").cloned().unwrap();
        assert_eq!(game.remove_player(&ann), Err(MatchError::Ended));
        assert_eq!(game.players().len(), 2);
        assert_eq!(game.compute_fingerprint(), end);
    }

    #[test]
    fn set_phase_is_forward_only() {
        let mut game = MatchState::new(0, players(), vec![comparative()], 1);
        assert!(game.set_phase(MatchPhase::Leaderboard).is_err());
        game.set_phase(MatchPhase::Question).unwrap();
        game.advance_question();
        assert_eq!(game.wire_question_index(), 0);
        assert!(game.set_phase(MatchPhase::Loading).is_err());
    }

    #[test]
    fn answers_are_scored_once_per_question() {
        let mut game = MatchState::new(0, players(), vec![comparative()], 1);
        assert_eq!(
            game.submit_answer("ann", Some(10), Some(AnswerInput::Choice { index: 2 })),
            Err(MatchError::NotAcceptingAnswers(MatchPhase::Loading))
        );

        game.begin(&timings(), Instant::now());
        fire_pending(&mut game);

        let outcome = game
            .submit_answer("ann", Some(10), Some(AnswerInput::Choice { index: 2 }))
            .unwrap();
        assert_eq!(outcome.points_awarded, 1010);
        assert_eq!(outcome.player.score(), 1010);
        assert_eq!(outcome.player.streak(), 1);

        assert_eq!(
            game.submit_answer("ann", Some(3), Some(AnswerInput::Choice { index: 2 })),
            Err(MatchError::AlreadyAnswered {
                name: "ann".into(),
                question_index: 0,
            })
        );

        let miss = game
            .submit_answer("bob", Some(1), Some(AnswerInput::Choice { index: 0 }))
            .unwrap();
        assert_eq!(miss.points_awarded, 0);
        assert_eq!(miss.player.streak(), 0);

        assert_eq!(
            game.submit_answer("eve", Some(1), None),
            Err(MatchError::PlayerNotFound("eve".into()))
        );
    }

    #[test]
    fn estimation_answers_scale_with_closeness() {
        let mut game = MatchState::new(0, players(), vec![estimation()], 1);
        game.begin(&timings(), Instant::now());
        fire_pending(&mut game);

        let close = game
            .submit_answer("ann", Some(10), Some(AnswerInput::Estimate { value: 50 }))
            .unwrap();
        assert_eq!(close.points_awarded, 505);

        let far = game
            .submit_answer("bob", Some(0), Some(AnswerInput::Estimate { value: 1000 }))
            .unwrap();
        assert_eq!(far.points_awarded, 0);
        assert_eq!(far.player.streak(), 0);
    }

    #[test]
    fn score_overwrite_rejects_unknown_or_negative() {
        let mut game = MatchState::new(0, players(), Vec::new(), 0);
        assert_eq!(game.set_player_score("ann", 5).unwrap().score(), 5);
        assert_eq!(
            game.set_player_score("zed", 5),
            Err(MatchError::PlayerNotFound("zed".into()))
        );
        assert_eq!(
            game.set_player_score("ann", -5),
            Err(MatchError::Player(PlayerError::NegativeScore(-5)))
        );
    }
}
