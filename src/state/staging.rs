//! Pre-match holding pen for players and questions.

use thiserror::Error;

use crate::state::{
    fingerprint::ChangeFingerprint,
    match_state::{MatchId, MatchState},
    player::{Player, PlayerError},
    question::Question,
};

/// Declined staging operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StagingError {
    /// The player itself is invalid.
    #[error(transparent)]
    Player(#[from] PlayerError),
    /// Another staged player already uses this name.
    #[error("player name `{0}` is already taken")]
    NameTaken(String),
}

/// Players and questions gathered for the next match.
#[derive(Debug, Clone)]
pub struct StagingArea {
    next_match_id: MatchId,
    players: Vec<Player>,
    questions: Vec<Question>,
    target_question_count: usize,
}

impl StagingArea {
    /// Empty staging area aiming for `target_question_count` questions.
    pub fn new(target_question_count: usize) -> Self {
        Self {
            next_match_id: 0,
            players: Vec::new(),
            questions: Vec::new(),
            target_question_count,
        }
    }

    /// Id the next flushed match will receive; waiting-room clients poll it.
    pub fn next_match_id(&self) -> MatchId {
        self.next_match_id
    }

    /// Staged players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Staged questions in supply order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Questions a match should start with.
    pub fn target_question_count(&self) -> usize {
        self.target_question_count
    }

    /// Whether enough questions are staged to start a match.
    pub fn is_ready(&self) -> bool {
        self.questions.len() >= self.target_question_count
    }

    /// Questions still needed before the staging area is ready.
    pub fn missing_questions(&self) -> usize {
        self.target_question_count
            .saturating_sub(self.questions.len())
    }

    /// Whether a staged player already uses `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.name() == name)
    }

    /// Append `player`, rejecting blank or already present names.
    pub fn join(&mut self, player: Player) -> Result<MatchId, StagingError> {
        if player.name().trim().is_empty() {
            return Err(PlayerError::EmptyName.into());
        }
        if self.contains_name(player.name()) {
            return Err(StagingError::NameTaken(player.name().to_string()));
        }
        self.players.push(player);
        Ok(self.next_match_id)
    }

    /// Remove a player equal to `player`; true if one was removed.
    pub fn leave(&mut self, player: &Player) -> bool {
        match self.players.iter().position(|p| p == player) {
            Some(index) => {
                self.players.remove(index);
                true
            }
            None => false,
        }
    }

    /// Staged player called `name`, if any.
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name() == name)
    }

    /// Stage `question` unless an equal one is already staged.
    pub fn add_question(&mut self, question: Question) -> bool {
        if self.questions.contains(&question) {
            return false;
        }
        self.questions.push(question);
        true
    }

    /// Hand the staged players and questions over to a new match in `LOADING`.
    ///
    /// Callers hold the staging lock across this call and the insertion of the
    /// match, so no join can land between the two.
    pub fn flush(&mut self) -> MatchState {
        let id = self.next_match_id;
        self.next_match_id = self.next_match_id.wrapping_add(1);

        let players = std::mem::take(&mut self.players);
        let questions = std::mem::take(&mut self.questions);
        MatchState::new(id, players, questions, self.target_question_count)
    }

    /// Fingerprint of the waiting room, delivered under [`Self::next_match_id`].
    pub fn fingerprint(&self) -> ChangeFingerprint {
        ChangeFingerprint::waiting(&self.players)
    }
}
