//! Players and their leaderboard order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected attempt to put a player into an impossible state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// Scores never go below zero.
    #[error("score cannot be negative (got {0})")]
    NegativeScore(i64),
    /// Streaks never go below zero.
    #[error("streak cannot be negative (got {0})")]
    NegativeStreak(i64),
    /// Names must contain at least one visible character.
    #[error("player name must not be empty")]
    EmptyName,
}

/// Participant of a staging area or a running match.
///
/// Equality follows the persisted identity (id, name and score); the streak is
/// match-local bookkeeping and is ignored when comparing players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Storage identity, assigned by the player store on first persistence.
    pub id: Option<u64>,
    name: String,
    score: u32,
    #[serde(skip)]
    streak: u32,
}

impl Player {
    /// Fresh player with a zero score.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            score: 0,
            streak: 0,
        }
    }

    /// Player carrying an existing score; negative scores are clamped to zero.
    pub fn with_score(id: Option<u64>, name: impl Into<String>, score: i64) -> Self {
        Self {
            id,
            name: name.into(),
            score: clamp_score(score),
            streak: 0,
        }
    }

    /// Display name, unique within a staging area.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cumulative score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Consecutive correct answers in the current match.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Rename the player, rejecting blank names.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), PlayerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PlayerError::EmptyName);
        }
        self.name = name;
        Ok(())
    }

    /// Overwrite the score. Negative values are rejected and leave the player untouched.
    pub fn set_score(&mut self, score: i64) -> Result<(), PlayerError> {
        if score < 0 {
            return Err(PlayerError::NegativeScore(score));
        }
        self.score = clamp_score(score);
        Ok(())
    }

    /// Overwrite the streak. Negative values are rejected and leave the player untouched.
    pub fn set_streak(&mut self, streak: i64) -> Result<(), PlayerError> {
        if streak < 0 {
            return Err(PlayerError::NegativeStreak(streak));
        }
        self.streak = u32::try_from(streak).unwrap_or(u32::MAX);
        Ok(())
    }

    /// Break the streak after a miss.
    pub fn reset_streak(&mut self) {
        self.streak = 0;
    }

    /// Extend the streak by one answer.
    pub fn increment_streak(&mut self) {
        self.streak = self.streak.saturating_add(1);
    }

    /// Add awarded points, saturating instead of overflowing.
    pub fn add_points(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name && self.score == other.score
    }
}

impl Eq for Player {}

fn clamp_score(score: i64) -> u32 {
    u32::try_from(score.max(0)).unwrap_or(u32::MAX)
}

/// Order players for leaderboards: highest score first, join order kept on ties.
pub fn sort_by_score_desc(players: &mut [Player]) {
    players.sort_by(|a, b| b.score.cmp(&a.score));
}
