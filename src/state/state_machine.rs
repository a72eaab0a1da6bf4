//! Forward-only phase machine of a match.

use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

/// Phases a live match moves through.
///
/// `Loading -> (Question -> Leaderboard)* -> End`; `End` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum MatchPhase {
    /// Match created, clients are switching to the game screen.
    Loading,
    /// A question is being answered.
    Question,
    /// Scores are shown between two questions.
    Leaderboard,
    /// All questions were played.
    End,
}

impl MatchPhase {
    /// Wire name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::Loading => "LOADING",
            MatchPhase::Question => "QUESTION",
            MatchPhase::Leaderboard => "LEADERBOARD",
            MatchPhase::End => "END",
        }
    }

    /// Whether no further transition is accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchPhase::End)
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a phase name is not part of the fixed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown match phase `{0}`")]
pub struct UnknownPhase(pub String);

impl FromStr for MatchPhase {
    type Err = UnknownPhase;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LOADING" => Ok(MatchPhase::Loading),
            "QUESTION" => Ok(MatchPhase::Question),
            "LEADERBOARD" => Ok(MatchPhase::Leaderboard),
            "END" => Ok(MatchPhase::End),
            other => Err(UnknownPhase(other.to_string())),
        }
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchEvent {
    /// Put the next question on screen.
    AdvanceQuestion,
    /// Show scores after a question.
    ShowLeaderboard,
    /// No questions left; close the match.
    Finish,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: MatchPhase,
    /// The event that cannot be applied from this phase.
    pub event: MatchEvent,
}

/// Forward-only phase tracker of one match.
#[derive(Debug, Clone)]
pub struct MatchStateMachine {
    phase: MatchPhase,
}

impl Default for MatchStateMachine {
    fn default() -> Self {
        Self {
            phase: MatchPhase::Loading,
        }
    }
}

impl MatchStateMachine {
    /// Create a new state machine initialised in the loading phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(next)
    }

    /// Move to `target`, which must be reachable in one forward step.
    pub fn advance_to(&mut self, target: MatchPhase) -> Result<MatchPhase, InvalidTransition> {
        let event = match target {
            MatchPhase::Question => MatchEvent::AdvanceQuestion,
            MatchPhase::Leaderboard => MatchEvent::ShowLeaderboard,
            MatchPhase::End => MatchEvent::Finish,
            // Nothing leads back to loading; report it against the closest event.
            MatchPhase::Loading => {
                return Err(InvalidTransition {
                    from: self.phase,
                    event: MatchEvent::AdvanceQuestion,
                });
            }
        };
        self.apply(event)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (MatchPhase::Loading, MatchEvent::AdvanceQuestion)
            | (MatchPhase::Leaderboard, MatchEvent::AdvanceQuestion) => MatchPhase::Question,
            (MatchPhase::Question, MatchEvent::ShowLeaderboard) => MatchPhase::Leaderboard,
            (MatchPhase::Loading, MatchEvent::Finish)
            | (MatchPhase::Leaderboard, MatchEvent::Finish) => MatchPhase::End,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
