//! DTO definitions used by the multiplayer REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dto::{format_system_time, validation::validate_player_name},
    state::{
        fingerprint::{ChangeFingerprint, ScreenPhase},
        match_state::{AnswerOutcome, MatchId, MatchState},
        player::Player,
        question::{AnswerInput, Question},
        state_machine::{MatchPhase, UnknownPhase},
    },
};

/// Public projection of a player exposed to REST clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlayerSummary {
    /// Storage identity, absent until the player is first persisted.
    pub id: Option<u64>,
    /// Display name.
    pub name: String,
    /// Cumulative score.
    pub score: u32,
    /// Consecutive correct answers in the match.
    pub streak: u32,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name().to_string(),
            score: player.score(),
            streak: player.streak(),
        }
    }
}

/// Result of a start attempt.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartResponse {
    /// False while fewer questions than the target are staged.
    pub started: bool,
    /// Id of the new match when one was started.
    pub match_id: Option<MatchId>,
}

/// Full state of a match, for clients joining late.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchSnapshot {
    /// Match id.
    pub id: MatchId,
    /// Current phase.
    #[schema(value_type = String, example = "QUESTION")]
    pub phase: MatchPhase,
    /// Index of the current question, `-1` before the first one.
    pub question_index: i32,
    /// Questions the match plays.
    pub question_count: usize,
    /// Roster in join order.
    pub players: Vec<PlayerSummary>,
    /// Questions, tagged by `type`.
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<Question>,
    /// Fingerprint a poll would currently return.
    pub fingerprint: ChangeFingerprint,
    /// Milliseconds until the scheduler fires the next step, if one is armed.
    pub next_step_in_ms: Option<u64>,
    /// RFC 3339 creation time.
    pub started_at: String,
}

impl From<&MatchState> for MatchSnapshot {
    fn from(game: &MatchState) -> Self {
        let now = tokio::time::Instant::now();
        Self {
            id: game.id(),
            phase: game.phase(),
            question_index: game.wire_question_index(),
            question_count: game.question_count(),
            players: game.players().iter().map(PlayerSummary::from).collect(),
            questions: game.questions().to_vec(),
            fingerprint: game.compute_fingerprint(),
            next_step_in_ms: game
                .pending_step()
                .map(|step| step.due_at.saturating_duration_since(now).as_millis() as u64),
            started_at: format_system_time(game.started_at()),
        }
    }
}

/// Payload naming a player, used to join, leave or check a name.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct PlayerNameRequest {
    /// Player name.
    #[validate(custom(function = validate_player_name))]
    pub name: String,
}

/// Response to a successful staging join.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinResponse {
    /// Id to poll while waiting; the next match is started under it.
    pub staging_id: MatchId,
}

/// Whether a leave request removed anybody.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemovedResponse {
    /// True when a player was removed.
    pub removed: bool,
}

/// Whether a name can still be used in the staging area.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsernameResponse {
    /// True when joining with the name would succeed.
    pub available: bool,
}

/// Client-computed score for a player of a match.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct ScoreRequest {
    /// Player whose score is set.
    #[validate(custom(function = validate_player_name))]
    pub name: String,
    /// New total; negative values are rejected.
    pub score: i64,
}

/// Answer to the current question of a match.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// Answering player.
    #[validate(custom(function = validate_player_name))]
    pub name: String,
    /// Seconds taken to answer; absent when the player timed out.
    #[serde(default)]
    pub elapsed_seconds: Option<u32>,
    /// `{"kind": "choice", "index": 2}` or `{"kind": "estimate", "value": 120}`.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub answer: Option<AnswerInput>,
}

/// Points earned by an answer and the updated player.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnswerResponse {
    /// Points added by the answer.
    pub points_awarded: u32,
    /// Player after scoring.
    pub player: PlayerSummary,
}

impl From<AnswerOutcome> for AnswerResponse {
    fn from(outcome: AnswerOutcome) -> Self {
        Self {
            points_awarded: outcome.points_awarded,
            player: PlayerSummary::from(&outcome.player),
        }
    }
}

/// Last fingerprint the polling client acted on, if it sends one.
///
/// When all three fields are given and differ from the current state, the
/// poll answers immediately instead of waiting.
#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PollQuery {
    /// Roster hash of the last fingerprint.
    pub roster_hash: Option<String>,
    /// Screen of the last fingerprint, e.g. `QUESTION`.
    pub phase: Option<String>,
    /// Question index of the last fingerprint.
    pub question_index: Option<i32>,
}

impl PollQuery {
    /// The fingerprint the client acted on, if every field was sent.
    ///
    /// A phase name outside the fixed set fails even when other fields are missing.
    pub fn known(self) -> Result<Option<ChangeFingerprint>, UnknownPhase> {
        let phase = self
            .phase
            .as_deref()
            .map(str::parse::<ScreenPhase>)
            .transpose()?;
        Ok(match (self.roster_hash, phase, self.question_index) {
            (Some(roster_hash), Some(phase), Some(question_index)) => Some(ChangeFingerprint {
                roster_hash,
                phase,
                question_index,
            }),
            _ => None,
        })
    }
}

impl From<&ChangeFingerprint> for PollQuery {
    fn from(fingerprint: &ChangeFingerprint) -> Self {
        Self {
            roster_hash: Some(fingerprint.roster_hash.clone()),
            phase: Some(fingerprint.phase.to_string()),
            question_index: Some(fingerprint.question_index),
        }
    }
}
