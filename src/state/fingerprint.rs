//! Compact "what changed" summaries handed to polling clients.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use utoipa::ToSchema;

use crate::state::{
    player::Player,
    state_machine::{MatchPhase, UnknownPhase},
};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Screen a client should present; the match phases plus the waiting room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum ScreenPhase {
    /// Players are gathering in the staging area.
    Waiting,
    /// A match has been created and is about to show its first question.
    Loading,
    /// A question is on screen.
    Question,
    /// Intermediate scores are on screen.
    Leaderboard,
    /// The match is over.
    End,
}

impl ScreenPhase {
    /// Wire name of the screen.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenPhase::Waiting => "WAITING",
            ScreenPhase::Loading => MatchPhase::Loading.as_str(),
            ScreenPhase::Question => MatchPhase::Question.as_str(),
            ScreenPhase::Leaderboard => MatchPhase::Leaderboard.as_str(),
            ScreenPhase::End => MatchPhase::End.as_str(),
        }
    }
}

impl From<MatchPhase> for ScreenPhase {
    fn from(phase: MatchPhase) -> Self {
        match phase {
            MatchPhase::Loading => ScreenPhase::Loading,
            MatchPhase::Question => ScreenPhase::Question,
            MatchPhase::Leaderboard => ScreenPhase::Leaderboard,
            MatchPhase::End => ScreenPhase::End,
        }
    }
}

impl fmt::Display for ScreenPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScreenPhase {
    type Err = UnknownPhase;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "WAITING" {
            return Ok(ScreenPhase::Waiting);
        }
        value.parse::<MatchPhase>().map(Into::into)
    }
}

/// Roster hash, screen and question index of a match (or of the waiting room).
///
/// Two fingerprints are equal iff all three fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct ChangeFingerprint {
    /// Hash of the ordered player list, 16 lowercase hex characters.
    pub roster_hash: String,
    /// Screen to present.
    #[schema(value_type = String, example = "QUESTION")]
    pub phase: ScreenPhase,
    /// Index of the question on screen, `-1` before the first one.
    pub question_index: i32,
}

/// Which parts of the client view need refreshing after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerprintChanges {
    /// Players joined, left or changed score.
    pub roster_changed: bool,
    /// The phase or question index moved on.
    pub screen_changed: bool,
}

impl FingerprintChanges {
    /// Whether the client has anything to refresh.
    pub fn any(&self) -> bool {
        self.roster_changed || self.screen_changed
    }
}

impl ChangeFingerprint {
    /// Fingerprint of `players` on `phase` at `question_index`.
    pub fn new(players: &[Player], phase: ScreenPhase, question_index: i32) -> Self {
        Self {
            roster_hash: roster_hash(players),
            phase,
            question_index,
        }
    }

    /// Fingerprint of a staging area roster.
    pub fn waiting(players: &[Player]) -> Self {
        Self::new(players, ScreenPhase::Waiting, -1)
    }

    /// Compare against the last fingerprint a client acted on.
    pub fn changes_since(&self, previous: Option<&ChangeFingerprint>) -> FingerprintChanges {
        match previous {
            None => FingerprintChanges {
                roster_changed: true,
                screen_changed: true,
            },
            Some(previous) => FingerprintChanges {
                roster_changed: self.roster_hash != previous.roster_hash,
                screen_changed: self.phase != previous.phase
                    || self.question_index != previous.question_index,
            },
        }
    }
}

/// Deterministic FNV-1a hash of the ordered roster (`id|len:name|score|streak;` per player).
pub fn roster_hash(players: &[Player]) -> String {
    let mut hash = FNV_OFFSET;
    for player in players {
        let id = player
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let name = player.name();
        let encoded = format!(
            "{}|{}:{}|{}|{};",
            id,
            name.len(),
            name,
            player.score(),
            player.streak()
        );
        for byte in encoded.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    format!("{hash:016x}")
}
