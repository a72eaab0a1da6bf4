use std::fmt;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::{dao::storage::StorageError, state::question::Question};

/// Question variant a supplier can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    /// See [`Question::Comparative`].
    Comparative,
    /// See [`Question::MultipleChoice`].
    MultipleChoice,
    /// See [`Question::Equality`].
    Equality,
    /// See [`Question::Estimation`].
    Estimation,
}

impl QuestionKind {
    /// Every variant, in draw order.
    pub const ALL: [QuestionKind; 4] = [
        QuestionKind::Comparative,
        QuestionKind::Estimation,
        QuestionKind::MultipleChoice,
        QuestionKind::Equality,
    ];
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionKind::Comparative => "comparative",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::Equality => "equality",
            QuestionKind::Estimation => "estimation",
        };
        f.write_str(name)
    }
}

/// Result alias for question supply.
pub type SupplyResult<T> = Result<T, SupplyError>;

/// Why no question could be produced.
#[derive(Debug, Error)]
pub enum SupplyError {
    /// The backing store lacks enough distinct activities for this variant.
    #[error("not enough distinct activities to build a {0} question")]
    InsufficientData(QuestionKind),
    /// The supply loop gave up after too many consecutive failures.
    #[error("question supply exhausted after {attempts} attempts")]
    Exhausted {
        /// Failed draws in a row.
        attempts: u32,
    },
    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Black-box producer of question objects.
pub trait QuestionSource: Send + Sync {
    /// One random question of an arbitrary variant.
    fn random_question(&self) -> BoxFuture<'static, SupplyResult<Question>>;
    /// One random question of the requested variant.
    fn question_of_kind(&self, kind: QuestionKind) -> BoxFuture<'static, SupplyResult<Question>>;
}
