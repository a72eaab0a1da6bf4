//! Question variants served during a match.
//!
//! Questions travel as an internally tagged enum: the `type` field names the
//! variant and the remaining fields are the variant payload.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::scoring::estimation_quality;

/// Activity with a known energy consumption, the raw material of every question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Catalogue identifier.
    pub id: String,
    /// Text shown to players.
    pub title: String,
    /// Picture of the activity, relative to the client asset root.
    #[serde(default)]
    pub image_path: Option<String>,
    /// Energy used by the activity, in watt-hours.
    pub consumption_wh: i64,
    /// Where the consumption figure comes from.
    #[serde(default)]
    pub source: Option<String>,
}

/// Invalid question construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    /// The correct activity cannot be inserted at the requested position.
    #[error("answer index {index} is out of bounds for {len} distractors")]
    AnswerIndexOutOfBounds {
        /// Requested insertion index.
        index: usize,
        /// Number of distractors available.
        len: usize,
    },
}

/// "Which of these activities uses the most (or least) energy?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparativeQuestion {
    /// Activities to compare.
    pub activities: Vec<Activity>,
    /// Ask for the highest consumption when true, the lowest otherwise.
    pub is_most: bool,
    /// Index of the correct activity, `-1` when there is nothing to compare.
    pub correct_answer: i32,
}

impl ComparativeQuestion {
    /// Build the question and locate its answer; ties go to the first activity.
    pub fn new(activities: Vec<Activity>, is_most: bool) -> Self {
        let correct_answer = extreme_index(&activities, is_most)
            .and_then(|index| i32::try_from(index).ok())
            .unwrap_or(-1);
        Self {
            activities,
            is_most,
            correct_answer,
        }
    }
}

/// First index holding the highest (or lowest) consumption.
fn extreme_index(activities: &[Activity], is_most: bool) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (index, activity) in activities.iter().enumerate() {
        let better = match best {
            None => true,
            Some((_, current)) if is_most => activity.consumption_wh > current,
            Some((_, current)) => activity.consumption_wh < current,
        };
        if better {
            best = Some((index, activity.consumption_wh));
        }
    }
    best.map(|(index, _)| index)
}

/// "How much energy does this activity use?" with numeric options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    /// Activity whose consumption is asked for.
    pub activity: Activity,
    /// Distractors plus the true value, sorted ascending.
    pub options: Vec<i64>,
    /// Index of the true value in `options`.
    pub correct_answer: i32,
}

impl MultipleChoiceQuestion {
    /// Mix the true value into `distractors` and sort the options.
    pub fn new(activity: Activity, distractors: Vec<i64>) -> Self {
        let mut options = distractors;
        options.push(activity.consumption_wh);
        options.sort_unstable();

        let correct_answer = options
            .iter()
            .position(|value| *value == activity.consumption_wh)
            .and_then(|index| i32::try_from(index).ok())
            .unwrap_or(-1);

        Self {
            activity,
            options,
            correct_answer,
        }
    }
}

/// "Which activity uses as much energy as the chosen one?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualityQuestion {
    /// Reference activity.
    pub chosen: Activity,
    /// Candidates, one of which matches the reference consumption.
    pub activities: Vec<Activity>,
    /// Index of the matching candidate.
    pub correct_answer: i32,
}

impl EqualityQuestion {
    /// Insert `correct` among `distractors` at `answer_index`.
    pub fn new(
        chosen: Activity,
        correct: Activity,
        distractors: Vec<Activity>,
        answer_index: usize,
    ) -> Result<Self, QuestionError> {
        if answer_index > distractors.len() {
            return Err(QuestionError::AnswerIndexOutOfBounds {
                index: answer_index,
                len: distractors.len(),
            });
        }

        let correct_answer =
            i32::try_from(answer_index).map_err(|_| QuestionError::AnswerIndexOutOfBounds {
                index: answer_index,
                len: distractors.len(),
            })?;
        let mut activities = distractors;
        activities.insert(answer_index, correct);

        Ok(Self {
            chosen,
            activities,
            correct_answer,
        })
    }
}

/// Free-form numeric estimate of one activity's consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationQuestion {
    /// Activity to estimate.
    pub activity: Activity,
}

/// Closed set of question variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    /// Pick the most or least consuming activity.
    Comparative(ComparativeQuestion),
    /// Pick the right consumption among numeric options.
    MultipleChoice(MultipleChoiceQuestion),
    /// Pick the activity consuming as much as the chosen one.
    Equality(EqualityQuestion),
    /// Guess a consumption; closeness drives the score.
    Estimation(EstimationQuestion),
}

/// What a player submitted for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerInput {
    /// Index of the selected option.
    Choice {
        /// Selected option.
        index: i32,
    },
    /// Numeric estimate in watt-hours.
    Estimate {
        /// Estimated consumption.
        value: i64,
    },
}

impl Question {
    /// Discrete correct answer, if the variant has one.
    pub fn correct_answer(&self) -> Option<i32> {
        match self {
            Question::Comparative(q) => Some(q.correct_answer),
            Question::MultipleChoice(q) => Some(q.correct_answer),
            Question::Equality(q) => Some(q.correct_answer),
            Question::Estimation(_) => None,
        }
    }

    /// Quality factor earned by `answer`, or `None` when it counts as a miss.
    pub fn evaluate(&self, answer: AnswerInput) -> Option<f64> {
        match (self, answer) {
            (Question::Estimation(q), AnswerInput::Estimate { value }) => {
                let quality = estimation_quality(value, q.activity.consumption_wh);
                (quality > 0.0).then_some(quality)
            }
            (Question::Estimation(_), AnswerInput::Choice { .. }) => None,
            (_, AnswerInput::Choice { index }) => {
                let correct = self.correct_answer()?;
                (correct >= 0 && correct == index).then_some(1.0)
            }
            (_, AnswerInput::Estimate { .. }) => None,
        }
    }
}
