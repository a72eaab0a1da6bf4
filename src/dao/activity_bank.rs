//! Question supplier drawing from an in-memory list of activities.

use std::{collections::HashSet, fs, io::ErrorKind, path::Path, sync::Arc};

use futures::{FutureExt, future::BoxFuture};
use rand::{
    Rng, rng,
    seq::{IndexedRandom, SliceRandom},
};
use tracing::{info, warn};

use crate::{
    dao::{
        question_source::{QuestionKind, QuestionSource, SupplyError, SupplyResult},
        storage::{StorageError, StorageResult},
    },
    state::question::{
        Activity, ComparativeQuestion, EqualityQuestion, EstimationQuestion,
        MultipleChoiceQuestion, Question,
    },
};

/// Activities shown side by side in comparative and multiple-choice questions.
const CHOICE_ACTIVITIES: usize = 3;
/// Wrong options of an equality question.
const EQUALITY_DISTRACTORS: usize = 2;

/// Shared, read-only pool of activities.
#[derive(Debug, Clone, Default)]
pub struct ActivityBank {
    activities: Arc<Vec<Activity>>,
}

impl ActivityBank {
    /// Bank over `activities`.
    pub fn new(activities: Vec<Activity>) -> Self {
        Self {
            activities: Arc::new(activities),
        }
    }

    /// Load activities from a JSON array on disk. A missing file yields an empty bank.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "activity file not found; starting with an empty bank");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(StorageError::unavailable(
                    format!("failed to read {}", path.display()),
                    err,
                ));
            }
        };

        let activities: Vec<Activity> = serde_json::from_str(&contents)
            .map_err(|err| StorageError::Malformed(format!("{}: {err}", path.display())))?;
        info!(path = %path.display(), count = activities.len(), "loaded activity bank");
        Ok(Self::new(activities))
    }

    /// Number of activities.
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Whether no activity was loaded.
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    fn distinct_consumptions(&self) -> usize {
        self.activities
            .iter()
            .map(|a| a.consumption_wh)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Build a question synchronously; the thread-local rng never crosses an await.
    fn generate(&self, kind: QuestionKind) -> SupplyResult<Question> {
        let mut rng = rng();
        match kind {
            QuestionKind::Comparative => {
                let activities = self.pick_distinct(CHOICE_ACTIVITIES, &[], &mut rng)?;
                Ok(Question::Comparative(ComparativeQuestion::new(
                    activities,
                    rng.random_bool(0.5),
                )))
            }
            QuestionKind::MultipleChoice => {
                let mut activities = self.pick_distinct(CHOICE_ACTIVITIES, &[], &mut rng)?;
                let activity = activities.remove(0);
                let distractors = activities.iter().map(|a| a.consumption_wh).collect();
                Ok(Question::MultipleChoice(MultipleChoiceQuestion::new(
                    activity,
                    distractors,
                )))
            }
            QuestionKind::Estimation => {
                if self.activities.len() < 2 {
                    return Err(SupplyError::InsufficientData(kind));
                }
                let activity = self
                    .activities
                    .choose(&mut rng)
                    .cloned()
                    .ok_or(SupplyError::InsufficientData(kind))?;
                Ok(Question::Estimation(EstimationQuestion { activity }))
            }
            QuestionKind::Equality => self.equality(&mut rng),
        }
    }

    fn equality(&self, rng: &mut impl Rng) -> SupplyResult<Question> {
        let insufficient = SupplyError::InsufficientData(QuestionKind::Equality);
        if self.activities.len() <= EQUALITY_DISTRACTORS + 2 {
            return Err(insufficient);
        }

        let twins: Vec<(&Activity, &Activity)> = self
            .activities
            .iter()
            .flat_map(|a| {
                self.activities
                    .iter()
                    .filter(move |b| b.id != a.id && b.consumption_wh == a.consumption_wh)
                    .map(move |b| (a, b))
            })
            .collect();
        let Some((chosen, correct)) = twins.choose(rng).copied() else {
            return Err(insufficient);
        };

        let distractors = self.pick_distinct(EQUALITY_DISTRACTORS, &[chosen.consumption_wh], rng)?;
        let answer_index = rng.random_range(0..=distractors.len());
        EqualityQuestion::new(chosen.clone(), correct.clone(), distractors, answer_index)
            .map(Question::Equality)
            .map_err(|_| insufficient)
    }

    /// `count` random activities with pairwise distinct consumptions, none in `excluded`.
    fn pick_distinct(
        &self,
        count: usize,
        excluded: &[i64],
        rng: &mut impl Rng,
    ) -> SupplyResult<Vec<Activity>> {
        let kind = if excluded.is_empty() {
            QuestionKind::Comparative
        } else {
            QuestionKind::Equality
        };
        if self.distinct_consumptions() <= count {
            return Err(SupplyError::InsufficientData(kind));
        }

        let mut pool: Vec<&Activity> = self.activities.iter().collect();
        pool.shuffle(rng);

        let mut seen: HashSet<i64> = excluded.iter().copied().collect();
        let picked: Vec<Activity> = pool
            .into_iter()
            .filter(|a| seen.insert(a.consumption_wh))
            .take(count)
            .cloned()
            .collect();

        if picked.len() < count {
            return Err(SupplyError::InsufficientData(kind));
        }
        Ok(picked)
    }
}

impl QuestionSource for ActivityBank {
    fn random_question(&self) -> BoxFuture<'static, SupplyResult<Question>> {
        let kind = QuestionKind::ALL
            .choose(&mut rng())
            .copied()
            .unwrap_or(QuestionKind::Estimation);
        self.question_of_kind(kind)
    }

    fn question_of_kind(&self, kind: QuestionKind) -> BoxFuture<'static, SupplyResult<Question>> {
        futures::future::ready(self.generate(kind)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, consumption_wh: i64) -> Activity {
        Activity {
            id: id.into(),
            title: format!("activity {id}"),
            image_path: None,
            consumption_wh,
            source: None,
        }
    }

    fn bank() -> ActivityBank {
        ActivityBank::new(vec![
            activity("a", 10),
            activity("b", 20),
            activity("c", 30),
            activity("d", 40),
            activity("e", 10),
            activity("f", 50),
        ])
    }

    #[tokio::test]
    async fn every_variant_can_be_built() {
        let bank = bank();
        for kind in QuestionKind::ALL {
            let question = bank.question_of_kind(kind).await.unwrap();
            let matches = matches!(
                (kind, &question),
                (QuestionKind::Comparative, Question::Comparative(_))
                    | (QuestionKind::MultipleChoice, Question::MultipleChoice(_))
                    | (QuestionKind::Equality, Question::Equality(_))
                    | (QuestionKind::Estimation, Question::Estimation(_))
            );
            assert!(matches, "{kind} produced {question:?}");
        }
    }

    #[tokio::test]
    async fn comparative_activities_have_distinct_consumptions() {
        let bank = bank();
        for _ in 0..20 {
            let Question::Comparative(q) = bank
                .question_of_kind(QuestionKind::Comparative)
                .await
                .unwrap()
            else {
                panic!("wrong variant");
            };
            let distinct: HashSet<_> = q.activities.iter().map(|a| a.consumption_wh).collect();
            assert_eq!(distinct.len(), 3);
            assert!(q.correct_answer >= 0);
        }
    }

    #[tokio::test]
    async fn equality_pairs_twins() {
        let bank = bank();
        for _ in 0..20 {
            let Question::Equality(q) = bank
                .question_of_kind(QuestionKind::Equality)
                .await
                .unwrap()
            else {
                panic!("wrong variant");
            };
            let index = usize::try_from(q.correct_answer).unwrap();
            let correct = &q.activities[index];
            assert_eq!(correct.consumption_wh, q.chosen.consumption_wh);
            assert_ne!(correct.id, q.chosen.id);
            let matching = q
                .activities
                .iter()
                .filter(|a| a.consumption_wh == q.chosen.consumption_wh)
                .count();
            assert_eq!(matching, 1);
        }
    }

    #[tokio::test]
    async fn small_banks_report_insufficient_data() {
        let bank = ActivityBank::new(vec![activity("a", 1), activity("b", 2)]);
        assert!(matches!(
            bank.question_of_kind(QuestionKind::Comparative).await,
            Err(SupplyError::InsufficientData(_))
        ));
        assert!(matches!(
            bank.question_of_kind(QuestionKind::Equality).await,
            Err(SupplyError::InsufficientData(QuestionKind::Equality))
        ));
        assert!(bank.question_of_kind(QuestionKind::Estimation).await.is_ok());

        let empty = ActivityBank::default();
        assert!(empty.random_question().await.is_err());
    }

    #[test]
    fn missing_file_gives_empty_bank() {
        let bank = ActivityBank::load(Path::new("does/not/exist.json")).unwrap();
        assert!(bank.is_empty());
    }
}
