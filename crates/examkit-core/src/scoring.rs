//! Scoring: per-question verdicts, score, grade and pass/fail.
//!
//! Two strategies, chosen per question set:
//! - local: every question carries a `correct_answer`, compared
//!   case-insensitively after trimming;
//! - remote: otherwise the whole batch goes to a [`RemoteScorer`] and its
//!   verdicts are adopted verbatim.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::answers::AnswerStore;
use crate::error::ExamError;
use crate::model::{Question, QuestionId};
use crate::traits::{RemoteScorer, ScoreRequest};

/// Minimum score (percent) for a pass.
pub const PASS_THRESHOLD: f64 = 50.0;

/// Grade thresholds, highest first. Anything below the last one is a D.
pub const GRADE_THRESHOLDS: [(f64, Grade); 3] =
    [(90.0, Grade::A), (75.0, Grade::B), (50.0, Grade::C)];

/// Per-question outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn is_correct(self) -> bool {
        self == Verdict::Correct
    }

    /// Parse a verdict label as scoring services spell it.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "correct" | "right" | "true" => Some(Verdict::Correct),
            "incorrect" | "wrong" | "false" => Some(Verdict::Incorrect),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Correct => write!(f, "Correct"),
            Verdict::Incorrect => write!(f, "Incorrect"),
        }
    }
}

/// Coarse grade derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(score_percent: f64) -> Self {
        GRADE_THRESHOLDS
            .iter()
            .find(|(min, _)| score_percent >= *min)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::D)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassStatus {
    Passed,
    Failed,
}

impl PassStatus {
    pub fn from_score(score_percent: f64) -> Self {
        if score_percent >= PASS_THRESHOLD {
            PassStatus::Passed
        } else {
            PassStatus::Failed
        }
    }
}

impl fmt::Display for PassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassStatus::Passed => write!(f, "Passed"),
            PassStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Which strategy produced the verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPath {
    Local,
    Remote,
}

/// Final outcome of an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub per_question: BTreeMap<QuestionId, Verdict>,
    pub correct_count: usize,
    pub total_questions: usize,
    /// In `[0, 100]`.
    pub score_percent: f64,
    pub grade: Grade,
    pub status: PassStatus,
    pub scored_by: ScoringPath,
}

impl ExamResult {
    /// Aggregate verdicts for `questions`.
    ///
    /// Every question must have a verdict; verdicts for unknown ids are dropped.
    pub fn from_verdicts(
        questions: &[Question],
        mut verdicts: BTreeMap<QuestionId, Verdict>,
        scored_by: ScoringPath,
    ) -> Result<Self, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::EmptyQuestionSet);
        }

        let mut per_question = BTreeMap::new();
        for q in questions {
            let verdict = verdicts.remove(q.id.as_str()).ok_or_else(|| {
                ExamError::InvalidResponseFormat(format!("missing verdict for question {}", q.id))
            })?;
            per_question.insert(q.id.clone(), verdict);
        }
        if !verdicts.is_empty() {
            tracing::warn!(
                extra = verdicts.len(),
                "ignoring verdicts for questions not in the exam"
            );
        }

        let correct_count = per_question.values().filter(|v| v.is_correct()).count();
        let total_questions = questions.len();
        let score_percent = score_percent(correct_count, total_questions)?;

        Ok(Self {
            per_question,
            correct_count,
            total_questions,
            score_percent,
            grade: Grade::from_score(score_percent),
            status: PassStatus::from_score(score_percent),
            scored_by,
        })
    }

    pub fn verdict(&self, id: &str) -> Option<Verdict> {
        self.per_question.get(id).copied()
    }

    pub fn passed(&self) -> bool {
        self.status == PassStatus::Passed
    }
}

/// `100 * correct / total`, refusing an empty exam.
pub fn score_percent(correct: usize, total: usize) -> Result<f64, ExamError> {
    if total == 0 {
        return Err(ExamError::EmptyQuestionSet);
    }
    Ok(100.0 * correct as f64 / total as f64)
}

/// Case-insensitive, whitespace-trimmed exact comparison.
pub fn answers_match(expected: &str, given: &str) -> bool {
    expected.trim().to_lowercase() == given.trim().to_lowercase()
}

/// Verdict for one question from its local answer key.
///
/// `None` when the question has no key. An absent answer is always incorrect.
pub fn local_verdict(question: &Question, answer: Option<&str>) -> Option<Verdict> {
    let expected = question.correct_answer.as_deref()?;
    let verdict = match answer {
        Some(given) if answers_match(expected, given) => Verdict::Correct,
        _ => Verdict::Incorrect,
    };
    Some(verdict)
}

/// Scores a finished exam, locally when possible, remotely otherwise.
#[derive(Clone, Default)]
pub struct Evaluator {
    remote: Option<Arc<dyn RemoteScorer>>,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("remote", &self.remote.as_ref().map(|r| r.name().to_string()))
            .finish()
    }
}

impl Evaluator {
    /// Local answer keys only.
    pub fn local() -> Self {
        Self::default()
    }

    /// Fall back to `remote` for question sets without complete answer keys.
    pub fn with_remote(remote: Arc<dyn RemoteScorer>) -> Self {
        Self {
            remote: Some(remote),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Local iff every question carries a correct answer.
    pub fn path_for(&self, questions: &[Question]) -> ScoringPath {
        if questions.iter().all(|q| q.correct_answer.is_some()) {
            ScoringPath::Local
        } else {
            ScoringPath::Remote
        }
    }

    /// Score `answers` against `questions`.
    #[instrument(skip_all, fields(questions = questions.len(), answered = answers.count()))]
    pub async fn evaluate(
        &self,
        questions: &[Question],
        answers: &AnswerStore,
        user_id: Option<&str>,
    ) -> Result<ExamResult, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::EmptyQuestionSet);
        }

        match self.path_for(questions) {
            ScoringPath::Local => Self::evaluate_local(questions, answers),
            ScoringPath::Remote => self.evaluate_remote(questions, answers, user_id).await,
        }
    }

    /// Score using the questions' own answer keys.
    pub fn evaluate_local(
        questions: &[Question],
        answers: &AnswerStore,
    ) -> Result<ExamResult, ExamError> {
        let verdicts = questions
            .iter()
            .map(|q| {
                local_verdict(q, answers.lookup(q.id.as_str()))
                    .map(|v| (q.id.clone(), v))
                    .ok_or_else(|| ExamError::InvalidQuestion {
                        id: q.id.to_string(),
                        reason: "no correct answer for local scoring".into(),
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        ExamResult::from_verdicts(questions, verdicts, ScoringPath::Local)
    }

    async fn evaluate_remote(
        &self,
        questions: &[Question],
        answers: &AnswerStore,
        user_id: Option<&str>,
    ) -> Result<ExamResult, ExamError> {
        let Some(remote) = &self.remote else {
            return Err(ExamError::SubmissionFailed(
                "questions have no answer key and no scoring service is configured".into(),
            ));
        };

        let request = ScoreRequest {
            user_id: user_id.map(str::to_string),
            answers: answers.clone(),
            questions: questions.to_vec(),
        };

        tracing::info!(scorer = remote.name(), "delegating scoring");
        let response = remote.score(&request).await.map_err(classify_remote_error)?;

        ExamResult::from_verdicts(questions, response.verdicts, ScoringPath::Remote)
    }
}

/// Keep a collaborator's own classification, otherwise treat it as a failed submission.
fn classify_remote_error(err: anyhow::Error) -> ExamError {
    match err.downcast_ref::<ExamError>() {
        Some(exam_error) => exam_error.clone(),
        None => ExamError::SubmissionFailed(format!("{err:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;
    use crate::traits::ScoreResponse;
    use async_trait::async_trait;

    fn keyed(id: &str, answer: &str) -> Question {
        Question::new(id, format!("question {id}"), QuestionKind::ShortAnswer)
            .with_correct_answer(answer)
    }

    fn answers(pairs: &[(&str, &str)]) -> AnswerStore {
        let mut store = AnswerStore::new();
        for (id, value) in pairs {
            store.set((*id).into(), *value);
        }
        store
    }

    struct FixedScorer(anyhow::Result<ScoreResponse>);

    #[async_trait]
    impl RemoteScorer for FixedScorer {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn score(&self, _request: &ScoreRequest) -> anyhow::Result<ScoreResponse> {
            match &self.0 {
                Ok(r) => Ok(r.clone()),
                Err(e) => match e.downcast_ref::<ExamError>() {
                    Some(exam) => Err(exam.clone().into()),
                    None => Err(anyhow::anyhow!("{e}")),
                },
            }
        }
    }

    #[test]
    fn grade_thresholds_in_order() {
        assert_eq!(Grade::from_score(100.0), Grade::A);
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.9), Grade::B);
        assert_eq!(Grade::from_score(75.0), Grade::B);
        assert_eq!(Grade::from_score(74.9), Grade::C);
        assert_eq!(Grade::from_score(50.0), Grade::C);
        assert_eq!(Grade::from_score(49.9), Grade::D);
        assert_eq!(Grade::from_score(0.0), Grade::D);
    }

    #[test]
    fn pass_threshold_inclusive() {
        assert_eq!(PassStatus::from_score(50.0), PassStatus::Passed);
        assert_eq!(PassStatus::from_score(49.99), PassStatus::Failed);
    }

    #[test]
    fn match_ignores_case_and_surrounding_whitespace() {
        assert!(answers_match("paris ", "Paris"));
        assert!(answers_match("  New York", "new york  "));
        assert!(!answers_match("New York", "NewYork"));
    }

    #[test]
    fn local_case_insensitive_match_scores_full() {
        let questions = vec![keyed("1", "paris ")];
        let result = Evaluator::evaluate_local(&questions, &answers(&[("1", "Paris")])).unwrap();
        assert_eq!(result.verdict("1"), Some(Verdict::Correct));
        assert_eq!(result.score_percent, 100.0);
        assert_eq!(result.grade, Grade::A);
        assert!(result.passed());
    }

    #[test]
    fn absent_answer_is_incorrect() {
        let questions = vec![keyed("1", "x"), keyed("2", "")];
        let result = Evaluator::evaluate_local(&questions, &AnswerStore::new()).unwrap();
        assert_eq!(result.verdict("1"), Some(Verdict::Incorrect));
        assert_eq!(result.verdict("2"), Some(Verdict::Incorrect));
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.status, PassStatus::Failed);
    }

    #[test]
    fn partial_score_and_grade() {
        let questions = vec![keyed("1", "a"), keyed("2", "b"), keyed("3", "c"), keyed("4", "d")];
        let result = Evaluator::evaluate_local(
            &questions,
            &answers(&[("1", "a"), ("2", "b"), ("3", "c"), ("4", "x")]),
        )
        .unwrap();
        assert_eq!(result.correct_count, 3);
        assert_eq!(result.score_percent, 75.0);
        assert_eq!(result.grade, Grade::B);
        assert_eq!(result.status, PassStatus::Passed);
    }

    #[tokio::test]
    async fn zero_questions_fail_fast() {
        let err = Evaluator::local()
            .evaluate(&[], &AnswerStore::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err, ExamError::EmptyQuestionSet);
        assert!(score_percent(0, 0).is_err());
    }

    #[tokio::test]
    async fn missing_key_without_remote_fails_submission() {
        let questions = vec![keyed("1", "a"), Question::new("2", "free", QuestionKind::Essay)];
        let err = Evaluator::local()
            .evaluate(&questions, &AnswerStore::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamError::SubmissionFailed(_)));
    }

    #[tokio::test]
    async fn remote_verdicts_adopted_for_whole_batch() {
        let questions = vec![keyed("1", "a"), Question::new("2", "free", QuestionKind::Essay)];
        let mut verdicts = BTreeMap::new();
        // The local key would say Correct; the remote verdict wins.
        verdicts.insert(QuestionId::from("1"), Verdict::Incorrect);
        verdicts.insert(QuestionId::from("2"), Verdict::Correct);
        verdicts.insert(QuestionId::from("99"), Verdict::Correct);
        let evaluator =
            Evaluator::with_remote(Arc::new(FixedScorer(Ok(ScoreResponse { verdicts }))));

        assert_eq!(evaluator.path_for(&questions), ScoringPath::Remote);
        let result = evaluator
            .evaluate(&questions, &answers(&[("1", "a")]), Some("u"))
            .await
            .unwrap();
        assert_eq!(result.scored_by, ScoringPath::Remote);
        assert_eq!(result.verdict("1"), Some(Verdict::Incorrect));
        assert_eq!(result.verdict("2"), Some(Verdict::Correct));
        assert_eq!(result.per_question.len(), 2);
        assert_eq!(result.score_percent, 50.0);
    }

    #[tokio::test]
    async fn remote_missing_verdict_is_invalid_format() {
        let questions = vec![Question::new("1", "free", QuestionKind::Essay)];
        let evaluator = Evaluator::with_remote(Arc::new(FixedScorer(Ok(ScoreResponse::default()))));
        let err = evaluator
            .evaluate(&questions, &AnswerStore::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamError::InvalidResponseFormat(_)));
    }

    #[tokio::test]
    async fn remote_transport_error_is_submission_failed() {
        let questions = vec![Question::new("1", "free", QuestionKind::Essay)];
        let evaluator = Evaluator::with_remote(Arc::new(FixedScorer(Err(anyhow::anyhow!(
            "connection refused"
        )))));
        let err = evaluator
            .evaluate(&questions, &AnswerStore::new(), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ExamError::SubmissionFailed("connection refused".into())
        );
    }

    #[tokio::test]
    async fn remote_exam_error_classification_preserved() {
        let questions = vec![Question::new("1", "free", QuestionKind::Essay)];
        let evaluator = Evaluator::with_remote(Arc::new(FixedScorer(Err(
            ExamError::InvalidResponseFormat("no validation map".into()).into(),
        ))));
        let err = evaluator
            .evaluate(&questions, &AnswerStore::new(), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ExamError::InvalidResponseFormat("no validation map".into())
        );
    }

    #[test]
    fn verdict_labels() {
        assert_eq!(Verdict::from_label("Correct"), Some(Verdict::Correct));
        assert_eq!(Verdict::from_label(" incorrect "), Some(Verdict::Incorrect));
        assert_eq!(Verdict::from_label("maybe"), None);
        assert_eq!(
            serde_json::to_string(&Verdict::Correct).unwrap(),
            "\"Correct\""
        );
    }
}
