//! Mock collaborators for testing sessions without a backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use examkit_core::model::{Question, QuestionId};
use examkit_core::scoring::Verdict;
use examkit_core::traits::{
    QuestionRequest, QuestionSource, RemoteScorer, ScoreRequest, ScoreResponse,
};

use crate::error::ProviderError;

/// A question source returning a canned list, or failing on demand.
pub struct MockQuestionSource {
    questions: Vec<Question>,
    /// Failure message returned instead of questions.
    failure: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<QuestionRequest>>,
}

impl MockQuestionSource {
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions,
            failure: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A source whose every fetch fails with a network error.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::with_questions(vec![])
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<QuestionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl QuestionSource for MockQuestionSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        match &self.failure {
            Some(message) => Err(ProviderError::NetworkError(message.clone()).into()),
            None => Ok(self.questions.clone()),
        }
    }
}

/// How a [`MockScorer`] decides verdicts.
enum ScoringMode {
    /// The same verdict for every question.
    Uniform(Verdict),
    /// Fixed verdicts keyed by id; missing ids are omitted from the response.
    Fixed(BTreeMap<QuestionId, Verdict>),
    /// Correct iff the answer contains the keyword.
    Keyword(String),
    Failing(String),
}

/// A scoring service with canned verdicts.
pub struct MockScorer {
    mode: ScoringMode,
    call_count: AtomicU32,
    last_request: Mutex<Option<ScoreRequest>>,
}

impl MockScorer {
    fn with_mode(mode: ScoringMode) -> Self {
        Self {
            mode,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Every question gets `verdict`.
    pub fn uniform(verdict: Verdict) -> Self {
        Self::with_mode(ScoringMode::Uniform(verdict))
    }

    pub fn with_verdicts(verdicts: BTreeMap<QuestionId, Verdict>) -> Self {
        Self::with_mode(ScoringMode::Fixed(verdicts))
    }

    /// Answers containing `keyword` (case-insensitive) are correct.
    pub fn keyword(keyword: &str) -> Self {
        Self::with_mode(ScoringMode::Keyword(keyword.to_lowercase()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_mode(ScoringMode::Failing(message.to_string()))
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<ScoreRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl RemoteScorer for MockScorer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<ScoreResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        let verdicts = match &self.mode {
            ScoringMode::Failing(message) => {
                return Err(ProviderError::NetworkError(message.clone()).into());
            }
            ScoringMode::Fixed(verdicts) => verdicts.clone(),
            ScoringMode::Uniform(verdict) => request
                .questions
                .iter()
                .map(|q| (q.id.clone(), *verdict))
                .collect(),
            ScoringMode::Keyword(keyword) => request
                .questions
                .iter()
                .map(|q| {
                    let answer = request.answers.get(q.id.as_str()).to_lowercase();
                    let verdict = if answer.contains(keyword.as_str()) {
                        Verdict::Correct
                    } else {
                        Verdict::Incorrect
                    };
                    (q.id.clone(), verdict)
                })
                .collect(),
        };

        Ok(ScoreResponse { verdicts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examkit_core::answers::AnswerStore;
    use examkit_core::model::QuestionKind;

    fn score_request() -> ScoreRequest {
        let mut answers = AnswerStore::new();
        answers.set("1".into(), "Plate TECTONICS move continents");
        answers.set("2".into(), "no idea");
        ScoreRequest {
            user_id: None,
            answers,
            questions: vec![
                Question::new("1", "Why do earthquakes happen?", QuestionKind::Essay),
                Question::new("2", "What shapes mountains?", QuestionKind::Essay),
            ],
        }
    }

    #[tokio::test]
    async fn question_source_records_requests() {
        let source =
            MockQuestionSource::with_questions(vec![Question::new("1", "a", QuestionKind::Essay)]);
        let questions = source.fetch(&QuestionRequest::new("geology")).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(source.call_count(), 1);
        assert_eq!(source.last_request().unwrap().topic, "geology");
    }

    #[tokio::test]
    async fn failing_source_returns_provider_error() {
        let source = MockQuestionSource::failing("offline");
        let err = source.fetch(&QuestionRequest::new("x")).await.unwrap_err();
        assert!(err.downcast_ref::<ProviderError>().is_some());
        assert!(err.to_string().contains("offline"));
    }

    #[tokio::test]
    async fn keyword_scorer() {
        let scorer = MockScorer::keyword("tectonics");
        let response = scorer.score(&score_request()).await.unwrap();
        assert_eq!(response.verdicts.get("1"), Some(&Verdict::Correct));
        assert_eq!(response.verdicts.get("2"), Some(&Verdict::Incorrect));
        assert_eq!(scorer.call_count(), 1);
        assert_eq!(scorer.last_request().unwrap().questions.len(), 2);
    }

    #[tokio::test]
    async fn uniform_and_fixed_scorers() {
        let response = MockScorer::uniform(Verdict::Correct)
            .score(&score_request())
            .await
            .unwrap();
        assert!(response.verdicts.values().all(|v| v.is_correct()));

        let fixed = BTreeMap::from([(QuestionId::from("2"), Verdict::Correct)]);
        let response = MockScorer::with_verdicts(fixed)
            .score(&score_request())
            .await
            .unwrap();
        assert_eq!(response.verdicts.len(), 1);
    }
}
