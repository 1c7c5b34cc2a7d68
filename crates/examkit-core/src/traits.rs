//! Collaborator traits: where questions come from and who scores them remotely.
//!
//! These async traits are implemented by the `examkit-providers` crate. The
//! session controller only ever sees the traits, never the transport.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::answers::AnswerStore;
use crate::model::{Difficulty, Question, QuestionId, QuestionType};
use crate::scoring::Verdict;

// ---------------------------------------------------------------------------
// Question source
// ---------------------------------------------------------------------------

/// Something that produces a list of questions for a topic.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Human-readable source name (e.g. "http", "bank").
    fn name(&self) -> &str;

    /// Fetch questions for a request.
    ///
    /// Malformed payloads should fail with
    /// [`ExamError::InvalidResponseFormat`](crate::error::ExamError::InvalidResponseFormat).
    async fn fetch(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>>;
}

/// Parameters for generating or selecting questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// Free-text topic or prompt.
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    /// Upper bound on the number of questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl QuestionRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Remote scoring
// ---------------------------------------------------------------------------

/// A scoring service that returns per-question verdicts for a whole batch.
#[async_trait]
pub trait RemoteScorer: Send + Sync {
    fn name(&self) -> &str;

    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<ScoreResponse>;
}

/// Everything the scoring service needs: the questions and the final answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub answers: AnswerStore,
    pub questions: Vec<Question>,
}

/// Verdicts returned by a scoring service, keyed by question id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub verdicts: BTreeMap<QuestionId, Verdict>,
}
