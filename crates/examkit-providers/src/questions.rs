//! HTTP question source: `POST /generate_questions`.

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use examkit_core::model::{Difficulty, Question, QuestionType};
use examkit_core::parser::parse_questions_payload;
use examkit_core::traits::{QuestionRequest, QuestionSource};

use crate::client::ApiClient;

const GENERATE_PATH: &str = "/generate_questions";

/// Asks the exam backend to generate questions for a topic.
#[derive(Debug)]
pub struct HttpQuestionSource {
    client: ApiClient,
}

impl HttpQuestionSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    difficulty: Option<Difficulty>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    question_type: Option<QuestionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u32>,
}

impl<'a> From<&'a QuestionRequest> for GenerateBody<'a> {
    fn from(request: &'a QuestionRequest) -> Self {
        Self {
            prompt: &request.topic,
            user_id: request.user_id.as_deref(),
            subject: request.subject.as_deref(),
            difficulty: request.difficulty,
            question_type: request.question_type,
            count: request.count,
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(topic = %request.topic))]
    async fn fetch(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>> {
        let body = GenerateBody::from(request);
        let response = self.client.post_json(GENERATE_PATH, &body).await?;

        let mut questions = parse_questions_payload(&response)?;
        if let Some(count) = request.count {
            questions.truncate(count as usize);
        }

        tracing::info!(count = questions.len(), "questions generated");
        Ok(questions)
    }
}
