//! HTTP scoring service: `POST /validate_answers`.

use async_trait::async_trait;
use tracing::instrument;

use examkit_core::parser::parse_verdicts_payload;
use examkit_core::traits::{RemoteScorer, ScoreRequest, ScoreResponse};

use crate::client::ApiClient;

const VALIDATE_PATH: &str = "/validate_answers";

/// Sends the whole answer batch to the backend and adopts its verdicts.
#[derive(Debug)]
pub struct HttpScorer {
    client: ApiClient,
}

impl HttpScorer {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteScorer for HttpScorer {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip_all, fields(questions = request.questions.len()))]
    async fn score(&self, request: &ScoreRequest) -> anyhow::Result<ScoreResponse> {
        let response = self.client.post_json(VALIDATE_PATH, request).await?;
        let verdicts = parse_verdicts_payload(&response)?;
        tracing::debug!(verdicts = verdicts.len(), "answers validated");
        Ok(ScoreResponse { verdicts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examkit_core::answers::AnswerStore;
    use examkit_core::error::ExamError;
    use examkit_core::model::{Question, QuestionKind};
    use examkit_core::scoring::Verdict;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ScoreRequest {
        let mut answers = AnswerStore::new();
        answers.set("1".into(), "Because of gravity.");
        ScoreRequest {
            user_id: Some("u-1".into()),
            answers,
            questions: vec![
                Question::new("1", "Why do apples fall?", QuestionKind::Essay),
                Question::new("2", "What is a tide?", QuestionKind::Essay),
            ],
        }
    }

    #[tokio::test]
    async fn adopts_remote_verdicts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/validate_answers"))
            .and(body_partial_json(serde_json::json!({
                "user_id": "u-1",
                "answers": {"1": "Because of gravity."}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "validation": {"1": "Correct", "2": "Incorrect"}
            })))
            .mount(&server)
            .await;

        let scorer = HttpScorer::new(ApiClient::new(&server.uri(), None, 5).unwrap());
        let response = scorer.score(&request()).await.unwrap();
        assert_eq!(response.verdicts.get("1"), Some(&Verdict::Correct));
        assert_eq!(response.verdicts.get("2"), Some(&Verdict::Incorrect));
    }

    #[tokio::test]
    async fn malformed_verdicts_are_invalid_format() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/validate_answers"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": "ok"})),
            )
            .mount(&server)
            .await;

        let scorer = HttpScorer::new(ApiClient::new(&server.uri(), None, 5).unwrap());
        let err = scorer.score(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExamError>(),
            Some(ExamError::InvalidResponseFormat(_))
        ));
    }
}
