//! Shared HTTP client for the exam backend.

use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use examkit_core::error::ExamError;

use crate::error::ProviderError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// JSON-over-HTTP client bound to one base URL.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` as JSON to `path` and return the decoded JSON response.
    ///
    /// Transport and HTTP failures surface as [`ProviderError`]; a success
    /// response that is not JSON is an [`ExamError::InvalidResponseFormat`].
    #[instrument(skip(self, body), fields(base_url = %self.base_url))]
    pub async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                ProviderError::NetworkError(format!(
                    "exam service not reachable at {}",
                    self.base_url
                ))
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            ExamError::InvalidResponseFormat(format!("response body is not JSON: {e}"))
        })?;

        tracing::debug!(status, "response received");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_bearer_token_and_decodes_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), Some("tok-1".into()), 5).unwrap();
        let value = client
            .post_json("/echo", &serde_json::json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), None, 5).unwrap();
        let err = client.post_json("/x", &()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), None, 5).unwrap();
        let err = client.post_json("/x", &()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_format() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), None, 5).unwrap();
        let err = client.post_json("/x", &()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExamError>(),
            Some(ExamError::InvalidResponseFormat(_))
        ));
    }

    #[test]
    fn debug_masks_token() {
        let client = ApiClient::new("http://localhost:1/", Some("secret".into()), 5).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert_eq!(client.base_url(), "http://localhost:1");
    }
}
