//! HTTP adapter for the practice server's response endpoints

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use uuid::Uuid;

use crate::application::ports::{ApiError, ResponseApi};
use crate::domain::response::PendingResponse;

/// Submission timeout, generous because the body carries audio
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the body-less evaluation trigger
const EVALUATE_TIMEOUT: Duration = Duration::from_secs(15);

/// Response API backed by the practice server
pub struct HttpResponseApi {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpResponseApi {
    /// Create an API client for the given server
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn responses_url(&self) -> String {
        format!("{}/api/responses", self.base_url)
    }

    fn evaluation_url(&self, session_id: Uuid) -> String {
        format!("{}/api/sessions/{}/evaluate", self.base_url, session_id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::InvalidApiKey);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ResponseApi for HttpResponseApi {
    async fn submit_response(&self, response: &PendingResponse) -> Result<(), ApiError> {
        let audio = multipart::Part::bytes(response.audio.data().to_vec())
            .file_name(format!("answer.{}", response.audio.format().extension()))
            .mime_str(response.audio.format().mime_type())
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let form = multipart::Form::new()
            .text("questionId", response.question_id.to_string())
            .text("sessionId", response.session_id.to_string())
            .text("durationSeconds", response.duration_secs.to_string())
            .text("recordedAt", response.recorded_at.to_rfc3339())
            .text("transcription", response.transcript.clone())
            .part("audio", audio);

        let request = self.authorize(
            self.client
                .post(self.responses_url())
                .multipart(form)
                .timeout(SUBMIT_TIMEOUT),
        );

        let http_response = request
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;

        Self::check_status(http_response).await
    }

    async fn trigger_evaluation(&self, session_id: Uuid) -> Result<(), ApiError> {
        let request = self.authorize(
            self.client
                .post(self.evaluation_url(session_id))
                .timeout(EVALUATE_TIMEOUT),
        );

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;

        Self::check_status(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::{AudioClip, AudioFormat};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_response() -> PendingResponse {
        PendingResponse::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            AudioClip::new(vec![0x66, 0x4c, 0x61, 0x43], AudioFormat::Flac),
            "my answer",
            20,
        )
    }

    #[test]
    fn urls_are_rooted_at_the_base() {
        let api = HttpResponseApi::new("http://localhost:8787/", None);
        assert_eq!(api.responses_url(), "http://localhost:8787/api/responses");

        let session_id = Uuid::new_v4();
        assert_eq!(
            api.evaluation_url(session_id),
            format!("http://localhost:8787/api/sessions/{}/evaluate", session_id)
        );
    }

    #[tokio::test]
    async fn submit_sends_authorized_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/responses"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpResponseApi::new(server.uri(), Some("test-key".to_string()));
        api.submit_response(&sample_response()).await.unwrap();
    }

    #[tokio::test]
    async fn submit_body_carries_the_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/responses"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let api = HttpResponseApi::new(server.uri(), None);
        let response = sample_response();
        api.submit_response(&response).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body).to_string();
        assert!(body.contains(&response.question_id.to_string()));
        assert!(body.contains(&response.session_id.to_string()));
        assert!(body.contains("name=\"transcription\""));
        assert!(body.contains("my answer"));
        assert!(body.contains("name=\"audio\""));
        assert!(body.contains("answer.flac"));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_invalid_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/responses"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let api = HttpResponseApi::new(server.uri(), Some("stale-key".to_string()));
        let err = api.submit_response(&sample_response()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidApiKey));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/responses"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let api = HttpResponseApi::new(server.uri(), None);
        let err = api.submit_response(&sample_response()).await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
    }

    #[tokio::test]
    async fn server_failure_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/responses"))
            .respond_with(ResponseTemplate::new(503).set_body_string("database migrating"))
            .mount(&server)
            .await;

        let api = HttpResponseApi::new(server.uri(), None);
        let err = api.submit_response(&sample_response()).await.unwrap_err();
        match err {
            ApiError::ServerError { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "database migrating");
            }
            other => panic!("expected ServerError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connection_refused_maps_to_unreachable() {
        // Port 9 (discard) refuses connections on any sane machine
        let api = HttpResponseApi::new("http://127.0.0.1:9", None);
        let err = api.submit_response(&sample_response()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unreachable(_)));
    }

    #[tokio::test]
    async fn evaluation_trigger_posts_to_the_session() {
        let server = MockServer::start().await;
        let session_id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path(format!("/api/sessions/{}/evaluate", session_id)))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpResponseApi::new(server.uri(), None);
        api.trigger_evaluation(session_id).await.unwrap();
    }
}
