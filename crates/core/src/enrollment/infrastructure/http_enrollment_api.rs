use std::time::Duration;

use reqwest::blocking::Client;

use crate::enrollment::domain::enrollment_api::{Ack, EnrollmentApi, SubmissionError};
use crate::enrollment::domain::enrollment_request::EnrollmentRequest;

/// Posts enrollment requests as JSON to a single endpoint.
///
/// Any 2xx is success. The body is parsed as JSON when present; an empty
/// body acknowledges with `null`.
pub struct HttpEnrollmentApi {
    http: Client,
    endpoint: String,
}

impl HttpEnrollmentApi {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmissionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmissionError::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

impl EnrollmentApi for HttpEnrollmentApi {
    fn enroll(&self, request: &EnrollmentRequest) -> Result<Ack, SubmissionError> {
        log::debug!(
            "Posting enrollment for {} ({} descriptors) to {}",
            request.username,
            request.descriptors.len(),
            self.endpoint
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Ack {
                body: serde_json::Value::Null,
            });
        }
        let body = serde_json::from_str(&body)
            .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))?;
        Ok(Ack { body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> EnrollmentRequest {
        EnrollmentRequest {
            username: "alice".into(),
            img_url: "data:image/png;base64,AAAA".into(),
            descriptors: vec![vec![0.1, 0.2, 0.3]],
        }
    }

    /// Runs the blocking client off the async runtime; the client must be
    /// created and dropped inside the blocking task.
    async fn enroll(endpoint: String) -> Result<Ack, SubmissionError> {
        tokio::task::spawn_blocking(move || {
            let api = HttpEnrollmentApi::new(endpoint, Duration::from_secs(5))?;
            api.enroll(&request())
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_success_returns_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "username": "alice",
                "imgUrl": "data:image/png;base64,AAAA",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let ack = enroll(format!("{}/api/register", server.uri()))
            .await
            .unwrap();

        assert_eq!(ack.body["id"], 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_success_body_acks_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let ack = enroll(server.uri()).await.unwrap();

        assert_eq!(ack.body, serde_json::Value::Null);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_server_error_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = enroll(server.uri()).await.unwrap_err();

        match err {
            SubmissionError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_non_json_success_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let err = enroll(server.uri()).await.unwrap_err();

        assert!(matches!(err, SubmissionError::MalformedResponse(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unreachable_host_is_network_error() {
        let err = enroll("http://127.0.0.1:1/api/register".into())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::Network(_)));
    }
}
