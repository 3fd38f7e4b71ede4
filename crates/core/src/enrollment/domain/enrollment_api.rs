use thiserror::Error;

use crate::enrollment::domain::enrollment_request::EnrollmentRequest;

/// Acknowledgment body returned by the service. Opaque to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub body: serde_json::Value,
}

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("network error: {0}")]
    Network(String),
    #[error("enrollment rejected with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// The remote service that persists enrollments.
pub trait EnrollmentApi: Send + Sync {
    fn enroll(&self, request: &EnrollmentRequest) -> Result<Ack, SubmissionError>;
}
