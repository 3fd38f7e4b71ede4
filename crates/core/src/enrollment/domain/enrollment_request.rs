use serde::Serialize;

use crate::enrollment::domain::enrollment_session::EnrollmentSession;

/// Wire payload for the enrollment API.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EnrollmentRequest {
    pub username: String,
    #[serde(rename = "imgUrl")]
    pub img_url: String,
    pub descriptors: Vec<Vec<f32>>,
}

impl EnrollmentRequest {
    /// Builds the payload from a session; `None` unless the session is submittable.
    pub fn from_session(session: &EnrollmentSession) -> Option<Self> {
        if !session.is_submittable() {
            return None;
        }
        let snapshot = session.snapshot()?;
        Some(Self {
            username: session.label().to_string(),
            img_url: snapshot.data_url().to_string(),
            descriptors: session
                .descriptors()
                .iter()
                .map(|d| d.values().to_vec())
                .collect(),
        })
    }
}
