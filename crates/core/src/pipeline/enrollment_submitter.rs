use crate::enrollment::domain::enrollment_api::{Ack, EnrollmentApi, SubmissionError};
use crate::enrollment::domain::enrollment_request::EnrollmentRequest;
use crate::enrollment::domain::enrollment_session::EnrollmentSession;

/// Turns a ready session into one request against the enrollment API.
pub struct EnrollmentSubmitter {
    api: Box<dyn EnrollmentApi>,
}

impl EnrollmentSubmitter {
    pub fn new(api: Box<dyn EnrollmentApi>) -> Self {
        Self { api }
    }

    /// Sends the session. The session itself is never modified, so a failed
    /// submission can be retried as-is.
    ///
    /// # Panics
    ///
    /// If the session is not submittable. Callers gate on
    /// [`EnrollmentSession::is_submittable`].
    pub fn submit(&self, session: &EnrollmentSession) -> Result<Ack, SubmissionError> {
        let Some(request) = EnrollmentRequest::from_session(session) else {
            panic!("submit called on a session that is not submittable");
        };
        let ack = self.api.enroll(&request)?;
        log::info!(
            "Enrollment accepted for {} ({} descriptor(s))",
            request.username,
            request.descriptors.len()
        );
        Ok(ack)
    }
}
