use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::capture::domain::camera::{CaptureConstraints, CaptureError};
use crate::capture::domain::capture_source::{CaptureSource, CaptureStream};
use crate::capture::domain::snapshot::SnapshotError;
use crate::enrollment::domain::enrollment_api::{Ack, SubmissionError};
use crate::enrollment::domain::enrollment_request::EnrollmentRequest;
use crate::enrollment::domain::enrollment_session::EnrollmentSession;
use crate::models::domain::model_loader::{ModelLoadError, ModelLoader};
use crate::models::domain::model_state::ModelState;
use crate::pipeline::enrollment_submitter::EnrollmentSubmitter;
use crate::pipeline::face_extractor::{ExtractionError, FaceExtractor};
use crate::pipeline::frame_snapshotter::FrameSnapshotter;
use crate::pipeline::pipeline_logger::PipelineLogger;

/// Screen-level enrollment state, derived from the components on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    ModelsLoading,
    ModelLoadFailed,
    CaptureInactive,
    CaptureActive,
    SnapshotTaken,
    DescriptorsExtracted,
    Submittable,
    Submitted,
    SubmissionFailed,
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("face models are not ready")]
    ModelsNotReady,
    #[error("enrollment already submitted")]
    AlreadySubmitted,
    #[error("enrollment is not ready to submit (needs a name, a snapshot and a detected face)")]
    NotSubmittable,
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// The control layer: sequences model loading, capture, snapshot,
/// extraction, and submission, and refuses any step whose precondition
/// has not been reached.
///
/// Every step takes `&mut self`, so at most one operation is ever in flight.
pub struct EnrollmentWorkflow {
    loader: Arc<ModelLoader>,
    capture: CaptureSource,
    snapshotter: FrameSnapshotter,
    extractor: FaceExtractor,
    submitter: EnrollmentSubmitter,
    session: EnrollmentSession,
    logger: Box<dyn PipelineLogger>,
    ack: Option<Ack>,
    submission_failed: bool,
}

impl EnrollmentWorkflow {
    pub fn new(
        loader: Arc<ModelLoader>,
        capture: CaptureSource,
        snapshotter: FrameSnapshotter,
        submitter: EnrollmentSubmitter,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            extractor: FaceExtractor::new(loader.clone()),
            loader,
            capture,
            snapshotter,
            submitter,
            session: EnrollmentSession::new(),
            logger,
            ack: None,
            submission_failed: false,
        }
    }

    pub fn state(&self) -> WorkflowState {
        match self.loader.state() {
            ModelState::Unloaded | ModelState::Loading => return WorkflowState::ModelsLoading,
            ModelState::Failed => return WorkflowState::ModelLoadFailed,
            ModelState::Ready => {}
        }
        if self.ack.is_some() {
            WorkflowState::Submitted
        } else if self.submission_failed {
            WorkflowState::SubmissionFailed
        } else if self.session.is_submittable() {
            WorkflowState::Submittable
        } else if !self.session.descriptors().is_empty() {
            WorkflowState::DescriptorsExtracted
        } else if self.session.snapshot().is_some() {
            WorkflowState::SnapshotTaken
        } else if self.capture.is_active() {
            WorkflowState::CaptureActive
        } else {
            WorkflowState::CaptureInactive
        }
    }

    pub fn load_models(&mut self) -> Result<(), WorkflowError> {
        let start = Instant::now();
        let result = self.loader.load();
        self.record("load_models", start);
        result?;
        self.logger.info("Face models ready");
        Ok(())
    }

    pub fn can_start_camera(&self) -> bool {
        self.loader.state() == ModelState::Ready && self.ack.is_none()
    }

    pub fn start_camera(&mut self, constraints: CaptureConstraints) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        let start = Instant::now();
        let result = self.capture.start(constraints).map(|_| ());
        self.record("start_camera", start);
        if let Err(ref e) = result {
            self.logger.warn(&format!("Camera failed to start: {e}"));
        }
        Ok(result?)
    }

    pub fn stop_camera(&mut self) {
        self.capture.stop();
    }

    pub fn capture_stream(&self) -> Option<&CaptureStream> {
        self.capture.stream()
    }

    pub fn can_snapshot(&self) -> bool {
        self.can_start_camera() && self.capture.is_active()
    }

    /// Takes a snapshot, then immediately extracts faces from it.
    ///
    /// Returns the number of faces found. A snapshot that extracts nothing
    /// (or fails extraction) stays in the session with no descriptors.
    pub fn take_snapshot(&mut self) -> Result<usize, WorkflowError> {
        self.ensure_open()?;

        let start = Instant::now();
        let snapshot = self.snapshotter.capture(self.capture.stream());
        self.record("snapshot", start);
        if let Err(ref e) = snapshot {
            self.logger.warn(&format!("Snapshot failed: {e}"));
        }
        let snapshot = snapshot?;
        self.logger.info(&format!(
            "Snapshot taken ({}x{})",
            snapshot.width(),
            snapshot.height()
        ));
        self.session.set_snapshot(snapshot);
        self.submission_failed = false;

        let Some(snapshot) = self.session.snapshot() else {
            return Ok(0);
        };
        let start = Instant::now();
        let descriptors = self.extractor.extract(snapshot);
        self.record("extract", start);
        if let Err(ref e) = descriptors {
            self.logger.warn(&format!("Face extraction failed: {e}"));
        }
        let descriptors = descriptors?;

        let count = descriptors.len();
        self.logger.metric("faces", count as f64);
        self.logger.info(&format!("Extracted {count} face(s) from snapshot"));
        self.session.set_descriptors(descriptors);
        Ok(count)
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.session.set_label(label);
        self.submission_failed = false;
    }

    pub fn can_submit(&self) -> bool {
        self.ack.is_none() && self.session.is_submittable()
    }

    pub fn submit(&mut self) -> Result<&Ack, WorkflowError> {
        if self.ack.is_some() {
            return Err(WorkflowError::AlreadySubmitted);
        }
        if !self.session.is_submittable() {
            return Err(WorkflowError::NotSubmittable);
        }

        let start = Instant::now();
        let result = self.submitter.submit(&self.session);
        self.record("submit", start);
        match result {
            Ok(ack) => {
                self.submission_failed = false;
                self.capture.stop();
                Ok(self.ack.insert(ack))
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Enrollment submission failed: {e}"));
                self.submission_failed = true;
                Err(e.into())
            }
        }
    }

    /// The payload `submit` would send, if the session is ready.
    pub fn request(&self) -> Option<EnrollmentRequest> {
        EnrollmentRequest::from_session(&self.session)
    }

    pub fn session(&self) -> &EnrollmentSession {
        &self.session
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    fn ensure_open(&self) -> Result<(), WorkflowError> {
        if self.ack.is_some() {
            return Err(WorkflowError::AlreadySubmitted);
        }
        if self.loader.state() != ModelState::Ready {
            return Err(WorkflowError::ModelsNotReady);
        }
        Ok(())
    }

    fn record(&mut self, stage: &str, start: Instant) {
        self.logger
            .timing(stage, start.elapsed().as_secs_f64() * 1000.0);
    }
}
