//! Stub ports shared by the pipeline tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::capture::domain::camera::{Camera, CaptureConstraints, CaptureError, FrameStream};
use crate::detection::domain::descriptor_extractor::DescriptorExtractor;
use crate::detection::domain::face_detector::{FaceBox, FaceDetector};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::enrollment::domain::enrollment_api::{Ack, EnrollmentApi, SubmissionError};
use crate::enrollment::domain::enrollment_request::EnrollmentRequest;
use crate::models::domain::model_loader::ModelLoader;
use crate::models::domain::model_ports::{ModelBackend, ModelSource};
use crate::models::domain::model_state::ModelArtifact;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;

// --- Models ---

pub fn face_at(x: f64, y: f64) -> FaceBox {
    FaceBox {
        x1: x,
        y1: y,
        x2: x + 40.0,
        y2: y + 40.0,
        score: 0.9,
    }
}

pub struct StubDetector {
    pub faces: Vec<FaceBox>,
    pub fail: bool,
}

impl FaceDetector for StubDetector {
    fn detect(&self, _frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        if self.fail {
            return Err("detector exploded".into());
        }
        Ok(self.faces.clone())
    }
}

/// Five anchors spread over the box, top-left first.
pub struct StubLandmarker;

impl LandmarkDetector for StubLandmarker {
    fn landmarks(
        &self,
        _frame: &Frame,
        face: &FaceBox,
    ) -> Result<FaceLandmarks, Box<dyn std::error::Error>> {
        let cx = (face.x1 + face.x2) / 2.0;
        let cy = (face.y1 + face.y2) / 2.0;
        Ok(FaceLandmarks::new(vec![
            (face.x1, face.y1),
            (face.x2, face.y1),
            (cx, cy),
            (face.x1, face.y2),
            (face.x2, face.y2),
        ]))
    }
}

/// Descriptor echoes the first landmark so tests can tell faces apart.
pub struct StubDescriptor;

impl DescriptorExtractor for StubDescriptor {
    fn describe(
        &self,
        _frame: &Frame,
        landmarks: &FaceLandmarks,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let (x, y) = landmarks.points()[0];
        Ok(vec![x as f32, y as f32, 1.0])
    }
}

pub struct StubSource {
    pub fetches: Arc<AtomicUsize>,
    pub fail: bool,
}

impl ModelSource for StubSource {
    fn fetch(&self, artifact: ModelArtifact) -> Result<PathBuf, Box<dyn std::error::Error>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(format!("{} unreachable", artifact.file_name()).into());
        }
        Ok(PathBuf::from(artifact.file_name()))
    }
}

pub struct StubBackend {
    pub faces: Vec<FaceBox>,
    pub detector_fails: bool,
}

impl ModelBackend for StubBackend {
    fn detector(&self, _path: &Path) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
        Ok(Box::new(StubDetector {
            faces: self.faces.clone(),
            fail: self.detector_fails,
        }))
    }

    fn landmarker(
        &self,
        _path: &Path,
    ) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>> {
        Ok(Box::new(StubLandmarker))
    }

    fn descriptor(
        &self,
        _path: &Path,
    ) -> Result<Box<dyn DescriptorExtractor>, Box<dyn std::error::Error>> {
        Ok(Box::new(StubDescriptor))
    }
}

/// A loader whose models detect `faces` in every frame. Not yet loaded.
pub fn loader_with_faces(faces: Vec<FaceBox>) -> Arc<ModelLoader> {
    Arc::new(ModelLoader::new(
        Box::new(StubSource {
            fetches: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }),
        Box::new(StubBackend {
            faces,
            detector_fails: false,
        }),
    ))
}

/// A loader that loads fine but whose detector errors on every frame.
pub fn failing_detector_loader() -> Arc<ModelLoader> {
    Arc::new(ModelLoader::new(
        Box::new(StubSource {
            fetches: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }),
        Box::new(StubBackend {
            faces: vec![],
            detector_fails: true,
        }),
    ))
}

pub fn failing_loader() -> Arc<ModelLoader> {
    Arc::new(ModelLoader::new(
        Box::new(StubSource {
            fetches: Arc::new(AtomicUsize::new(0)),
            fail: true,
        }),
        Box::new(StubBackend {
            faces: vec![],
            detector_fails: false,
        }),
    ))
}

// --- Camera ---

pub fn grey_frame(width: u32, height: u32) -> Frame {
    Frame::new(vec![128; (width * height * 3) as usize], width, height, 0)
}

pub struct StubCamera {
    pub frame: Option<Frame>,
    pub error: Option<CaptureError>,
    pub opens: Arc<AtomicUsize>,
}

impl StubCamera {
    pub fn with_frame(frame: Frame) -> Self {
        Self {
            frame: Some(frame),
            error: None,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn without_frames() -> Self {
        Self {
            frame: None,
            error: None,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: CaptureError) -> Self {
        Self {
            frame: None,
            error: Some(error),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Camera for StubCamera {
    fn open(
        &mut self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn FrameStream>, CaptureError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(ref err) = self.error {
            return Err(err.clone());
        }
        Ok(Box::new(StubStream {
            frame: self.frame.clone(),
            resolution: (constraints.width, constraints.height),
        }))
    }
}

struct StubStream {
    frame: Option<Frame>,
    resolution: (u32, u32),
}

impl FrameStream for StubStream {
    fn latest_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }
    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }
    fn stop(&mut self) {
        self.frame = None;
    }
}

// --- Enrollment API ---

pub struct StubApi {
    pub status: u16,
    pub requests: Arc<Mutex<Vec<EnrollmentRequest>>>,
}

impl StubApi {
    pub fn responding(status: u16) -> Self {
        Self {
            status,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl EnrollmentApi for StubApi {
    fn enroll(&self, request: &EnrollmentRequest) -> Result<Ack, SubmissionError> {
        self.requests.lock().unwrap().push(request.clone());
        if (200..300).contains(&self.status) {
            Ok(Ack {
                body: serde_json::json!({"ok": true}),
            })
        } else {
            Err(SubmissionError::Status {
                status: self.status,
                body: "server error".into(),
            })
        }
    }
}

// --- Logging ---

/// Keeps status messages and warnings where a test can read them.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    pub infos: Arc<Mutex<Vec<String>>>,
    pub warnings: Arc<Mutex<Vec<String>>>,
}

impl PipelineLogger for RecordingLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}

    fn info(&mut self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}
