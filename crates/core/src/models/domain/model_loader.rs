use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::models::domain::model_ports::{FaceModels, ModelBackend, ModelSource};
use crate::models::domain::model_state::{ModelArtifact, ModelState};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelLoadError {
    #[error("failed to fetch {artifact} model: {reason}")]
    Fetch {
        artifact: ModelArtifact,
        reason: String,
    },
    #[error("failed to initialize {artifact} model: {reason}")]
    Init {
        artifact: ModelArtifact,
        reason: String,
    },
    #[error("model loading was interrupted")]
    Interrupted,
}

enum Slot {
    Unloaded,
    Loading,
    Ready(Arc<FaceModels>),
    Failed(ModelLoadError),
}

/// Loads the detector, landmark, and descriptor models exactly once.
///
/// - A call while `Ready` returns the loaded models without touching the source.
/// - Concurrent calls while `Loading` wait for the in-flight load and share its outcome.
/// - A failure is sticky: later calls return the same error.
pub struct ModelLoader {
    source: Box<dyn ModelSource>,
    backend: Box<dyn ModelBackend>,
    slot: Mutex<Slot>,
    settled: Condvar,
}

impl ModelLoader {
    pub fn new(source: Box<dyn ModelSource>, backend: Box<dyn ModelBackend>) -> Self {
        Self {
            source,
            backend,
            slot: Mutex::new(Slot::Unloaded),
            settled: Condvar::new(),
        }
    }

    pub fn state(&self) -> ModelState {
        match *self.lock() {
            Slot::Unloaded => ModelState::Unloaded,
            Slot::Loading => ModelState::Loading,
            Slot::Ready(_) => ModelState::Ready,
            Slot::Failed(_) => ModelState::Failed,
        }
    }

    /// The loaded models, or `None` unless the state is `Ready`.
    pub fn models(&self) -> Option<Arc<FaceModels>> {
        match *self.lock() {
            Slot::Ready(ref models) => Some(models.clone()),
            _ => None,
        }
    }

    pub fn load(&self) -> Result<Arc<FaceModels>, ModelLoadError> {
        let mut slot = self.lock();
        loop {
            match &*slot {
                Slot::Ready(models) => return Ok(models.clone()),
                Slot::Failed(err) => return Err(err.clone()),
                Slot::Unloaded => break,
                Slot::Loading => {}
            }
            slot = self
                .settled
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *slot = Slot::Loading;
        drop(slot);

        let mut guard = LoadGuard {
            loader: self,
            armed: true,
        };
        log::info!("Loading face models");
        let result = self.load_all();

        let mut slot = self.lock();
        guard.armed = false;
        *slot = match result {
            Ok(ref models) => {
                log::info!("Face models ready");
                Slot::Ready(models.clone())
            }
            Err(ref err) => {
                log::error!("Face models failed to load: {err}");
                Slot::Failed(err.clone())
            }
        };
        self.settled.notify_all();
        result
    }

    fn load_all(&self) -> Result<Arc<FaceModels>, ModelLoadError> {
        // Fetch everything before initializing anything so a missing file
        // never leaves a half-built runtime behind.
        let mut paths: HashMap<ModelArtifact, PathBuf> = HashMap::new();
        for artifact in ModelArtifact::ALL {
            let path = self
                .source
                .fetch(artifact)
                .map_err(|e| ModelLoadError::Fetch {
                    artifact,
                    reason: e.to_string(),
                })?;
            log::debug!("Resolved {artifact} model at {}", path.display());
            paths.insert(artifact, path);
        }

        let init_err = |artifact: ModelArtifact| {
            move |e: Box<dyn std::error::Error>| ModelLoadError::Init {
                artifact,
                reason: e.to_string(),
            }
        };

        let detector = self
            .backend
            .detector(&paths[&ModelArtifact::Detector])
            .map_err(init_err(ModelArtifact::Detector))?;
        let landmarker = self
            .backend
            .landmarker(&paths[&ModelArtifact::Landmarker])
            .map_err(init_err(ModelArtifact::Landmarker))?;
        let descriptor = self
            .backend
            .descriptor(&paths[&ModelArtifact::Descriptor])
            .map_err(init_err(ModelArtifact::Descriptor))?;

        Ok(Arc::new(FaceModels {
            detector,
            landmarker,
            descriptor,
        }))
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Moves the slot out of `Loading` if the loading thread unwinds.
struct LoadGuard<'a> {
    loader: &'a ModelLoader,
    armed: bool,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        log::error!("Face model loading was interrupted");
        *self.loader.lock() = Slot::Failed(ModelLoadError::Interrupted);
        self.loader.settled.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use crate::detection::domain::descriptor_extractor::DescriptorExtractor;
    use crate::detection::domain::face_detector::{FaceBox, FaceDetector};
    use crate::detection::domain::face_landmarks::FaceLandmarks;
    use crate::detection::domain::landmark_detector::LandmarkDetector;
    use crate::shared::frame::Frame;

    // --- Stubs ---

    struct StubSource {
        fetches: Arc<AtomicUsize>,
        fail_on: Option<ModelArtifact>,
        delay: Duration,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                fetches: Arc::new(AtomicUsize::new(0)),
                fail_on: None,
                delay: Duration::ZERO,
            }
        }
    }

    impl ModelSource for StubSource {
        fn fetch(&self, artifact: ModelArtifact) -> Result<PathBuf, Box<dyn std::error::Error>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            if self.fail_on == Some(artifact) {
                return Err(format!("{} not found", artifact.file_name()).into());
            }
            Ok(PathBuf::from("/models").join(artifact.file_name()))
        }
    }

    struct NoFaces;

    impl FaceDetector for NoFaces {
        fn detect(&self, _frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
            Ok(Vec::new())
        }
    }

    impl LandmarkDetector for NoFaces {
        fn landmarks(
            &self,
            _frame: &Frame,
            _face: &FaceBox,
        ) -> Result<FaceLandmarks, Box<dyn std::error::Error>> {
            Ok(FaceLandmarks::new(Vec::new()))
        }
    }

    impl DescriptorExtractor for NoFaces {
        fn describe(
            &self,
            _frame: &Frame,
            _landmarks: &FaceLandmarks,
        ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
            Ok(Vec::new())
        }
    }

    struct StubBackend {
        corrupt: Option<ModelArtifact>,
    }

    impl StubBackend {
        fn check(&self, artifact: ModelArtifact) -> Result<(), Box<dyn std::error::Error>> {
            if self.corrupt == Some(artifact) {
                return Err("invalid protobuf".into());
            }
            Ok(())
        }
    }

    impl ModelBackend for StubBackend {
        fn detector(
            &self,
            _path: &Path,
        ) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
            self.check(ModelArtifact::Detector)?;
            Ok(Box::new(NoFaces))
        }

        fn landmarker(
            &self,
            _path: &Path,
        ) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>> {
            self.check(ModelArtifact::Landmarker)?;
            Ok(Box::new(NoFaces))
        }

        fn descriptor(
            &self,
            _path: &Path,
        ) -> Result<Box<dyn DescriptorExtractor>, Box<dyn std::error::Error>> {
            self.check(ModelArtifact::Descriptor)?;
            Ok(Box::new(NoFaces))
        }
    }

    struct PanickingBackend;

    impl ModelBackend for PanickingBackend {
        fn detector(
            &self,
            _path: &Path,
        ) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
            panic!("onnx runtime aborted");
        }

        fn landmarker(
            &self,
            _path: &Path,
        ) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>> {
            panic!("onnx runtime aborted");
        }

        fn descriptor(
            &self,
            _path: &Path,
        ) -> Result<Box<dyn DescriptorExtractor>, Box<dyn std::error::Error>> {
            panic!("onnx runtime aborted");
        }
    }

    fn loader(source: StubSource, corrupt: Option<ModelArtifact>) -> ModelLoader {
        ModelLoader::new(Box::new(source), Box::new(StubBackend { corrupt }))
    }

    // --- Tests ---

    #[test]
    fn test_starts_unloaded() {
        let loader = loader(StubSource::new(), None);
        assert_eq!(loader.state(), ModelState::Unloaded);
        assert!(loader.models().is_none());
    }

    #[test]
    fn test_load_success_becomes_ready() {
        let loader = loader(StubSource::new(), None);
        assert!(loader.load().is_ok());
        assert_eq!(loader.state(), ModelState::Ready);
        assert!(loader.models().is_some());
    }

    #[test]
    fn test_second_load_does_not_refetch() {
        let source = StubSource::new();
        let fetches = source.fetches.clone();
        let loader = loader(source, None);

        let first = loader.load().unwrap();
        let second = loader.load().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
        assert_eq!(loader.state(), ModelState::Ready);
    }

    #[test]
    fn test_fetch_failure_is_failed_without_models() {
        let mut source = StubSource::new();
        source.fail_on = Some(ModelArtifact::Landmarker);
        let loader = loader(source, None);

        let err = loader.load().err().unwrap();

        assert!(matches!(
            err,
            ModelLoadError::Fetch {
                artifact: ModelArtifact::Landmarker,
                ..
            }
        ));
        assert_eq!(loader.state(), ModelState::Failed);
        assert!(loader.models().is_none());
    }

    #[test]
    fn test_corrupt_artifact_is_init_failure() {
        let loader = loader(StubSource::new(), Some(ModelArtifact::Descriptor));
        let err = loader.load().err().unwrap();
        assert!(matches!(
            err,
            ModelLoadError::Init {
                artifact: ModelArtifact::Descriptor,
                ..
            }
        ));
        assert_eq!(loader.state(), ModelState::Failed);
    }

    #[test]
    fn test_failure_is_sticky() {
        let mut source = StubSource::new();
        source.fail_on = Some(ModelArtifact::Detector);
        let fetches = source.fetches.clone();
        let loader = loader(source, None);

        let first = loader.load().err().unwrap();
        let second = loader.load().err().unwrap();

        assert_eq!(first, second);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_loads_are_coalesced() {
        let mut source = StubSource::new();
        source.delay = Duration::from_millis(20);
        let fetches = source.fetches.clone();
        let loader = Arc::new(loader(source, None));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let loader = loader.clone();
                thread::spawn(move || loader.load().is_ok())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_panicking_backend_leaves_failed_state() {
        let loader = Arc::new(ModelLoader::new(
            Box::new(StubSource::new()),
            Box::new(PanickingBackend),
        ));

        let worker = loader.clone();
        assert!(thread::spawn(move || worker.load()).join().is_err());

        assert_eq!(loader.state(), ModelState::Failed);
        assert!(loader.models().is_none());
        assert_eq!(loader.load().err(), Some(ModelLoadError::Interrupted));
    }

    #[test]
    fn test_waiter_is_released_when_loading_thread_panics() {
        let mut source = StubSource::new();
        source.delay = Duration::from_millis(50);
        let loader = Arc::new(ModelLoader::new(Box::new(source), Box::new(PanickingBackend)));

        let first = loader.clone();
        let panicking = thread::spawn(move || first.load());
        while loader.state() != ModelState::Loading {
            thread::yield_now();
        }

        let (tx, rx) = mpsc::channel();
        let second = loader.clone();
        thread::spawn(move || {
            let _ = tx.send(second.load());
        });

        let result = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("waiting load() never returned");
        assert_eq!(result.err(), Some(ModelLoadError::Interrupted));
        assert!(panicking.join().is_err());
        assert_eq!(loader.state(), ModelState::Failed);
    }
}
