use std::path::{Path, PathBuf};

use crate::detection::domain::descriptor_extractor::DescriptorExtractor;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::models::domain::model_state::ModelArtifact;

/// Locates (and if necessary retrieves) a model file on local disk.
pub trait ModelSource: Send + Sync {
    fn fetch(&self, artifact: ModelArtifact) -> Result<PathBuf, Box<dyn std::error::Error>>;
}

/// Turns resolved model files into ready-to-run inference components.
pub trait ModelBackend: Send + Sync {
    fn detector(&self, path: &Path) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>>;

    fn landmarker(
        &self,
        path: &Path,
    ) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>>;

    fn descriptor(
        &self,
        path: &Path,
    ) -> Result<Box<dyn DescriptorExtractor>, Box<dyn std::error::Error>>;
}

/// All three inference components, only ever constructed together.
pub struct FaceModels {
    pub detector: Box<dyn FaceDetector>,
    pub landmarker: Box<dyn LandmarkDetector>,
    pub descriptor: Box<dyn DescriptorExtractor>,
}
