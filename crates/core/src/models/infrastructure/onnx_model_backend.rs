use std::path::Path;

use crate::detection::domain::descriptor_extractor::DescriptorExtractor;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::detection::infrastructure::onnx_descriptor_extractor::OnnxDescriptorExtractor;
use crate::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use crate::detection::infrastructure::onnx_landmark_detector::OnnxLandmarkDetector;
use crate::models::domain::model_ports::ModelBackend;

/// Builds the ONNX Runtime implementations of the three face models.
pub struct OnnxModelBackend {
    confidence: f64,
}

impl OnnxModelBackend {
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }
}

impl ModelBackend for OnnxModelBackend {
    fn detector(&self, path: &Path) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
        Ok(Box::new(OnnxFaceDetector::new(path, self.confidence)?))
    }

    fn landmarker(
        &self,
        path: &Path,
    ) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>> {
        Ok(Box::new(OnnxLandmarkDetector::new(path)?))
    }

    fn descriptor(
        &self,
        path: &Path,
    ) -> Result<Box<dyn DescriptorExtractor>, Box<dyn std::error::Error>> {
        Ok(Box::new(OnnxDescriptorExtractor::new(path)?))
    }
}
