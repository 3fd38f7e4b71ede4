use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;

/// Computes a fixed-length identity embedding for one landmarked face.
pub trait DescriptorExtractor: Send + Sync {
    fn describe(
        &self,
        frame: &Frame,
        landmarks: &FaceLandmarks,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
