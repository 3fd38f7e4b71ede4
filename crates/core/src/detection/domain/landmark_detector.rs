use crate::detection::domain::face_detector::FaceBox;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;

/// Locates facial keypoints inside a detected face box.
///
/// Returned points are in the coordinates of `frame`, not of the box.
pub trait LandmarkDetector: Send + Sync {
    fn landmarks(
        &self,
        frame: &Frame,
        face: &FaceBox,
    ) -> Result<FaceLandmarks, Box<dyn std::error::Error>>;
}
