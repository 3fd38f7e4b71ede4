use crate::detection::domain::face_detector::FaceBox;
use crate::detection::domain::face_landmarks::FaceLandmarks;

/// One detected face's embedding together with the evidence it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceDescriptor {
    values: Vec<f32>,
    landmarks: FaceLandmarks,
    face: FaceBox,
}

impl FaceDescriptor {
    pub fn new(values: Vec<f32>, landmarks: FaceLandmarks, face: FaceBox) -> Self {
        Self {
            values,
            landmarks,
            face,
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn landmarks(&self) -> &FaceLandmarks {
        &self.landmarks
    }

    pub fn face(&self) -> &FaceBox {
        &self.face
    }
}
