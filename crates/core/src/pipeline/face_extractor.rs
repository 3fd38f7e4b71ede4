use std::sync::Arc;

use thiserror::Error;

use crate::capture::domain::snapshot::Snapshot;
use crate::enrollment::domain::face_descriptor::FaceDescriptor;
use crate::models::domain::model_loader::ModelLoader;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("face models are not ready")]
    ModelsNotReady,
    #[error("face detection failed: {0}")]
    Detection(String),
    #[error("landmarks failed for face {index}: {reason}")]
    Landmarks { index: usize, reason: String },
    #[error("descriptor failed for face {index}: {reason}")]
    Descriptor { index: usize, reason: String },
}

/// Detection, then landmarks, then descriptor, for every face in a snapshot.
///
/// Results keep the detector's order. No faces is an empty result, not an error.
pub struct FaceExtractor {
    loader: Arc<ModelLoader>,
}

impl FaceExtractor {
    pub fn new(loader: Arc<ModelLoader>) -> Self {
        Self { loader }
    }

    pub fn extract(&self, snapshot: &Snapshot) -> Result<Vec<FaceDescriptor>, ExtractionError> {
        let models = self.loader.models().ok_or(ExtractionError::ModelsNotReady)?;
        let frame = snapshot.frame();

        let faces = models
            .detector
            .detect(frame)
            .map_err(|e| ExtractionError::Detection(e.to_string()))?;

        match faces.len() {
            0 => log::warn!("No face found in snapshot"),
            1 => {}
            n => log::warn!("{n} faces found in snapshot; all will be enrolled"),
        }

        faces
            .iter()
            .enumerate()
            .map(|(index, face)| {
                let landmarks = models.landmarker.landmarks(frame, face).map_err(|e| {
                    ExtractionError::Landmarks {
                        index,
                        reason: e.to_string(),
                    }
                })?;
                let values = models.descriptor.describe(frame, &landmarks).map_err(|e| {
                    ExtractionError::Descriptor {
                        index,
                        reason: e.to_string(),
                    }
                })?;
                Ok(FaceDescriptor::new(values, landmarks, *face))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_doubles::{
        face_at, failing_detector_loader, failing_loader, grey_frame, loader_with_faces,
    };

    fn snapshot() -> Snapshot {
        Snapshot::encode(grey_frame(8, 6)).unwrap()
    }

    fn ready(faces: Vec<crate::detection::domain::face_detector::FaceBox>) -> FaceExtractor {
        let loader = loader_with_faces(faces);
        loader.load().unwrap();
        FaceExtractor::new(loader)
    }

    #[test]
    fn test_unloaded_models_are_not_ready() {
        let extractor = FaceExtractor::new(loader_with_faces(vec![face_at(0.0, 0.0)]));
        assert!(matches!(
            extractor.extract(&snapshot()),
            Err(ExtractionError::ModelsNotReady)
        ));
    }

    #[test]
    fn test_failed_models_are_not_ready() {
        let loader = failing_loader();
        let _ = loader.load();
        let extractor = FaceExtractor::new(loader);
        assert!(matches!(
            extractor.extract(&snapshot()),
            Err(ExtractionError::ModelsNotReady)
        ));
    }

    #[test]
    fn test_single_face_yields_one_descriptor() {
        let descriptors = ready(vec![face_at(10.0, 20.0)]).extract(&snapshot()).unwrap();

        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].values(), &[10.0, 20.0, 1.0]);
        assert_eq!(descriptors[0].landmarks().len(), 5);
        assert_eq!(*descriptors[0].face(), face_at(10.0, 20.0));
    }

    #[test]
    fn test_no_face_yields_empty_sequence() {
        let descriptors = ready(vec![]).extract(&snapshot()).unwrap();
        assert!(descriptors.is_empty());
    }

    #[test]
    fn test_descriptors_follow_detection_order() {
        let faces = vec![face_at(50.0, 0.0), face_at(0.0, 0.0), face_at(25.0, 5.0)];
        let descriptors = ready(faces).extract(&snapshot()).unwrap();

        let xs: Vec<f32> = descriptors.iter().map(|d| d.values()[0]).collect();
        assert_eq!(xs, vec![50.0, 0.0, 25.0]);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = ready(vec![face_at(3.0, 4.0), face_at(30.0, 4.0)]);
        let snap = snapshot();
        let first = extractor.extract(&snap).unwrap();
        let second = extractor.extract(&snap).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_detector_failure_is_detection_error() {
        let loader = failing_detector_loader();
        loader.load().unwrap();

        let result = FaceExtractor::new(loader).extract(&snapshot());

        assert!(matches!(result, Err(ExtractionError::Detection(m)) if m.contains("exploded")));
    }
}
