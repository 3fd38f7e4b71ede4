use std::fmt;

use crate::shared::constants::{
    DESCRIPTOR_MODEL_NAME, DESCRIPTOR_MODEL_URL, DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL,
    LANDMARK_MODEL_NAME,
};

/// Lifecycle of the face models, as seen by the control layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// The three model files that must all load before capture is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelArtifact {
    Detector,
    Landmarker,
    Descriptor,
}

impl ModelArtifact {
    pub const ALL: [ModelArtifact; 3] = [
        ModelArtifact::Detector,
        ModelArtifact::Landmarker,
        ModelArtifact::Descriptor,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ModelArtifact::Detector => DETECTOR_MODEL_NAME,
            ModelArtifact::Landmarker => LANDMARK_MODEL_NAME,
            ModelArtifact::Descriptor => DESCRIPTOR_MODEL_NAME,
        }
    }

    /// Published download location, if the artifact has one.
    pub fn release_url(self) -> Option<&'static str> {
        match self {
            ModelArtifact::Detector => Some(DETECTOR_MODEL_URL),
            ModelArtifact::Landmarker => None,
            ModelArtifact::Descriptor => Some(DESCRIPTOR_MODEL_URL),
        }
    }
}

impl fmt::Display for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelArtifact::Detector => write!(f, "face detector"),
            ModelArtifact::Landmarker => write!(f, "landmark"),
            ModelArtifact::Descriptor => write!(f, "descriptor"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            ModelArtifact::ALL.iter().map(|a| a.file_name()).collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_landmarker_has_no_release_url() {
        assert!(ModelArtifact::Landmarker.release_url().is_none());
        assert!(ModelArtifact::Detector.release_url().is_some());
    }
}
