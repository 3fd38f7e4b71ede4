use crate::capture::domain::snapshot::Snapshot;
use crate::enrollment::domain::face_descriptor::FaceDescriptor;

/// In-progress enrollment: a label, the latest snapshot, and the faces
/// extracted from that snapshot.
///
/// Submittable exactly when the label is non-empty, a snapshot is present,
/// and at least one descriptor was extracted.
#[derive(Clone, Debug, Default)]
pub struct EnrollmentSession {
    label: String,
    snapshot: Option<Snapshot>,
    descriptors: Vec<FaceDescriptor>,
}

impl EnrollmentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Replaces the snapshot. Descriptors from the previous snapshot no
    /// longer describe it, so they are cleared until the next extraction.
    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
        self.descriptors.clear();
    }

    pub fn set_descriptors(&mut self, descriptors: Vec<FaceDescriptor>) {
        self.descriptors = descriptors;
    }

    pub fn is_submittable(&self) -> bool {
        !self.label.is_empty() && self.snapshot.is_some() && !self.descriptors.is_empty()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn descriptors(&self) -> &[FaceDescriptor] {
        &self.descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::FaceBox;
    use crate::detection::domain::face_landmarks::FaceLandmarks;
    use crate::shared::frame::Frame;
    use rstest::rstest;

    fn snapshot() -> Snapshot {
        Snapshot::encode(Frame::new(vec![0; 2 * 2 * 3], 2, 2, 0)).unwrap()
    }

    fn descriptor() -> FaceDescriptor {
        FaceDescriptor::new(
            vec![0.1, 0.2],
            FaceLandmarks::new(vec![(0.0, 0.0); 5]),
            FaceBox {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 1.0,
                score: 0.9,
            },
        )
    }

    #[rstest]
    #[case("", false, false, false)]
    #[case("alice", false, false, false)]
    #[case("alice", true, false, false)]
    #[case("", true, true, false)]
    #[case("alice", false, true, false)]
    #[case("alice", true, true, true)]
    fn test_submittable_iff_all_present(
        #[case] label: &str,
        #[case] with_snapshot: bool,
        #[case] with_descriptors: bool,
        #[case] expected: bool,
    ) {
        let mut session = EnrollmentSession::new();
        session.set_label(label);
        if with_snapshot {
            session.set_snapshot(snapshot());
        }
        if with_descriptors {
            session.set_descriptors(vec![descriptor()]);
        }
        assert_eq!(session.is_submittable(), expected);
    }

    #[test]
    fn test_new_snapshot_clears_descriptors() {
        let mut session = EnrollmentSession::new();
        session.set_label("alice");
        session.set_snapshot(snapshot());
        session.set_descriptors(vec![descriptor(), descriptor()]);
        assert!(session.is_submittable());

        session.set_snapshot(snapshot());

        assert!(session.descriptors().is_empty());
        assert!(!session.is_submittable());
    }

    #[test]
    fn test_set_descriptors_overwrites() {
        let mut session = EnrollmentSession::new();
        session.set_descriptors(vec![descriptor(), descriptor()]);
        session.set_descriptors(vec![descriptor()]);
        assert_eq!(session.descriptors().len(), 1);
    }

    #[test]
    fn test_whitespace_label_counts_as_non_empty() {
        let mut session = EnrollmentSession::new();
        session.set_label(" ");
        session.set_snapshot(snapshot());
        session.set_descriptors(vec![descriptor()]);
        assert!(session.is_submittable());
    }
}
