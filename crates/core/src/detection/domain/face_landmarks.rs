//! Facial landmark sets and the five alignment anchors derived from them.
//!
//! Two layouts are understood: the 68-point iBUG scheme produced by the
//! landmark model, and the 5-point scheme (eyes, nose, mouth corners) used
//! by the alignment template. "Left" always means image-left.

use std::ops::Range;

const IBUG_POINTS: usize = 68;
const IBUG_LEFT_EYE: Range<usize> = 36..42;
const IBUG_RIGHT_EYE: Range<usize> = 42..48;
const IBUG_NOSE_TIP: usize = 30;
const IBUG_MOUTH_LEFT: usize = 48;
const IBUG_MOUTH_RIGHT: usize = 54;

const ANCHOR_POINTS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<(f64, f64)>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Left eye, right eye, nose tip, left mouth corner, right mouth corner.
    pub fn anchors(&self) -> Result<[(f64, f64); 5], String> {
        match self.points.len() {
            IBUG_POINTS => Ok([
                mean(&self.points[IBUG_LEFT_EYE]),
                mean(&self.points[IBUG_RIGHT_EYE]),
                self.points[IBUG_NOSE_TIP],
                self.points[IBUG_MOUTH_LEFT],
                self.points[IBUG_MOUTH_RIGHT],
            ]),
            ANCHOR_POINTS => {
                let mut anchors = [(0.0, 0.0); 5];
                anchors.copy_from_slice(&self.points);
                Ok(anchors)
            }
            n => Err(format!(
                "unsupported landmark layout: {n} points (expected {IBUG_POINTS} or {ANCHOR_POINTS})"
            )),
        }
    }
}

fn mean(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
    (sx / n, sy / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn ibug_landmarks() -> FaceLandmarks {
        let mut pts: Vec<(f64, f64)> = (0..68).map(|i| (i as f64, 0.0)).collect();
        for (offset, i) in IBUG_LEFT_EYE.enumerate() {
            pts[i] = (100.0 + offset as f64, 50.0);
        }
        for (offset, i) in IBUG_RIGHT_EYE.enumerate() {
            pts[i] = (200.0 + offset as f64, 52.0);
        }
        pts[IBUG_NOSE_TIP] = (150.0, 100.0);
        pts[IBUG_MOUTH_LEFT] = (120.0, 140.0);
        pts[IBUG_MOUTH_RIGHT] = (180.0, 140.0);
        FaceLandmarks::new(pts)
    }

    #[test]
    fn test_anchors_from_ibug_average_eye_contours() {
        let anchors = ibug_landmarks().anchors().unwrap();
        // Eye x offsets 0..6 average to 2.5
        assert_relative_eq!(anchors[0].0, 102.5);
        assert_relative_eq!(anchors[0].1, 50.0);
        assert_relative_eq!(anchors[1].0, 202.5);
        assert_relative_eq!(anchors[1].1, 52.0);
        assert_eq!(anchors[2], (150.0, 100.0));
        assert_eq!(anchors[3], (120.0, 140.0));
        assert_eq!(anchors[4], (180.0, 140.0));
    }

    #[test]
    fn test_anchors_from_five_points_pass_through() {
        let pts = vec![(1.0, 2.0), (3.0, 4.0), (5.0, 6.0), (7.0, 8.0), (9.0, 10.0)];
        let anchors = FaceLandmarks::new(pts.clone()).anchors().unwrap();
        assert_eq!(anchors.to_vec(), pts);
    }

    #[rstest]
    #[case::empty(0)]
    #[case::three(3)]
    #[case::dense(106)]
    fn test_anchors_unsupported_layout(#[case] n: usize) {
        let lm = FaceLandmarks::new(vec![(1.0, 1.0); n]);
        assert!(lm.anchors().is_err());
    }

    #[test]
    fn test_len_and_is_empty() {
        assert!(FaceLandmarks::new(Vec::new()).is_empty());
        assert_eq!(ibug_landmarks().len(), 68);
    }
}
