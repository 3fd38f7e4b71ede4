/// 68-point landmark regressor using ONNX Runtime.
///
/// Runs on a square crop around the detected face; the model emits
/// `(x, y)` pairs normalized to that crop, which are mapped back to frame
/// coordinates here.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::face_detector::FaceBox;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::shared::frame::Frame;

use super::execution_provider::{build_session, declared_input_size};
use super::tensor::nchw_tensor;

const DEFAULT_INPUT_SIZE: u32 = 112;

/// Fraction of the box size added on each side before cropping.
const CROP_MARGIN: f64 = 0.1;

pub struct OnnxLandmarkDetector {
    session: Mutex<ort::session::Session>,
    input_size: u32,
}

impl OnnxLandmarkDetector {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let input_size = declared_input_size(&session, DEFAULT_INPUT_SIZE);
        log::debug!("Landmark model loaded: {} ({input_size}px)", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
            input_size,
        })
    }
}

impl LandmarkDetector for OnnxLandmarkDetector {
    fn landmarks(
        &self,
        frame: &Frame,
        face: &FaceBox,
    ) -> Result<FaceLandmarks, Box<dyn std::error::Error>> {
        let (x1, y1, side) = square_crop_bounds(face);
        let crop = frame
            .crop(x1, y1, x1 + side, y1 + side)
            .ok_or("Face box lies outside the frame")?;

        let tensor = nchw_tensor(&crop, self.input_size as usize, 0.0, 255.0);
        let input_value = ort::value::Tensor::from_array(tensor)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let coords = outputs[0].try_extract_array::<f32>()?;
        let coords: Vec<f32> = coords.iter().copied().collect();

        // Crop may have been clamped at the frame edge.
        let crop_x = x1.max(0) as f64;
        let crop_y = y1.max(0) as f64;
        Ok(to_frame_coords(
            &coords,
            crop_x,
            crop_y,
            crop.width() as f64,
            crop.height() as f64,
        )?)
    }
}

/// Square crop around the box center, expanded by `CROP_MARGIN`.
fn square_crop_bounds(face: &FaceBox) -> (i32, i32, i32) {
    let side = face.width().max(face.height()) * (1.0 + 2.0 * CROP_MARGIN);
    let cx = (face.x1 + face.x2) / 2.0;
    let cy = (face.y1 + face.y2) / 2.0;
    let side_px = side.round().max(1.0) as i32;
    (
        (cx - side / 2.0).round() as i32,
        (cy - side / 2.0).round() as i32,
        side_px,
    )
}

fn to_frame_coords(
    coords: &[f32],
    crop_x: f64,
    crop_y: f64,
    crop_w: f64,
    crop_h: f64,
) -> Result<FaceLandmarks, String> {
    if coords.is_empty() || coords.len() % 2 != 0 {
        return Err(format!(
            "Landmark model returned {} values; expected (x, y) pairs",
            coords.len()
        ));
    }
    let points = coords
        .chunks_exact(2)
        .map(|p| {
            (
                crop_x + p[0] as f64 * crop_w,
                crop_y + p[1] as f64 * crop_h,
            )
        })
        .collect();
    Ok(FaceLandmarks::new(points))
}
