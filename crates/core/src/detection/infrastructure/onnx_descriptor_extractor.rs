/// ArcFace descriptor extractor using ONNX Runtime.
///
/// Aligns the face onto the 112×112 ArcFace template using five anchors
/// derived from its landmarks, then L2-normalizes the model output.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::descriptor_extractor::DescriptorExtractor;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::face_alignment::{align_face, ALIGNED_SIZE};
use super::tensor::nchw_tensor;

const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxDescriptorExtractor {
    session: Mutex<ort::session::Session>,
}

impl OnnxDescriptorExtractor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        log::debug!("Descriptor model loaded: {}", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl DescriptorExtractor for OnnxDescriptorExtractor {
    fn describe(
        &self,
        frame: &Frame,
        landmarks: &FaceLandmarks,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let anchors = landmarks.anchors()?;
        let aligned = align_face(frame, &anchors).ok_or("Degenerate landmarks, cannot align")?;

        let tensor = nchw_tensor(&aligned, ALIGNED_SIZE as usize, NORM_MEAN, NORM_STD);
        let input_value = ort::value::Tensor::from_array(tensor)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;

        let mut embedding: Vec<f32> = embedding_array.iter().copied().collect();
        if embedding.is_empty() {
            return Err("Descriptor model produced an empty embedding".into());
        }
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
