pub mod execution_provider;
pub mod face_alignment;
pub mod onnx_descriptor_extractor;
pub mod onnx_face_detector;
pub mod onnx_landmark_detector;
mod tensor;
