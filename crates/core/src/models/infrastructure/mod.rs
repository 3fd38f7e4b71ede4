pub mod model_resolver;
pub mod onnx_model_backend;
pub mod resolved_model_source;
