pub mod detector_factory;
pub mod fallback_detector;
pub mod lazy_detector;
pub(crate) mod math;
pub mod model_resolver;
pub mod onnx_blazeface_detector;
mod onnx_session;
pub mod onnx_yolo_detector;
pub mod streaming_detector;
