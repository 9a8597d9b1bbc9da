pub mod engine_face_detector;
pub mod execution_provider;
pub mod haar_cascade_detector;
pub mod math;
pub mod onnx_blazeface_detector;
