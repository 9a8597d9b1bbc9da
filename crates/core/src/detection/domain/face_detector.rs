use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Implementations may hold inference sessions or scratch buffers,
/// hence `&mut self`. Returned boxes are in frame-pixel coordinates but
/// are not guaranteed to lie inside the frame.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
