use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// A single detection produced by a [`FaceDetector`].
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
    pub class_label: String,
}

/// Domain interface for face detection on a full frame.
///
/// Implementations may hold inference sessions that need exclusive access,
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
