use crate::shared::frame::Frame;

/// Head orientation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

/// Estimates head orientation from a face crop.
pub trait PoseEstimator: Send {
    fn estimate(&mut self, face: &Frame) -> Result<HeadPose, Box<dyn std::error::Error>>;
}
