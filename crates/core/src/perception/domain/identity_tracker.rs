use crate::engagement::domain::tracked_identity::IdentityId;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::face_detector::Detection;

/// A detection associated with a stable identity.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedFace {
    pub id: IdentityId,
    pub bbox: BoundingBox,
}

/// Associates per-frame detections into identities that persist across
/// frames. Ids must not be reused within a session.
pub trait IdentityTracker: Send {
    fn track(
        &mut self,
        detections: &[Detection],
        frame: &Frame,
    ) -> Result<Vec<TrackedFace>, Box<dyn std::error::Error>>;
}
