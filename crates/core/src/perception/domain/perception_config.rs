use crate::shared::constants::{
    DEFAULT_DETECTOR_CONFIDENCE, DEFAULT_NMS_IOU, EMOTION_MODEL_NAME, FACE_DETECTOR_MODEL_NAME,
    HEAD_POSE_MODEL_NAME, TRACKER_MAX_LOST, TRACKER_MIN_HITS,
};

/// Tunables for the perception adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptionConfig {
    pub detector_confidence: f64,
    pub nms_iou: f64,
    pub tracker_max_lost: usize,
    pub tracker_min_hits: usize,
    pub detector_model: String,
    pub emotion_model: String,
    pub head_pose_model: String,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            detector_confidence: DEFAULT_DETECTOR_CONFIDENCE,
            nms_iou: DEFAULT_NMS_IOU,
            tracker_max_lost: TRACKER_MAX_LOST,
            tracker_min_hits: TRACKER_MIN_HITS,
            detector_model: FACE_DETECTOR_MODEL_NAME.to_string(),
            emotion_model: EMOTION_MODEL_NAME.to_string(),
            head_pose_model: HEAD_POSE_MODEL_NAME.to_string(),
        }
    }
}
