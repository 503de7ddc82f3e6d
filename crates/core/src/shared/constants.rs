pub const FACE_DETECTOR_MODEL_NAME: &str = "yolov8n-face.onnx";
pub const EMOTION_MODEL_NAME: &str = "emotions-recognition-retail-0003.onnx";
pub const HEAD_POSE_MODEL_NAME: &str = "head-pose-estimation-adas-0001.onnx";

pub const DEFAULT_DETECTOR_CONFIDENCE: f64 = 0.45;
pub const DEFAULT_NMS_IOU: f64 = 0.5;

/// Max frames a track can go unmatched before removal (~2 seconds at 25 fps).
pub const TRACKER_MAX_LOST: usize = 50;

/// Matched frames required before a new track is reported.
pub const TRACKER_MIN_HITS: usize = 3;

/// Face crops narrower or shorter than this are skipped for the frame.
pub const MIN_FACE_SIZE: u32 = 20;

pub const DEFAULT_YAW_THRESHOLD: f64 = 33.0;
pub const DEFAULT_PITCH_THRESHOLD: f64 = 23.0;
pub const DEFAULT_DISENGAGEMENT_FRAME_THRESHOLD: u32 = 6;
pub const DEFAULT_ATTENDANCE_SAMPLE_INTERVAL: u64 = 50;
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 10;
pub const DEFAULT_DISENGAGED_EMOTIONS: &[&str] = &["surprise", "fear", "disgust", "anger"];

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
