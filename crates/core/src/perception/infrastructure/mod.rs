pub mod bytetrack_tracker;
mod face_tensor;
pub mod onnx_emotion_classifier;
pub mod onnx_head_pose_estimator;
pub mod onnx_session;
pub mod onnx_yolo_detector;
