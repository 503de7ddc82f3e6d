pub mod emotion_classifier;
pub mod face_detector;
pub mod identity_tracker;
pub mod perception_config;
pub mod pose_estimator;
