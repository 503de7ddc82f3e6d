use crate::shared::frame::Frame;

#[derive(Clone, Debug, PartialEq)]
pub struct EmotionPrediction {
    pub label: String,
    pub confidence: f32,
}

/// Classifies the facial expression in a face crop.
pub trait EmotionClassifier: Send {
    fn classify(&mut self, face: &Frame) -> Result<EmotionPrediction, Box<dyn std::error::Error>>;
}
