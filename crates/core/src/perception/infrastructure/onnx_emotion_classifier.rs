/// Facial-expression classifier backed by an ONNX Runtime session.
///
/// Expects the five-class retail emotion model: a `[1, 3, 64, 64]` BGR input
/// with raw pixel values and a probability vector over
/// [`EMOTION_LABELS`] as output.
use std::path::Path;

use crate::perception::domain::emotion_classifier::{EmotionClassifier, EmotionPrediction};
use crate::shared::frame::Frame;

use super::face_tensor::bgr_face_tensor;
use super::onnx_session::{build_session, input_size};

pub const EMOTION_LABELS: &[&str] = &["neutral", "happy", "sad", "surprise", "anger"];

const DEFAULT_INPUT_SIZE: u32 = 64;

pub struct OnnxEmotionClassifier {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxEmotionClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let input_size = input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        Ok(Self {
            session,
            input_size,
        })
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&mut self, face: &Frame) -> Result<EmotionPrediction, Box<dyn std::error::Error>> {
        let size = self.input_size as usize;
        let input = ort::value::Tensor::from_array(bgr_face_tensor(face, size, size))?;
        let outputs = self.session.run(ort::inputs![input])?;
        if outputs.len() == 0 {
            return Err("emotion model produced no outputs".into());
        }
        let probs = outputs[0].try_extract_array::<f32>()?;
        let probs = probs.as_slice().ok_or("Cannot get emotion output slice")?;
        decode(probs)
    }
}

/// Argmax over the class probabilities.
fn decode(probs: &[f32]) -> Result<EmotionPrediction, Box<dyn std::error::Error>> {
    if probs.len() < EMOTION_LABELS.len() {
        return Err(format!(
            "emotion model output has {} values, expected {}",
            probs.len(),
            EMOTION_LABELS.len()
        )
        .into());
    }
    let (best, confidence) = probs[..EMOTION_LABELS.len()]
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .ok_or("empty emotion output")?;
    Ok(EmotionPrediction {
        label: EMOTION_LABELS[best].to_string(),
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_picks_highest_probability() {
        let p = decode(&[0.1, 0.05, 0.05, 0.7, 0.1]).unwrap();
        assert_eq!(p.label, "surprise");
        assert!((p.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_decode_last_label() {
        let p = decode(&[0.0, 0.0, 0.0, 0.1, 0.9]).unwrap();
        assert_eq!(p.label, "anger");
    }

    #[test]
    fn test_decode_rejects_short_output() {
        assert!(decode(&[0.5, 0.5]).is_err());
    }

    #[test]
    fn test_labels_are_lowercase() {
        assert!(EMOTION_LABELS.iter().all(|l| l.to_lowercase() == *l));
    }
}
