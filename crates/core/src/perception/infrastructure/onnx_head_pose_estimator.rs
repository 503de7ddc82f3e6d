/// Head-pose estimator backed by an ONNX Runtime session.
///
/// Expects a `[1, 3, 60, 60]` BGR input with raw pixel values and three
/// scalar outputs named `angle_y_fc`, `angle_p_fc` and `angle_r_fc`
/// (yaw, pitch, roll in degrees).
use std::path::Path;

use crate::perception::domain::pose_estimator::{HeadPose, PoseEstimator};
use crate::shared::frame::Frame;

use super::face_tensor::bgr_face_tensor;
use super::onnx_session::{build_session, input_size};

const DEFAULT_INPUT_SIZE: u32 = 60;

const YAW_OUTPUT: &str = "angle_y_fc";
const PITCH_OUTPUT: &str = "angle_p_fc";
const ROLL_OUTPUT: &str = "angle_r_fc";

pub struct OnnxHeadPoseEstimator {
    session: ort::session::Session,
    input_size: u32,
    /// Output positions for yaw, pitch, roll.
    output_indices: [usize; 3],
}

impl OnnxHeadPoseEstimator {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let input_size = input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        let names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        let output_indices = resolve_output_indices(&names)?;
        Ok(Self {
            session,
            input_size,
            output_indices,
        })
    }
}

impl PoseEstimator for OnnxHeadPoseEstimator {
    fn estimate(&mut self, face: &Frame) -> Result<HeadPose, Box<dyn std::error::Error>> {
        let size = self.input_size as usize;
        let input = ort::value::Tensor::from_array(bgr_face_tensor(face, size, size))?;
        let outputs = self.session.run(ort::inputs![input])?;

        let mut angles = [0.0f64; 3];
        for (angle, &idx) in angles.iter_mut().zip(self.output_indices.iter()) {
            let value = outputs[idx].try_extract_array::<f32>()?;
            *angle = *value.iter().next().ok_or("empty head-pose output")? as f64;
        }

        Ok(HeadPose {
            yaw: angles[0],
            pitch: angles[1],
            roll: angles[2],
        })
    }
}

/// Locates the yaw/pitch/roll outputs by name, falling back to positional
/// order for exports that dropped the names.
fn resolve_output_indices(names: &[String]) -> Result<[usize; 3], Box<dyn std::error::Error>> {
    let find = |wanted: &str| names.iter().position(|n| n == wanted);
    match (find(YAW_OUTPUT), find(PITCH_OUTPUT), find(ROLL_OUTPUT)) {
        (Some(y), Some(p), Some(r)) => Ok([y, p, r]),
        _ if names.len() >= 3 => {
            log::warn!("Head-pose model outputs {names:?} are unnamed; assuming yaw, pitch, roll order");
            Ok([0, 1, 2])
        }
        _ => Err(format!("head-pose model needs 3 outputs, found {}", names.len()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_outputs_resolved_by_name() {
        let idx =
            resolve_output_indices(&names(&["angle_r_fc", "angle_p_fc", "angle_y_fc"])).unwrap();
        assert_eq!(idx, [2, 1, 0]);
    }

    #[test]
    fn test_unnamed_outputs_use_positional_order() {
        let idx = resolve_output_indices(&names(&["out0", "out1", "out2"])).unwrap();
        assert_eq!(idx, [0, 1, 2]);
    }

    #[test]
    fn test_too_few_outputs_is_error() {
        assert!(resolve_output_indices(&names(&["angle_y_fc"])).is_err());
    }
}
