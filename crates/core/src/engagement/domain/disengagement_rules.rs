use std::collections::HashSet;

use super::engagement_config::EngagementConfig;

/// Per-frame signals for one face, as produced by the perception stage.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSignal {
    /// Signed head yaw in degrees.
    pub yaw: f64,
    /// Signed head pitch in degrees.
    pub pitch: f64,
    pub emotion: String,
}

/// Reduces a [`FaceSignal`] to the booleans the state machine consumes.
#[derive(Debug, Clone)]
pub struct DisengagementRules {
    yaw_threshold: f64,
    pitch_threshold: f64,
    disengaged_emotions: HashSet<String>,
}

impl DisengagementRules {
    pub fn new(config: &EngagementConfig) -> Self {
        Self {
            yaw_threshold: config.yaw_threshold,
            pitch_threshold: config.pitch_threshold,
            disengaged_emotions: config
                .disengaged_emotions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    /// Strictly greater than either threshold; a NaN angle never flags.
    pub fn is_looking_away(&self, yaw: f64, pitch: f64) -> bool {
        yaw.abs() > self.yaw_threshold || pitch.abs() > self.pitch_threshold
    }

    /// Labels outside the configured set (including unrecognized ones)
    /// are not disengaging.
    pub fn is_disengaged_emotion(&self, label: &str) -> bool {
        self.disengaged_emotions.contains(&label.to_lowercase())
    }

    pub fn is_flagged(&self, signal: &FaceSignal) -> bool {
        self.is_looking_away(signal.yaw, signal.pitch) || self.is_disengaged_emotion(&signal.emotion)
    }
}
