use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_ATTENDANCE_SAMPLE_INTERVAL, DEFAULT_DISENGAGED_EMOTIONS,
    DEFAULT_DISENGAGEMENT_FRAME_THRESHOLD, DEFAULT_PITCH_THRESHOLD, DEFAULT_SNAPSHOT_INTERVAL,
    DEFAULT_YAW_THRESHOLD, MIN_FACE_SIZE,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{field} must be at least 1")]
    ZeroInterval { field: &'static str },
    #[error("{field} must be a finite, non-negative angle (got {value})")]
    InvalidAngle { field: &'static str, value: f64 },
}

/// Tunables for the engagement state machine and session cadences.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Degrees of absolute yaw above which a face counts as looking away.
    pub yaw_threshold: f64,
    /// Degrees of absolute pitch above which a face counts as looking away.
    pub pitch_threshold: f64,
    /// Consecutive flagged frames that must be exceeded before an identity
    /// becomes `Disengaged`.
    pub disengagement_frame_threshold: u32,
    /// Attendance is sampled on every N-th processed frame.
    pub attendance_sample_interval: u64,
    /// A snapshot is published on every N-th processed frame.
    pub snapshot_interval: u64,
    /// Emotion labels that flag a face on their own (compared case-insensitively).
    pub disengaged_emotions: Vec<String>,
    /// Face crops below this width or height are skipped for the frame.
    pub min_face_size: u32,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            yaw_threshold: DEFAULT_YAW_THRESHOLD,
            pitch_threshold: DEFAULT_PITCH_THRESHOLD,
            disengagement_frame_threshold: DEFAULT_DISENGAGEMENT_FRAME_THRESHOLD,
            attendance_sample_interval: DEFAULT_ATTENDANCE_SAMPLE_INTERVAL,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            disengaged_emotions: DEFAULT_DISENGAGED_EMOTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_face_size: MIN_FACE_SIZE,
        }
    }
}

impl EngagementConfig {
    /// Loads a JSON config file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngagementConfig =
            serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attendance_sample_interval == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "attendance_sample_interval",
            });
        }
        if self.snapshot_interval == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "snapshot_interval",
            });
        }
        for (field, value) in [
            ("yaw_threshold", self.yaw_threshold),
            ("pitch_threshold", self.pitch_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidAngle { field, value });
            }
        }
        Ok(())
    }
}
