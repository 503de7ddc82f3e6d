use serde::{Deserialize, Serialize};

/// Hysteresis-smoothed engagement classification for one identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngagementStatus {
    /// Never un-flagged and never past the disengagement threshold.
    #[default]
    Unknown,
    Engaged,
    Disengaged,
}

impl std::fmt::Display for EngagementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngagementStatus::Unknown => write!(f, "Unknown"),
            EngagementStatus::Engaged => write!(f, "Engaged"),
            EngagementStatus::Disengaged => write!(f, "Disengaged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(EngagementStatus::default(), EngagementStatus::Unknown);
    }

    #[test]
    fn test_serializes_as_variant_name() {
        let json = serde_json::to_string(&EngagementStatus::Disengaged).unwrap();
        assert_eq!(json, "\"Disengaged\"");
        let back: EngagementStatus = serde_json::from_str("\"Engaged\"").unwrap();
        assert_eq!(back, EngagementStatus::Engaged);
    }

    #[test]
    fn test_display_matches_wire_name() {
        assert_eq!(EngagementStatus::Unknown.to_string(), "Unknown");
    }
}
