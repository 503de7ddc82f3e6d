use super::engagement_status::EngagementStatus;

/// Identifier assigned by the identity tracker. Stable for one person
/// within a session and never reused.
pub type IdentityId = u32;

/// Engagement state for one identity seen during the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedIdentity {
    pub id: IdentityId,
    pub status: EngagementStatus,
    /// Consecutive observed frames in which this identity was flagged.
    pub consecutive_flag_count: u32,
    /// Most recent emotion label, for display only.
    pub last_emotion_label: String,
}

impl TrackedIdentity {
    pub fn new(id: IdentityId) -> Self {
        Self {
            id,
            status: EngagementStatus::Unknown,
            consecutive_flag_count: 0,
            last_emotion_label: String::new(),
        }
    }

    /// Applies one frame's combined disengagement signal.
    ///
    /// A flagged frame only increments the counter; the status changes to
    /// `Disengaged` once the counter exceeds `threshold`. An un-flagged frame
    /// resets the counter and sets `Engaged`. An identity flagged from its
    /// first frame therefore stays `Unknown` until one of those two happens.
    pub fn observe(&mut self, flagged: bool, emotion: &str, threshold: u32) -> EngagementStatus {
        self.last_emotion_label.clear();
        self.last_emotion_label.push_str(emotion);

        if flagged {
            self.consecutive_flag_count = self.consecutive_flag_count.saturating_add(1);
        } else {
            self.consecutive_flag_count = 0;
            self.status = EngagementStatus::Engaged;
        }

        if self.consecutive_flag_count > threshold {
            self.status = EngagementStatus::Disengaged;
        }

        self.status
    }
}
