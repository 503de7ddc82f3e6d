use super::disengagement_rules::{DisengagementRules, FaceSignal};
use super::engagement_config::EngagementConfig;
use super::engagement_status::EngagementStatus;
use super::identity_registry::IdentityRegistry;
use super::session_attendance::SessionAttendance;
use super::snapshot::{EngagementEntry, Snapshot};
use super::tracked_identity::{IdentityId, TrackedIdentity};

/// One identity's signals for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceObservation {
    pub id: IdentityId,
    pub signal: FaceSignal,
}

/// What happened when a frame was folded into the session.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub frame_number: u64,
    pub engagement: Vec<EngagementEntry>,
    pub attendance_sampled: bool,
    /// Present on snapshot boundaries; the caller publishes it.
    pub snapshot: Option<Snapshot>,
}

/// Producer-owned engagement state for a single session.
///
/// Folds per-frame observations into the identity registry and the
/// attendance set, and builds a snapshot every `snapshot_interval` frames.
/// Frame numbers start at 1.
pub struct EngagementSession {
    rules: DisengagementRules,
    disengagement_threshold: u32,
    snapshot_interval: u64,
    registry: IdentityRegistry,
    attendance: SessionAttendance,
    frame_number: u64,
}

impl EngagementSession {
    pub fn new(config: &EngagementConfig) -> Self {
        Self {
            rules: DisengagementRules::new(config),
            disengagement_threshold: config.disengagement_frame_threshold,
            snapshot_interval: config.snapshot_interval.max(1),
            registry: IdentityRegistry::new(),
            attendance: SessionAttendance::new(config.attendance_sample_interval),
            frame_number: 0,
        }
    }

    /// Advances to the next frame and applies every observation in order.
    pub fn process_frame(&mut self, observations: &[FaceObservation]) -> FrameOutcome {
        self.frame_number += 1;
        let frame_number = self.frame_number;

        let mut engagement = Vec::with_capacity(observations.len());
        for obs in observations {
            let emotion = obs.signal.emotion.to_lowercase();
            let flagged = self.rules.is_flagged(&obs.signal);
            let status = self.registry.lookup_or_insert(obs.id).observe(
                flagged,
                &emotion,
                self.disengagement_threshold,
            );
            engagement.push(EngagementEntry {
                id: obs.id,
                emotion,
                status,
            });
        }

        let attendance_sampled = self
            .attendance
            .sample(frame_number, observations.iter().map(|o| o.id));

        let snapshot = (frame_number % self.snapshot_interval == 0).then(|| Snapshot {
            present_ids: self.attendance.seen_ids(),
            engagement_list: engagement.clone(),
            frame: frame_number,
            live: true,
        });

        FrameOutcome {
            frame_number,
            engagement,
            attendance_sampled,
            snapshot,
        }
    }

    /// Consumes a frame number without touching any identity or attendance
    /// state, for frames whose perception failed.
    pub fn skip_frame(&mut self) -> u64 {
        self.frame_number += 1;
        self.frame_number
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn identity(&self, id: IdentityId) -> Option<&TrackedIdentity> {
        self.registry.get(id)
    }

    pub fn status_of(&self, id: IdentityId) -> EngagementStatus {
        self.registry
            .get(id)
            .map(|i| i.status)
            .unwrap_or_default()
    }

    pub fn attendance(&self) -> &SessionAttendance {
        &self.attendance
    }

    pub fn identity_count(&self) -> usize {
        self.registry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngagementConfig {
        EngagementConfig::default()
    }

    fn obs(id: IdentityId, yaw: f64, pitch: f64, emotion: &str) -> FaceObservation {
        FaceObservation {
            id,
            signal: FaceSignal {
                yaw,
                pitch,
                emotion: emotion.to_string(),
            },
        }
    }

    #[test]
    fn test_frame_numbers_start_at_one() {
        let mut session = EngagementSession::new(&config());
        assert_eq!(session.frame_number(), 0);
        assert_eq!(session.process_frame(&[]).frame_number, 1);
        assert_eq!(session.skip_frame(), 2);
        assert_eq!(session.process_frame(&[]).frame_number, 3);
    }

    #[test]
    fn test_looking_away_for_seven_frames_disengages() {
        let mut session = EngagementSession::new(&config());
        for _ in 0..6 {
            session.process_frame(&[obs(1, 40.0, 0.0, "neutral")]);
            assert_ne!(session.status_of(1), EngagementStatus::Disengaged);
        }
        session.process_frame(&[obs(1, 40.0, 0.0, "neutral")]);
        assert_eq!(session.status_of(1), EngagementStatus::Disengaged);
    }

    #[test]
    fn test_clear_frame_after_three_flagged_frames_engages() {
        let mut session = EngagementSession::new(&config());
        for _ in 0..3 {
            session.process_frame(&[obs(1, 0.0, 30.0, "neutral")]);
        }
        session.process_frame(&[obs(1, 0.0, 0.0, "neutral")]);

        let identity = session.identity(1).unwrap();
        assert_eq!(identity.consecutive_flag_count, 0);
        assert_eq!(identity.status, EngagementStatus::Engaged);
    }

    #[test]
    fn test_anger_within_gaze_thresholds_is_flagged() {
        let mut session = EngagementSession::new(&config());
        session.process_frame(&[obs(1, 5.0, 5.0, "anger")]);
        assert_eq!(session.identity(1).unwrap().consecutive_flag_count, 1);
    }

    #[test]
    fn test_emotion_is_reported_lowercase() {
        let mut session = EngagementSession::new(&config());
        let outcome = session.process_frame(&[obs(1, 0.0, 0.0, "Happy")]);
        assert_eq!(outcome.engagement[0].emotion, "happy");
        assert_eq!(session.identity(1).unwrap().last_emotion_label, "happy");
    }

    #[test]
    fn test_attendance_sampled_at_interval_only() {
        let mut session = EngagementSession::new(&config());
        for frame in 1..=60u64 {
            let outcome = session.process_frame(&[obs(7, 0.0, 0.0, "neutral")]);
            assert_eq!(outcome.attendance_sampled, frame == 50);
            if frame < 50 {
                assert_eq!(session.attendance().count(), 0);
            }
        }
        for _ in 61..=100 {
            session.process_frame(&[]);
        }
        assert!(session.attendance().contains(7));
    }

    #[test]
    fn test_snapshot_built_every_interval() {
        let mut session = EngagementSession::new(&config());
        for frame in 1..=30u64 {
            let outcome = session.process_frame(&[obs(1, 0.0, 0.0, "neutral")]);
            assert_eq!(outcome.snapshot.is_some(), frame % 10 == 0);
        }
    }

    #[test]
    fn test_snapshot_contents_come_from_the_same_frame() {
        let cfg = EngagementConfig {
            attendance_sample_interval: 10,
            snapshot_interval: 10,
            ..config()
        };
        let mut session = EngagementSession::new(&cfg);
        for _ in 0..9 {
            session.process_frame(&[obs(1, 0.0, 0.0, "neutral")]);
        }
        let outcome = session.process_frame(&[
            obs(1, 0.0, 0.0, "neutral"),
            obs(2, 50.0, 0.0, "sad"),
        ]);
        let snapshot = outcome.snapshot.unwrap();
        assert_eq!(snapshot.frame, 10);
        assert!(snapshot.live);
        assert_eq!(snapshot.present_ids, vec![1, 2]);
        assert_eq!(snapshot.engagement_list.len(), 2);
        assert_eq!(snapshot.engagement_list[0].status, EngagementStatus::Engaged);
        assert_eq!(snapshot.engagement_list[1].status, EngagementStatus::Unknown);
    }

    #[test]
    fn test_skipped_frame_leaves_state_untouched() {
        let mut session = EngagementSession::new(&config());
        session.process_frame(&[obs(1, 40.0, 0.0, "neutral")]);
        session.skip_frame();
        assert_eq!(session.identity(1).unwrap().consecutive_flag_count, 1);
        assert_eq!(session.identity_count(), 1);
    }

    #[test]
    fn test_identities_progress_independently() {
        let mut session = EngagementSession::new(&config());
        for _ in 0..7 {
            session.process_frame(&[obs(1, 40.0, 0.0, "neutral"), obs(2, 0.0, 0.0, "neutral")]);
        }
        assert_eq!(session.status_of(1), EngagementStatus::Disengaged);
        assert_eq!(session.status_of(2), EngagementStatus::Engaged);
        assert_eq!(session.status_of(3), EngagementStatus::Unknown);
    }
}
