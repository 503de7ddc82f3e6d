use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::monitor_engagement_use_case::{MonitorEngagementUseCase, MonitorSummary};

pub enum MonitorMessage {
    Progress(u64, u64),
    Finished(MonitorSummary),
    Error(String),
    Cancelled(MonitorSummary),
}

pub type ProgressCallback = Box<dyn Fn(u64, u64) -> bool + Send>;

/// Builds the use case on the worker thread, so model loading does not block
/// the caller. Receives the progress callback and cancellation flag to wire in.
pub type BuildUseCase = Box<
    dyn FnOnce(ProgressCallback, Arc<AtomicBool>) -> Result<MonitorEngagementUseCase, Box<dyn std::error::Error>>
        + Send,
>;

/// Runs a monitoring session on a dedicated thread.
///
/// Returns the message receiver and the cancellation flag. Exactly one of
/// `Finished`, `Cancelled` or `Error` is sent last.
pub fn spawn(source: PathBuf, build: BuildUseCase) -> (Receiver<MonitorMessage>, Arc<AtomicBool>) {
    let (tx, rx) = crossbeam_channel::unbounded::<MonitorMessage>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    thread::spawn(move || {
        let message = match run_monitor(&tx, &cancelled_clone, source, build) {
            Ok(summary) if summary.cancelled => MonitorMessage::Cancelled(summary),
            Ok(summary) => MonitorMessage::Finished(summary),
            Err(e) => MonitorMessage::Error(e.to_string()),
        };
        let _ = tx.send(message);
    });

    (rx, cancelled)
}

fn run_monitor(
    tx: &Sender<MonitorMessage>,
    cancelled: &Arc<AtomicBool>,
    source: PathBuf,
    build: BuildUseCase,
) -> Result<MonitorSummary, Box<dyn std::error::Error>> {
    let tx_progress = tx.clone();
    let cancelled_progress = cancelled.clone();
    let progress: ProgressCallback = Box::new(move |current, total| {
        let _ = tx_progress.send(MonitorMessage::Progress(current, total));
        !cancelled_progress.load(Ordering::Relaxed)
    });

    let mut use_case = build(progress, cancelled.clone())?;
    log::debug!("Monitor worker started for {}", source.display());
    Ok(use_case.execute(&source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::domain::engagement_config::EngagementConfig;
    use crate::engagement::infrastructure::snapshot_publisher::SnapshotPublisher;
    use crate::perception::domain::emotion_classifier::{EmotionClassifier, EmotionPrediction};
    use crate::perception::domain::face_detector::{Detection, FaceDetector};
    use crate::perception::domain::identity_tracker::{IdentityTracker, TrackedFace};
    use crate::perception::domain::pose_estimator::{HeadPose, PoseEstimator};
    use crate::pipeline::monitor_engagement_use_case::{FrameFailurePolicy, PerceptionStack};
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::video_reader::VideoReader;
    use std::path::Path;
    use std::time::Duration;

    struct BlankReader(usize);

    impl VideoReader for BlankReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(VideoMetadata {
                width: 64,
                height: 64,
                fps: 25.0,
                total_frames: self.0,
                codec: String::new(),
                source_path: None,
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new((0..self.0).map(|i| Ok(Frame::new(vec![0; 64 * 64 * 3], 64, 64, 3, i))))
        }

        fn close(&mut self) {}
    }

    struct NoDetections;

    impl FaceDetector for NoDetections {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            Ok(Vec::new())
        }
    }

    /// One fixed student in every frame.
    struct OneStudent;

    impl IdentityTracker for OneStudent {
        fn track(
            &mut self,
            _detections: &[Detection],
            _frame: &Frame,
        ) -> Result<Vec<TrackedFace>, Box<dyn std::error::Error>> {
            Ok(vec![TrackedFace {
                id: 1,
                bbox: BoundingBox::new(0.0, 0.0, 40.0, 40.0),
            }])
        }
    }

    struct Neutral;

    impl EmotionClassifier for Neutral {
        fn classify(&mut self, _face: &Frame) -> Result<EmotionPrediction, Box<dyn std::error::Error>> {
            Ok(EmotionPrediction {
                label: "neutral".to_string(),
                confidence: 1.0,
            })
        }
    }

    struct Forward;

    impl PoseEstimator for Forward {
        fn estimate(&mut self, _face: &Frame) -> Result<HeadPose, Box<dyn std::error::Error>> {
            Ok(HeadPose::default())
        }
    }

    fn builder(frames: usize) -> BuildUseCase {
        Box::new(
            move |progress: ProgressCallback,
                  cancelled: Arc<AtomicBool>|
                  -> Result<MonitorEngagementUseCase, Box<dyn std::error::Error>> {
            Ok(MonitorEngagementUseCase::new(
                Box::new(BlankReader(frames)),
                PerceptionStack {
                    detector: Box::new(NoDetections),
                    tracker: Box::new(OneStudent),
                    classifier: Box::new(Neutral),
                    estimator: Box::new(Forward),
                },
                &EngagementConfig {
                    attendance_sample_interval: 5,
                    ..EngagementConfig::default()
                },
                SnapshotPublisher::new(),
                FrameFailurePolicy::Skip,
                Box::new(NullPipelineLogger),
                Some(progress),
                Some(cancelled),
            ))
        },
        )
    }

    fn drain(rx: &Receiver<MonitorMessage>) -> Vec<MonitorMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.recv_timeout(Duration::from_secs(10)) {
            let last = !matches!(msg, MonitorMessage::Progress(..));
            out.push(msg);
            if last {
                break;
            }
        }
        out
    }

    #[test]
    fn test_reports_progress_then_finished() {
        let (rx, _cancel) = spawn(PathBuf::from("room.mp4"), builder(12));
        let messages = drain(&rx);

        let progress = messages
            .iter()
            .filter(|m| matches!(m, MonitorMessage::Progress(..)))
            .count();
        assert_eq!(progress, 12);
        match messages.last() {
            Some(MonitorMessage::Finished(summary)) => {
                assert_eq!(summary.frames_processed, 12);
                assert_eq!(summary.attendance_count, 1);
                assert!(!summary.final_snapshot.live);
            }
            _ => panic!("expected Finished"),
        }
    }

    #[test]
    fn test_build_failure_is_reported_as_error() {
        let build: BuildUseCase = Box::new(
            |_: ProgressCallback,
             _: Arc<AtomicBool>|
             -> Result<MonitorEngagementUseCase, Box<dyn std::error::Error>> {
                Err("model not found".into())
            },
        );
        let (rx, _cancel) = spawn(PathBuf::from("room.mp4"), build);
        match drain(&rx).last() {
            Some(MonitorMessage::Error(msg)) => assert!(msg.contains("model not found")),
            _ => panic!("expected Error"),
        }
    }

    #[test]
    fn test_build_failure_marks_snapshot_not_live() {
        let publisher = SnapshotPublisher::new();
        let reader = publisher.reader();
        let build: BuildUseCase = Box::new(
            move |_: ProgressCallback,
                  _: Arc<AtomicBool>|
                  -> Result<MonitorEngagementUseCase, Box<dyn std::error::Error>> {
                let _publisher = publisher;
                Err("emotion model is corrupt".into())
            },
        );

        let (rx, _cancel) = spawn(PathBuf::from("room.mp4"), build);
        assert!(matches!(drain(&rx).last(), Some(MonitorMessage::Error(_))));

        let snapshot = reader.get_snapshot();
        assert!(!snapshot.live);
        assert_eq!(snapshot.frame, 0);
    }

    #[test]
    fn test_cancel_flag_stops_worker() {
        let (rx, cancel) = spawn(PathBuf::from("room.mp4"), builder(usize::MAX));
        // wait for the loop to start before cancelling
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(10)),
            Ok(MonitorMessage::Progress(..))
        ));
        cancel.store(true, Ordering::Relaxed);

        match drain(&rx).last() {
            Some(MonitorMessage::Cancelled(summary)) => assert!(summary.cancelled),
            _ => panic!("expected Cancelled"),
        }
    }
}
