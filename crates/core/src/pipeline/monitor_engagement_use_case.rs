use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::engagement::domain::disengagement_rules::FaceSignal;
use crate::engagement::domain::engagement_config::EngagementConfig;
use crate::engagement::domain::engagement_session::{EngagementSession, FaceObservation};
use crate::engagement::domain::snapshot::Snapshot;
use crate::engagement::infrastructure::snapshot_publisher::{SnapshotPublisher, SnapshotReader};
use crate::perception::domain::emotion_classifier::EmotionClassifier;
use crate::perception::domain::face_detector::FaceDetector;
use crate::perception::domain::identity_tracker::IdentityTracker;
use crate::perception::domain::pose_estimator::PoseEstimator;
use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;

use super::pipeline_logger::PipelineLogger;

/// What the loop does when a perception collaborator fails on a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameFailurePolicy {
    /// Stop the session and report the failure.
    Halt,
    /// Log the failure, leave all state untouched for that frame and continue.
    #[default]
    Skip,
}

/// Perception stage a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detect,
    Track,
    Classify,
    Pose,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Detect => "detect",
            Stage::Track => "track",
            Stage::Classify => "classify",
            Stage::Pose => "pose",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error("failed to open {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("frame source failed at frame {frame}: {message}")]
    Read { frame: u64, message: String },
    #[error("{stage} failed at frame {frame}: {message}")]
    Stage {
        stage: Stage,
        frame: u64,
        message: String,
    },
    #[error("monitor already started")]
    AlreadyStarted,
}

/// Outcome of a monitoring session that ended without error.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSummary {
    /// Frames folded into the engagement state.
    pub frames_processed: u64,
    /// Frames dropped under [`FrameFailurePolicy::Skip`].
    pub frames_skipped: u64,
    pub attendance_count: usize,
    pub cancelled: bool,
    pub final_snapshot: Arc<Snapshot>,
}

/// The four perception collaborators, invoked in order for every frame.
pub struct PerceptionStack {
    pub detector: Box<dyn FaceDetector>,
    pub tracker: Box<dyn IdentityTracker>,
    pub classifier: Box<dyn EmotionClassifier>,
    pub estimator: Box<dyn PoseEstimator>,
}

struct StageFailure {
    stage: Stage,
    message: String,
}

impl StageFailure {
    fn new(stage: Stage, err: impl fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

/// Per-frame perception result, gathered before any state changes.
struct Perceived {
    observations: Vec<FaceObservation>,
    skipped_crops: usize,
}

/// Drives a frame source through perception into the engagement session and
/// publishes snapshots for readers.
///
/// Single-use: `execute` consumes the reader, so a second call fails with
/// [`MonitorError::AlreadyStarted`].
pub struct MonitorEngagementUseCase {
    reader: Option<Box<dyn VideoReader>>,
    perception: PerceptionStack,
    session: EngagementSession,
    publisher: SnapshotPublisher,
    min_face_size: u32,
    policy: FrameFailurePolicy,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<Box<dyn Fn(u64, u64) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl MonitorEngagementUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        perception: PerceptionStack,
        config: &EngagementConfig,
        publisher: SnapshotPublisher,
        policy: FrameFailurePolicy,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<Box<dyn Fn(u64, u64) -> bool + Send>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader: Some(reader),
            perception,
            session: EngagementSession::new(config),
            publisher,
            min_face_size: config.min_face_size,
            policy,
            logger,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn snapshot_reader(&self) -> SnapshotReader {
        self.publisher.reader()
    }

    /// Runs until end-of-stream, cancellation or a fatal failure.
    ///
    /// Whatever the outcome, the last published snapshot is marked finished
    /// and stays readable.
    pub fn execute(&mut self, source: &Path) -> Result<MonitorSummary, MonitorError> {
        let mut reader = self.reader.take().ok_or(MonitorError::AlreadyStarted)?;

        let result = match reader.open(source) {
            Ok(metadata) => {
                let length = if metadata.is_unbounded() {
                    "unbounded".to_string()
                } else {
                    format!("{} frames", metadata.total_frames)
                };
                self.logger.info(&format!(
                    "Monitoring {} ({}x{}, {length})",
                    source.display(),
                    metadata.width,
                    metadata.height
                ));
                let outcome = self.run(reader.as_mut(), metadata.total_frames as u64);
                reader.close();
                outcome
            }
            Err(e) => Err(MonitorError::Open {
                path: source.to_path_buf(),
                message: e.to_string(),
            }),
        };

        self.publisher.finish();
        self.logger.summary();
        result
    }

    fn run(&mut self, reader: &mut dyn VideoReader, total: u64) -> Result<MonitorSummary, MonitorError> {
        let mut frames_skipped = 0u64;
        let mut cancelled = false;
        let mut frames = reader.frames();

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }

            let t0 = Instant::now();
            let Some(item) = frames.next() else {
                break;
            };
            let frame = item.map_err(|e| MonitorError::Read {
                frame: self.session.frame_number() + 1,
                message: e.to_string(),
            })?;
            self.logger.timing("decode", elapsed_ms(t0));

            match self.perceive(&frame) {
                Ok(perceived) => self.fold(perceived),
                Err(failure) => {
                    let frame_number = self.session.frame_number() + 1;
                    if self.policy == FrameFailurePolicy::Halt {
                        return Err(MonitorError::Stage {
                            stage: failure.stage,
                            frame: frame_number,
                            message: failure.message,
                        });
                    }
                    self.session.skip_frame();
                    frames_skipped += 1;
                    log::warn!(
                        "[Frame {frame_number}] {} failed, frame skipped: {}",
                        failure.stage,
                        failure.message
                    );
                }
            }

            let current = self.session.frame_number();
            self.logger.progress(current, total);
            if let Some(ref cb) = self.on_progress {
                if !cb(current, total) {
                    cancelled = true;
                    break;
                }
            }
        }

        if cancelled {
            log::info!("Monitoring cancelled at frame {}", self.session.frame_number());
        }

        Ok(MonitorSummary {
            frames_processed: self.session.frame_number() - frames_skipped,
            frames_skipped,
            attendance_count: self.session.attendance().count(),
            cancelled,
            final_snapshot: self.publisher.latest(),
        })
    }

    /// Runs every collaborator for one frame without touching session state.
    fn perceive(&mut self, frame: &Frame) -> Result<Perceived, StageFailure> {
        let t0 = Instant::now();
        let detections = self
            .perception
            .detector
            .detect(frame)
            .map_err(|e| StageFailure::new(Stage::Detect, e))?;
        self.logger.timing("detect", elapsed_ms(t0));

        let t0 = Instant::now();
        let faces = self
            .perception
            .tracker
            .track(&detections, frame)
            .map_err(|e| StageFailure::new(Stage::Track, e))?;
        self.logger.timing("track", elapsed_ms(t0));

        let mut observations = Vec::with_capacity(faces.len());
        let mut skipped_crops = 0;
        let mut classify_ms = 0.0;
        let mut pose_ms = 0.0;

        for face in &faces {
            let Some(rect) = face.bbox.clamp_to(frame.width(), frame.height()) else {
                skipped_crops += 1;
                continue;
            };
            if rect.width < self.min_face_size || rect.height < self.min_face_size {
                skipped_crops += 1;
                continue;
            }
            let crop = frame.crop(&rect);

            let t0 = Instant::now();
            let emotion = self
                .perception
                .classifier
                .classify(&crop)
                .map_err(|e| StageFailure::new(Stage::Classify, e))?;
            classify_ms += elapsed_ms(t0);

            let t0 = Instant::now();
            let pose = self
                .perception
                .estimator
                .estimate(&crop)
                .map_err(|e| StageFailure::new(Stage::Pose, e))?;
            pose_ms += elapsed_ms(t0);
            if !(pose.yaw.is_finite() && pose.pitch.is_finite()) {
                return Err(StageFailure::new(
                    Stage::Pose,
                    format!("non-finite angles for id {}", face.id),
                ));
            }

            observations.push(FaceObservation {
                id: face.id,
                signal: FaceSignal {
                    yaw: pose.yaw,
                    pitch: pose.pitch,
                    emotion: emotion.label,
                },
            });
        }

        if !faces.is_empty() {
            self.logger.timing("classify", classify_ms);
            self.logger.timing("pose", pose_ms);
        }
        Ok(Perceived {
            observations,
            skipped_crops,
        })
    }

    fn fold(&mut self, perceived: Perceived) {
        let t0 = Instant::now();
        let outcome = self.session.process_frame(&perceived.observations);
        self.logger.timing("engagement", elapsed_ms(t0));
        self.logger
            .metric("faces_per_frame", perceived.observations.len() as f64);
        self.logger
            .metric("skipped_crops", perceived.skipped_crops as f64);

        let n = outcome.frame_number;
        if outcome.attendance_sampled {
            log::info!(
                "[Frame {n}] Attendance: {} students",
                self.session.attendance().count()
            );
        }
        if let Some(snapshot) = outcome.snapshot {
            for entry in &snapshot.engagement_list {
                log::debug!(
                    "[Frame {n}] ID: {}, Emotion: {}, Engagement: {}",
                    entry.id,
                    entry.emotion,
                    entry.status
                );
            }
            self.publisher.publish(snapshot);
        }
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
