mod server;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use crossbeam_channel::Receiver;

use edutrack_core::engagement::domain::engagement_config::EngagementConfig;
use edutrack_core::engagement::infrastructure::snapshot_publisher::SnapshotPublisher;
use edutrack_core::perception::domain::perception_config::PerceptionConfig;
use edutrack_core::perception::infrastructure::bytetrack_tracker::ByteTracker;
use edutrack_core::perception::infrastructure::onnx_emotion_classifier::OnnxEmotionClassifier;
use edutrack_core::perception::infrastructure::onnx_head_pose_estimator::OnnxHeadPoseEstimator;
use edutrack_core::perception::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use edutrack_core::pipeline::infrastructure::monitor_worker::{
    self, BuildUseCase, MonitorMessage, ProgressCallback,
};
use edutrack_core::pipeline::monitor_engagement_use_case::{
    FrameFailurePolicy, MonitorEngagementUseCase, MonitorSummary, PerceptionStack,
};
use edutrack_core::pipeline::pipeline_logger::LogPipelineLogger;
use edutrack_core::shared::model_resolver;
use edutrack_core::video::domain::video_reader::VideoReader;
use edutrack_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use edutrack_core::video::infrastructure::image_sequence_reader::ImageSequenceReader;

/// Real-time classroom engagement and attendance tracking.
#[derive(Parser)]
#[command(name = "edutrack")]
struct Cli {
    /// Video file, image directory, or stream URL (e.g. rtsp://...).
    input: PathBuf,

    /// JSON file with engagement settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Absolute yaw (degrees) above which a student counts as looking away.
    #[arg(long)]
    yaw_threshold: Option<f64>,

    /// Absolute pitch (degrees) above which a student counts as looking away.
    #[arg(long)]
    pitch_threshold: Option<f64>,

    /// Consecutive flagged frames to exceed before a student is disengaged.
    #[arg(long)]
    disengagement_frames: Option<u32>,

    /// Sample attendance every N frames.
    #[arg(long)]
    attendance_interval: Option<u64>,

    /// Publish a snapshot every N frames.
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Face detector model file name or path.
    #[arg(long)]
    detector_model: Option<String>,

    /// Emotion classifier model file name or path.
    #[arg(long)]
    emotion_model: Option<String>,

    /// Head-pose model file name or path.
    #[arg(long)]
    head_pose_model: Option<String>,

    /// Download URL for the detector model when it is not cached.
    #[arg(long)]
    detector_url: Option<String>,

    /// Download URL for the emotion model when it is not cached.
    #[arg(long)]
    emotion_url: Option<String>,

    /// Download URL for the head-pose model when it is not cached.
    #[arg(long)]
    head_pose_url: Option<String>,

    /// Directory holding pre-packaged models.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Address for the dashboard endpoint.
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Analyze to completion and print the final snapshot instead of serving.
    #[arg(long)]
    no_serve: bool,

    /// Stop on the first perception failure instead of skipping the frame.
    #[arg(long)]
    fail_fast: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = engagement_config(&cli)?;
    let perception = perception_config(&cli);
    let models = resolve_models(&cli, &perception)?;

    let publisher = SnapshotPublisher::new();
    let snapshots = publisher.reader();
    let policy = if cli.fail_fast {
        FrameFailurePolicy::Halt
    } else {
        FrameFailurePolicy::Skip
    };
    let build = use_case_builder(&cli.input, config, perception, models, publisher, policy);
    let (rx, cancelled) = monitor_worker::spawn(cli.input.clone(), build);

    // started after model resolution: reqwest's blocking client panics inside a runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    if cli.no_serve {
        runtime.spawn(cancel_on_ctrl_c(cancelled));
        let summary = wait_for_monitor(&rx)?;
        println!("{}", serde_json::to_string_pretty(&*summary.final_snapshot)?);
        return Ok(());
    }

    let waiter = std::thread::spawn(move || wait_for_monitor(&rx));
    runtime.block_on(server::serve(cli.bind, snapshots, cancel_on_ctrl_c(cancelled)))?;

    match waiter.join() {
        Ok(result) => result.map(|_| ()).map_err(Into::into),
        Err(_) => Err("monitor thread panicked".into()),
    }
}

/// Resolves once Ctrl-C is received, after asking the monitor to stop.
async fn cancel_on_ctrl_c(cancelled: Arc<AtomicBool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Received shutdown signal");
    cancelled.store(true, Ordering::Relaxed);
}

/// Blocks until the worker reports a final outcome.
fn wait_for_monitor(rx: &Receiver<MonitorMessage>) -> Result<MonitorSummary, String> {
    for message in rx.iter() {
        match message {
            MonitorMessage::Progress(..) => {}
            MonitorMessage::Finished(summary) => {
                log_summary("Monitoring finished", &summary);
                return Ok(summary);
            }
            MonitorMessage::Cancelled(summary) => {
                log_summary("Monitoring cancelled", &summary);
                return Ok(summary);
            }
            MonitorMessage::Error(e) => {
                log::error!("Monitoring stopped: {e}");
                return Err(e);
            }
        }
    }
    Err("monitor worker exited without reporting".to_string())
}

fn log_summary(headline: &str, summary: &MonitorSummary) {
    log::info!(
        "{headline}: {} frames processed, {} skipped, attendance {} students, {} engaged in last snapshot",
        summary.frames_processed,
        summary.frames_skipped,
        summary.attendance_count,
        summary.final_snapshot.engaged_count()
    );
}

struct ModelPaths {
    detector: PathBuf,
    emotion: PathBuf,
    head_pose: PathBuf,
}

fn resolve_models(
    cli: &Cli,
    perception: &PerceptionConfig,
) -> Result<ModelPaths, Box<dyn std::error::Error>> {
    let bundled = cli.models_dir.as_deref();
    let resolve = |name: &str, url: &Option<String>| {
        log::info!("Resolving model: {name}");
        model_resolver::resolve(name, url.as_deref(), bundled, Some(Box::new(download_progress)))
    };
    Ok(ModelPaths {
        detector: resolve(&perception.detector_model, &cli.detector_url)?,
        emotion: resolve(&perception.emotion_model, &cli.emotion_url)?,
        head_pose: resolve(&perception.head_pose_model, &cli.head_pose_url)?,
    })
}

fn use_case_builder(
    input: &Path,
    config: EngagementConfig,
    perception: PerceptionConfig,
    models: ModelPaths,
    publisher: SnapshotPublisher,
    policy: FrameFailurePolicy,
) -> BuildUseCase {
    let reader = open_reader(input);
    Box::new(move |progress: ProgressCallback, cancelled: Arc<AtomicBool>| {
        let stack = build_perception(&perception, &models)?;
        Ok::<_, Box<dyn std::error::Error>>(MonitorEngagementUseCase::new(
            reader,
            stack,
            &config,
            publisher,
            policy,
            Box::new(LogPipelineLogger::default()),
            Some(progress),
            Some(cancelled),
        ))
    })
}

/// Loads the ONNX sessions; runs on the worker thread.
fn build_perception(
    perception: &PerceptionConfig,
    models: &ModelPaths,
) -> Result<PerceptionStack, Box<dyn std::error::Error>> {
    Ok(PerceptionStack {
        detector: Box::new(OnnxYoloDetector::new(
            &models.detector,
            perception.detector_confidence,
            perception.nms_iou,
        )?),
        tracker: Box::new(ByteTracker::new(
            perception.tracker_max_lost,
            perception.tracker_min_hits,
        )),
        classifier: Box::new(OnnxEmotionClassifier::new(&models.emotion)?),
        estimator: Box::new(OnnxHeadPoseEstimator::new(&models.head_pose)?),
    })
}

fn engagement_config(cli: &Cli) -> Result<EngagementConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => EngagementConfig::load(path)?,
        None => EngagementConfig::default(),
    };
    if let Some(v) = cli.yaw_threshold {
        config.yaw_threshold = v;
    }
    if let Some(v) = cli.pitch_threshold {
        config.pitch_threshold = v;
    }
    if let Some(v) = cli.disengagement_frames {
        config.disengagement_frame_threshold = v;
    }
    if let Some(v) = cli.attendance_interval {
        config.attendance_sample_interval = v;
    }
    if let Some(v) = cli.snapshot_interval {
        config.snapshot_interval = v;
    }
    config.validate()?;
    Ok(config)
}

fn perception_config(cli: &Cli) -> PerceptionConfig {
    let mut perception = PerceptionConfig::default();
    if let Some(c) = cli.confidence {
        perception.detector_confidence = c;
    }
    if let Some(ref m) = cli.detector_model {
        perception.detector_model = m.clone();
    }
    if let Some(ref m) = cli.emotion_model {
        perception.emotion_model = m.clone();
    }
    if let Some(ref m) = cli.head_pose_model {
        perception.head_pose_model = m.clone();
    }
    perception
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !is_stream_url(&cli.input) && !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if let Some(c) = cli.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Confidence must be between 0.0 and 1.0, got {c}").into());
        }
    }
    Ok(())
}

fn is_stream_url(input: &Path) -> bool {
    input.to_string_lossy().contains("://")
}

fn open_reader(input: &Path) -> Box<dyn VideoReader> {
    if !is_stream_url(input) && ImageSequenceReader::accepts(input) {
        Box::new(ImageSequenceReader::new())
    } else {
        Box::new(FfmpegReader::new())
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("edutrack").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["lecture.mp4"]);
        assert_eq!(cli.bind, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert!(!cli.no_serve);
        assert!(!cli.fail_fast);
        assert_eq!(engagement_config(&cli).unwrap(), EngagementConfig::default());
        assert_eq!(perception_config(&cli), PerceptionConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.json");
        std::fs::write(&path, r#"{"yaw_threshold": 25.0, "snapshot_interval": 5}"#).unwrap();

        let cli = parse(&[
            "lecture.mp4",
            "--config",
            path.to_str().unwrap(),
            "--snapshot-interval",
            "20",
            "--disengagement-frames",
            "10",
        ]);
        let config = engagement_config(&cli).unwrap();
        assert_eq!(config.yaw_threshold, 25.0);
        assert_eq!(config.snapshot_interval, 20);
        assert_eq!(config.disengagement_frame_threshold, 10);
        assert_eq!(config.pitch_threshold, 23.0);
    }

    #[test]
    fn test_zero_interval_flag_is_rejected() {
        let cli = parse(&["lecture.mp4", "--attendance-interval", "0"]);
        assert!(engagement_config(&cli).is_err());
    }

    #[test]
    fn test_model_overrides() {
        let cli = parse(&["lecture.mp4", "--emotion-model", "/opt/models/emo.onnx", "--confidence", "0.6"]);
        let perception = perception_config(&cli);
        assert_eq!(perception.emotion_model, "/opt/models/emo.onnx");
        assert_eq!(perception.detector_confidence, 0.6);
        assert_eq!(perception.head_pose_model, PerceptionConfig::default().head_pose_model);
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let cli = parse(&["/nonexistent/lecture.mp4"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_validate_accepts_stream_url() {
        let cli = parse(&["rtsp://camera.local/stream1"]);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_confidence() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[dir.path().to_str().unwrap(), "--confidence", "1.5"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_stream_url_detection() {
        assert!(is_stream_url(Path::new("rtsp://10.0.0.2/cam")));
        assert!(!is_stream_url(Path::new("/videos/lecture.mp4")));
    }
}
