use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting logger for monitor loop events.
///
/// Keeps the driving loop independent of where progress and timings end up
/// (the `log` facade, a worker channel, nowhere in tests).
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is 0 for unbounded sources.
    fn progress(&mut self, current: u64, total: u64);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a per-frame metric (faces per frame, skipped crops).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: u64, _total: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate for one stage or metric.
///
/// Live sessions can run for hours, so only count, sum and max are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Series {
    pub count: u64,
    pub sum: f64,
    pub max: f64,
}

impl Series {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        if self.count == 1 || value > self.max {
            self.max = value;
        }
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Logger backed by the `log` crate.
///
/// Progress lines are throttled to every `throttle_frames` frames. Stage
/// timings and metrics are aggregated for the end-of-run summary.
pub struct LogPipelineLogger {
    throttle_frames: u64,
    timings: BTreeMap<String, Series>,
    metrics: BTreeMap<String, Series>,
    start_time: Instant,
    frames_seen: u64,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: u64) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
        }
    }

    pub fn timings_for(&self, stage: &str) -> Option<&Series> {
        self.timings.get(stage)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&Series> {
        self.metrics.get(name)
    }

    /// Formatted summary, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Monitor summary ({} frames, {:.1}s):",
            self.frames_seen, elapsed_s
        )];

        for (stage, s) in &self.timings {
            lines.push(format!(
                "  {stage:10}: avg {:6.1}ms  max {:7.1}ms  total {:8.0}ms",
                s.mean(),
                s.max,
                s.sum
            ));
        }
        for (name, s) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}, max {:.0}", s.mean(), s.max));
        }
        if self.frames_seen > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} fps",
                self.frames_seen as f64 / elapsed_s
            ));
        }
        Some(lines.join("\n"))
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: u64, total: u64) {
        self.frames_seen = current;
        if total > 0 {
            if current % self.throttle_frames == 0 || current == total {
                let pct = current as f64 / total as f64 * 100.0;
                log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
            }
        } else if current % self.throttle_frames == 0 {
            log::info!("Processing: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 0);
        logger.timing("detect", 5.0);
        logger.metric("faces_per_frame", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timings_aggregate_per_stage() {
        let mut logger = LogPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 40.0);
        logger.timing("pose", 5.0);

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect.count, 2);
        assert_relative_eq!(detect.mean(), 30.0);
        assert_relative_eq!(detect.max, 40.0);
        assert_eq!(logger.timings_for("pose").unwrap().count, 1);
        assert!(logger.timings_for("classify").is_none());
    }

    #[test]
    fn test_metric_max_tracks_negative_values() {
        let mut logger = LogPipelineLogger::new(10);
        logger.metric("delta", -3.0);
        logger.metric("delta", -1.0);
        assert_relative_eq!(logger.metrics_for("delta").unwrap().max, -1.0);
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = LogPipelineLogger::new(10);
        logger.progress(10, 0);
        logger.timing("detect", 12.0);
        logger.timing("engagement", 0.1);
        logger.metric("faces_per_frame", 3.0);
        logger.metric("faces_per_frame", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Monitor summary (10 frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("engagement"));
        assert!(summary.contains("faces_per_frame: avg 3.5"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(LogPipelineLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frames_for_unbounded_sources() {
        let mut logger = LogPipelineLogger::new(10);
        for i in 1..=25 {
            logger.progress(i, 0);
        }
        assert_eq!(logger.frames_seen, 25);
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        let logger = LogPipelineLogger::new(0);
        assert_eq!(logger.throttle_frames, 1);
    }

    #[test]
    fn test_series_mean_of_empty_is_zero() {
        assert_relative_eq!(Series::default().mean(), 0.0);
    }
}
