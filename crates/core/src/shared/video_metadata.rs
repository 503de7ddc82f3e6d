use std::path::PathBuf;

/// Properties of a frame source, reported when it is opened.
///
/// `total_frames` is 0 when the source does not know its length up front
/// (live streams, some containers).
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn is_unbounded(&self) -> bool {
        self.total_frames == 0
    }
}
