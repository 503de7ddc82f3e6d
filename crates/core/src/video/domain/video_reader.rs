use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// A source of RGB frames for the monitor loop.
///
/// The frame iterator ending is end-of-stream; an `Err` item is a read
/// failure and ends the session.
pub trait VideoReader: Send {
    /// Opens the source (file, directory or stream URL) and reports its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Frames in decode order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    fn close(&mut self);
}
