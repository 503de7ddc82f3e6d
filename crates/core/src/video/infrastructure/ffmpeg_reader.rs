use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Decodes a classroom recording or camera stream via ffmpeg-next.
///
/// Anything libavformat can open works, including `rtsp://` URLs passed as
/// paths. Frames come out as tightly packed RGB24.
pub struct FfmpegReader {
    decoding: Option<Decoding>,
}

struct Decoding {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

// Safety: the reader is moved onto the monitor thread once and never shared.
// The raw pointers inside the ffmpeg contexts stay on that thread.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { decoding: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let input = ffmpeg_next::format::input(path)?;
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };
        log::info!(
            "Opened {} ({}x{} @ {:.2} fps, {})",
            path.display(),
            width,
            height,
            fps,
            metadata.codec
        );

        self.decoding = Some(Decoding {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
        });
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        match self.decoding.as_mut() {
            Some(decoding) => Box::new(FfmpegFrameIter {
                decoding,
                frame_index: 0,
                flushing: false,
                done: false,
            }),
            None => Box::new(std::iter::once(Err("FfmpegReader: not opened".into()))),
        }
    }

    fn close(&mut self) {
        self.decoding = None;
    }
}

/// Pulls packets lazily and yields one decoded frame per `next`.
struct FfmpegFrameIter<'a> {
    decoding: &'a mut Decoding,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    fn try_receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let d = &mut *self.decoding;
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        d.decoder.receive_frame(&mut decoded).ok()?;

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = d.scaler.run(&decoded, &mut rgb) {
            return Some(Err(Box::new(e)));
        }
        let pixels = packed_rgb(&rgb, d.width, d.height);
        let frame = Frame::new(pixels, d.width, d.height, 3, self.frame_index);
        self.frame_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(result) = self.try_receive() {
            return Some(result);
        }
        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match read_outcome(packet.read(&mut self.decoding.input)) {
                PacketRead::Packet => {}
                PacketRead::Retry => continue,
                PacketRead::EndOfStream => {
                    let _ = self.decoding.decoder.send_eof();
                    self.flushing = true;
                    let flushed = self.try_receive();
                    if flushed.is_none() {
                        self.done = true;
                    }
                    return flushed;
                }
                PacketRead::Failed(e) => {
                    self.done = true;
                    return Some(Err(Box::new(e)));
                }
            }

            if packet.stream() != self.decoding.stream_index {
                continue;
            }
            match self.decoding.decoder.send_packet(&packet) {
                Ok(()) => {}
                Err(ffmpeg_next::Error::InvalidData) => {
                    log::warn!("Dropping corrupt packet at frame {}", self.frame_index);
                    continue;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(Box::new(e)));
                }
            }
            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// What a single `av_read_frame` call means for the frame stream.
#[derive(Debug)]
enum PacketRead {
    Packet,
    /// Demuxer has nothing yet (non-blocking network input).
    Retry,
    EndOfStream,
    Failed(ffmpeg_next::Error),
}

fn read_outcome(result: Result<(), ffmpeg_next::Error>) -> PacketRead {
    match result {
        Ok(()) => PacketRead::Packet,
        Err(ffmpeg_next::Error::Eof) => PacketRead::EndOfStream,
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
            PacketRead::Retry
        }
        Err(e) => PacketRead::Failed(e),
    }
}

/// Strips per-row stride padding from an RGB24 ffmpeg frame.
fn packed_rgb(rgb: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
