use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::{ContainerMetadata, VideoMetadata};
use crate::video::domain::frame_source::{FrameSource, FrameSourceError};

use super::ffmpeg_frame_source::{extract_rgb_pixels, probe_container};

/// Adapts a single still image to the [`FrameSource`] interface.
///
/// The image is a one-frame video with `fps=0` and `total_frames=1`. Its
/// only frame has index 0, which every stride samples.
///
/// Uses ffmpeg for decoding, which is significantly faster than the pure-Rust
/// `image` crate for large images (e.g. 4032x3024 JPEG).
pub struct ImageFrameSource {
    frame: Option<Frame>,
}

impl ImageFrameSource {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_still(path: &Path) -> Result<Frame, FrameSourceError> {
    let open_error = |message: String| FrameSourceError::Open {
        path: path.to_path_buf(),
        message,
    };

    ffmpeg_next::init().map_err(|e| open_error(e.to_string()))?;
    let mut ictx = ffmpeg_next::format::input(path).map_err(|e| open_error(e.to_string()))?;

    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| FrameSourceError::NoVideoStream(path.to_path_buf()))?;
    let stream_index = stream.index();

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| open_error(e.to_string()))?;
    let mut decoder = codec_ctx
        .decoder()
        .video()
        .map_err(|e| open_error(e.to_string()))?;

    let width = decoder.width();
    let height = decoder.height();
    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        width,
        height,
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .map_err(|e| open_error(e.to_string()))?;

    let mut receive = |decoder: &mut ffmpeg_next::decoder::Video| -> Result<Option<Frame>, FrameSourceError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| open_error(e.to_string()))?;
        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        Ok(Some(Frame::new(pixels, width, height, 3, 0, 0.0)))
    };

    for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder
            .send_packet(&packet)
            .map_err(|e| open_error(e.to_string()))?;
        if let Some(frame) = receive(&mut decoder)? {
            return Ok(frame);
        }
    }

    // Some formats buffer the single frame until end of stream.
    let _ = decoder.send_eof();
    receive(&mut decoder)?.ok_or_else(|| open_error("no image data decoded".to_string()))
}

impl FrameSource for ImageFrameSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, FrameSourceError> {
        let frame = decode_still(path)?;
        let metadata = VideoMetadata {
            width: frame.width(),
            height: frame.height(),
            fps: 0.0,
            total_frames: 1,
            codec: String::new(),
            source_path: Some(path.to_path_buf()),
        };
        self.frame = Some(frame);
        Ok(metadata)
    }

    fn probe(&mut self, path: &Path) -> Result<ContainerMetadata, FrameSourceError> {
        probe_container(path)
    }

    fn frames(
        &mut self,
        _stride: usize,
    ) -> Box<dyn Iterator<Item = Result<Frame, FrameSourceError>> + '_> {
        match self.frame.take() {
            Some(frame) => Box::new(std::iter::once(Ok(frame))),
            None => Box::new(std::iter::once(Err(FrameSourceError::NotOpened))),
        }
    }

    fn close(&mut self) {
        self.frame = None;
    }
}
