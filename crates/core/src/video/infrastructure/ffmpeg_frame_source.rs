use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::{ContainerMetadata, VideoMetadata};
use crate::video::domain::frame_source::{FrameSource, FrameSourceError};

/// Consecutive packets the decoder may reject before decoding gives up.
const MAX_CONSECUTIVE_PACKET_ERRORS: usize = 16;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Every packet is decoded, but only sampled frames are converted to
/// RGB24 and wrapped in a [`Frame`].
pub struct FfmpegFrameSource {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    video_stream_index: usize,
    fps: f64,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            video_stream_index: 0,
            fps: 0.0,
        }
    }

    fn frame_iter(&mut self, stride: usize) -> Result<FfmpegFrameIter<'_>, FrameSourceError> {
        let fps = self.fps;
        let stream_index = self.video_stream_index;
        let ictx = self.input_ctx.as_mut().ok_or(FrameSourceError::NotOpened)?;

        let stream = ictx.stream(stream_index).ok_or(FrameSourceError::NotOpened)?;
        let time_base = f64::from(stream.time_base());
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| decode_error(0, e))?;
        let decoder = codec_ctx.decoder().video().map_err(|e| decode_error(0, e))?;

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
        )
        .map_err(|e| decode_error(0, e))?;

        Ok(FfmpegFrameIter {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index: stream_index,
            time_base,
            fps,
            stride: stride.max(1),
            decoded: 0,
            rejected: PacketErrorBudget::new(MAX_CONSECUTIVE_PACKET_ERRORS),
            flushing: false,
            done: false,
        })
    }
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, FrameSourceError> {
        let ictx = open_input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| FrameSourceError::NoVideoStream(path.to_path_buf()))?;

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| open_error(path, e))?;
        let decoder = codec_ctx.decoder().video().map_err(|e| open_error(path, e))?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        self.video_stream_index = stream.index();
        self.fps = fps;
        self.input_ctx = Some(ictx);

        log::debug!(
            "Opened {} ({}x{} {} @ {:.2} fps)",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.codec,
            metadata.fps
        );
        Ok(metadata)
    }

    fn probe(&mut self, path: &Path) -> Result<ContainerMetadata, FrameSourceError> {
        probe_container(path)
    }

    fn frames(
        &mut self,
        stride: usize,
    ) -> Box<dyn Iterator<Item = Result<Frame, FrameSourceError>> + '_> {
        match self.frame_iter(stride) {
            Ok(iter) => Box::new(iter),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input_ctx = None;
    }
}

/// Lazy iterator that decodes one packet at a time and keeps every
/// `stride`-th frame.
struct FfmpegFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    time_base: f64,
    fps: f64,
    stride: usize,
    decoded: usize,
    rejected: PacketErrorBudget,
    flushing: bool,
    done: bool,
}

/// Counts consecutive packets the decoder rejected. A damaged packet is
/// skipped; only a run longer than `limit` ends decoding.
struct PacketErrorBudget {
    limit: usize,
    consecutive: usize,
}

impl PacketErrorBudget {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            consecutive: 0,
        }
    }

    /// Returns `true` once the run of rejected packets exceeds the limit.
    fn reject(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive > self.limit
    }

    fn accept(&mut self) {
        self.consecutive = 0;
    }
}

impl FfmpegFrameIter<'_> {
    /// Drains decoded frames until one is sampled or the decoder is empty.
    fn try_receive(&mut self) -> Option<Result<Frame, FrameSourceError>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let index = self.decoded;
            self.decoded += 1;
            if index % self.stride != 0 {
                continue;
            }

            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
            if let Err(e) = self.scaler.run(&decoded, &mut rgb_frame) {
                return Some(Err(decode_error(index, e)));
            }

            let timestamp = match decoded.timestamp().or_else(|| decoded.pts()) {
                Some(pts) if self.time_base > 0.0 => pts as f64 * self.time_base,
                _ if self.fps > 0.0 => index as f64 / self.fps,
                _ => 0.0,
            };
            let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
            return Some(Ok(Frame::new(
                pixels,
                self.width,
                self.height,
                3,
                index,
                timestamp,
            )));
        }
        None
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, FrameSourceError>;

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
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                if self.rejected.reject() {
                    self.done = true;
                    return Some(Err(decode_error(self.decoded, e)));
                }
                log::warn!("Skipping packet rejected by decoder after {} frames: {e}", self.decoded);
                continue;
            }
            self.rejected.accept();

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

fn open_input(path: &Path) -> Result<ffmpeg_next::format::context::Input, FrameSourceError> {
    ffmpeg_next::init().map_err(|e| open_error(path, e))?;
    ffmpeg_next::format::input(path).map_err(|e| open_error(path, e))
}

fn open_error(path: &Path, e: impl std::fmt::Display) -> FrameSourceError {
    FrameSourceError::Open {
        path: PathBuf::from(path),
        message: e.to_string(),
    }
}

fn decode_error(decoded: usize, e: impl std::fmt::Display) -> FrameSourceError {
    FrameSourceError::Decode {
        decoded,
        message: e.to_string(),
    }
}

/// Reads container-level metadata without decoding any frames.
///
/// Stream tags fill in keys the container does not carry, so an `encoder`
/// tag on the video stream is visible when the muxer only set it there.
pub(crate) fn probe_container(path: &Path) -> Result<ContainerMetadata, FrameSourceError> {
    let ictx = open_input(path)?;

    let mut tags: std::collections::BTreeMap<String, String> = ictx
        .metadata()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    if let Some(stream) = ictx.streams().best(ffmpeg_next::media::Type::Video) {
        for (k, v) in stream.metadata().iter() {
            tags.entry(k.to_string()).or_insert_with(|| v.to_string());
        }
    }

    let duration = ictx.duration();
    let bit_rate = ictx.bit_rate();

    Ok(ContainerMetadata {
        format_name: ictx.format().name().to_string(),
        duration_seconds: (duration > 0)
            .then(|| duration as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)),
        bit_rate: (bit_rate > 0).then_some(bit_rate as u64),
        file_size_bytes: std::fs::metadata(path).ok().map(|m| m.len()),
        stream_count: ictx.nb_streams() as usize,
        tags,
    })
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
/// This function strips that padding to produce a tightly-packed pixel buffer.
pub(crate) fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
