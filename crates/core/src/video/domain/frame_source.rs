use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::{ContainerMetadata, VideoMetadata};

#[derive(Error, Debug)]
pub enum FrameSourceError {
    #[error("cannot open {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("no video stream found in {0}")]
    NoVideoStream(PathBuf),
    #[error("decode failed after {decoded} frames: {message}")]
    Decode { decoded: usize, message: String },
    #[error("frame source not opened")]
    NotOpened,
}

/// Yields sampled frames from a video or image.
///
/// Implementations handle codec and container details; the detector only
/// sees `Frame`, `VideoMetadata` and `ContainerMetadata`.
pub trait FrameSource: Send {
    /// Opens the file and returns its stream-level metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, FrameSourceError>;

    /// Reads container-level metadata. Independent of `open`.
    fn probe(&mut self, path: &Path) -> Result<ContainerMetadata, FrameSourceError>;

    /// Lazily yields every `stride`-th decoded frame (index 0, n, 2n, ...)
    /// in decode order. Frame indices count every decoded frame, sampled
    /// or not.
    fn frames(
        &mut self,
        stride: usize,
    ) -> Box<dyn Iterator<Item = Result<Frame, FrameSourceError>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
