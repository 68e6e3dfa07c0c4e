use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::analysis::domain::analyzer::AnalysisContext;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::{ContainerMetadata, VideoMetadata};

/// Owns everything an `AnalysisContext` borrows, for analyzer tests.
pub struct Fixture {
    pub frames: Vec<Frame>,
    pub path: PathBuf,
    pub video: VideoMetadata,
    pub container: ContainerMetadata,
}

impl Fixture {
    pub fn new(frames: Vec<Frame>) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((64, 48));
        Self {
            frames,
            path: PathBuf::from("/tmp/clip.mp4"),
            video: VideoMetadata {
                width,
                height,
                fps: 30.0,
                total_frames: 300,
                codec: "h264".to_string(),
                source_path: None,
            },
            container: ContainerMetadata {
                format_name: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
                duration_seconds: Some(10.0),
                bit_rate: Some(800_000),
                file_size_bytes: Some(1_000_000),
                stream_count: 2,
                tags: BTreeMap::from([
                    ("creation_time".to_string(), "2024-05-01T10:00:00Z".to_string()),
                    ("encoder".to_string(), "Apple iPhone".to_string()),
                ]),
            },
        }
    }

    pub fn ctx(&self) -> AnalysisContext<'_> {
        AnalysisContext {
            frames: &self.frames,
            video_path: &self.path,
            video: &self.video,
            container: &self.container,
        }
    }
}

/// Uniform RGB frame sampled at 30 fps.
pub fn solid_frame(index: usize, value: u8) -> Frame {
    Frame::new(
        vec![value; 64 * 48 * 3],
        64,
        48,
        3,
        index,
        index as f64 / 30.0,
    )
}

/// Frame with a deterministic pseudo-random texture that varies with `seed`.
pub fn textured_frame(index: usize, seed: usize) -> Frame {
    let (w, h) = (64usize, 48usize);
    let mut data = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            let v = ((x * 37 + y * 91 + seed * 13) % 251) as u8;
            data.extend_from_slice(&[v, v, v]);
        }
    }
    Frame::new(data, w as u32, h as u32, 3, index, index as f64 / 30.0)
}
