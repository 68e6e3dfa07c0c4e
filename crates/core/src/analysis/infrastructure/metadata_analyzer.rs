use crate::analysis::domain::analyzer::{AnalysisContext, Analyzer, AnalyzerError};
use crate::analysis::domain::analyzer_result::AnalyzerResult;
use crate::shared::video_metadata::{ContainerMetadata, VideoMetadata};

pub const NAME: &str = "metadata";

const ENCODER: &str = "encoder";
const TIMESTAMPS: &str = "timestamps";
const CONTAINER_CONSISTENCY: &str = "container_consistency";

/// Encoder tags left behind by well-known face-swap toolchains.
const SYNTHETIC_ENCODERS: &[&str] = &[
    "deepfacelab",
    "faceswap",
    "faceswapper",
    "fsgan",
    "simswap",
    "roop",
    "deepfake",
];

/// Generic libavformat/libavcodec muxers: the file was re-encoded somewhere.
const REENCODE_MARKERS: &[&str] = &["lavf", "lavc"];

const CREATION_TAGS: &[&str] = &["creation_time", "date", "com.apple.quicktime.creationdate"];

/// Frame rates outside this range do not occur in camera footage.
const PLAUSIBLE_FPS: std::ops::RangeInclusive<f64> = 1.0..=240.0;

/// Inspects container metadata instead of pixels.
///
/// Reads the file-level record probed by the frame source and scores:
/// - `encoder`: known synthesis tools score 0, generic re-encoders 0.6
/// - `timestamps`: presence of a creation time
/// - `container_consistency`: file size vs. bit rate × duration, and fps
pub struct MetadataAnalyzer;

impl MetadataAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetadataAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for MetadataAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<AnalyzerResult, AnalyzerError> {
        log::debug!(
            "Inspecting metadata of {} ({} tags)",
            ctx.video_path.display(),
            ctx.container.tags.len()
        );

        Ok(AnalyzerResult::from_mean([
            (ENCODER, encoder_score(ctx.container)),
            (TIMESTAMPS, timestamp_score(ctx.container)),
            (
                CONTAINER_CONSISTENCY,
                consistency_score(ctx.container, ctx.video),
            ),
        ]))
    }
}

fn encoder_score(container: &ContainerMetadata) -> f64 {
    let encoder = container
        .tag("encoder")
        .or_else(|| container.tag("software"))
        .map(str::to_lowercase);
    match encoder {
        None => 0.7,
        Some(e) if SYNTHETIC_ENCODERS.iter().any(|s| e.contains(s)) => 0.0,
        Some(e) if REENCODE_MARKERS.iter().any(|s| e.starts_with(s)) => 0.6,
        Some(_) => 1.0,
    }
}

fn timestamp_score(container: &ContainerMetadata) -> f64 {
    if CREATION_TAGS.iter().any(|t| container.tag(t).is_some()) {
        1.0
    } else {
        0.6
    }
}

fn consistency_score(container: &ContainerMetadata, video: &VideoMetadata) -> f64 {
    let size_score = match (
        container.file_size_bytes,
        container.bit_rate,
        container.duration_seconds,
    ) {
        (Some(0), _, _) => 0.0,
        (Some(size), Some(rate), Some(duration)) if rate > 0 && duration > 0.0 => {
            let expected = rate as f64 * duration / 8.0;
            let deviation = (size as f64 / expected).ln().abs();
            1.0 - (deviation / 4f64.ln()).min(1.0)
        }
        _ => 0.5,
    };

    // Stills report fps 0 and a single frame; only judge real video.
    let fps_score = if video.total_frames > 1 && !PLAUSIBLE_FPS.contains(&video.fps) {
        0.3
    } else {
        1.0
    };

    size_score.min(fps_score)
}
