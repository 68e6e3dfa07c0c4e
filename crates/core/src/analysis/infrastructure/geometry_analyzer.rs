use crate::analysis::domain::analyzer::{AnalysisContext, Analyzer, AnalyzerError};
use crate::analysis::domain::analyzer_result::{AnalyzerResult, FrameMarker};
use crate::shared::frame::Frame;

use super::luma::{luma_plane, most_deviant, std_dev};

pub const NAME: &str = "geometry";

const EDGE_CONSISTENCY: &str = "edge_consistency";
const ASPECT_RATIO: &str = "aspect_ratio";

/// Std-dev of the horizontal edge share that maps to score 0.
const MAX_EDGE_DRIFT: f64 = 0.2;

/// Width/height ratios outside this range are treated as implausible.
const PLAUSIBLE_ASPECT: std::ops::RangeInclusive<f64> = 0.3..=3.5;

/// Structural stability of the picture across samples.
///
/// Warping introduced by face reenactment shifts the balance between
/// horizontal and vertical gradient energy from one sample to the next.
/// The analyzer also checks that the frame geometry itself stays fixed and
/// plausible.
pub struct GeometryAnalyzer;

impl GeometryAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GeometryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for GeometryAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<AnalyzerResult, AnalyzerError> {
        if ctx.frames.is_empty() {
            return Ok(AnalyzerResult::zeroed(&[EDGE_CONSISTENCY, ASPECT_RATIO]));
        }

        // Flat frames have no edges to compare and are skipped.
        let shares: Vec<(usize, f64)> = ctx
            .frames
            .iter()
            .enumerate()
            .filter_map(|(i, f)| horizontal_edge_share(f).map(|s| (i, s)))
            .collect();
        let values: Vec<f64> = shares.iter().map(|(_, s)| *s).collect();

        let edge_consistency = if values.is_empty() {
            0.5
        } else {
            1.0 - (std_dev(&values) / MAX_EDGE_DRIFT).min(1.0)
        };

        let peak = most_deviant(&values).map(|i| {
            let frame = &ctx.frames[shares[i].0];
            FrameMarker {
                index: frame.index(),
                timestamp: frame.timestamp(),
            }
        });

        Ok(AnalyzerResult::from_mean([
            (EDGE_CONSISTENCY, edge_consistency),
            (ASPECT_RATIO, aspect_score(ctx.frames)),
        ])
        .with_peak(peak))
    }
}

/// Horizontal gradient energy over total gradient energy, or `None` when
/// the frame has no gradients at all.
fn horizontal_edge_share(frame: &Frame) -> Option<f64> {
    let plane = luma_plane(frame);
    let (h, w) = plane.dim();
    let mut gx = 0.0f64;
    let mut gy = 0.0f64;
    for y in 0..h {
        for x in 0..w {
            if x + 1 < w {
                gx += (plane[[y, x + 1]] - plane[[y, x]]).abs() as f64;
            }
            if y + 1 < h {
                gy += (plane[[y + 1, x]] - plane[[y, x]]).abs() as f64;
            }
        }
    }
    let total = gx + gy;
    if total <= f64::EPSILON {
        None
    } else {
        Some(gx / total)
    }
}

/// 1 for a fixed, plausible frame size; 0 if the size changes mid-stream.
fn aspect_score(frames: &[Frame]) -> f64 {
    let first = &frames[0];
    if frames
        .iter()
        .any(|f| f.width() != first.width() || f.height() != first.height())
    {
        return 0.0;
    }
    if first.height() == 0 {
        return 0.0;
    }
    let ratio = first.width() as f64 / first.height() as f64;
    if PLAUSIBLE_ASPECT.contains(&ratio) {
        1.0
    } else {
        0.5
    }
}
