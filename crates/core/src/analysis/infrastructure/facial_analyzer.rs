use crate::analysis::domain::analyzer::{AnalysisContext, Analyzer, AnalyzerError};
use crate::analysis::domain::analyzer_result::{AnalyzerResult, FrameMarker};
use crate::shared::frame::Frame;

use super::luma::{center_region, laplacian_variance, luma_plane, mean, std_dev};

pub const NAME: &str = "facial";

const SKIN_CONSISTENCY: &str = "skin_consistency";
const TEXTURE_BALANCE: &str = "texture_balance";

/// Below this mean skin coverage there is nothing face-like to judge.
const MIN_SKIN_COVERAGE: f64 = 0.005;

/// Pixel stride used when counting skin-tone pixels.
const SKIN_SAMPLE_STEP: usize = 2;

/// Face-region plausibility from colour and texture alone.
///
/// Swapped faces tend to flicker in skin-tone coverage between frames and
/// to be smoother than their surroundings, so the analyzer scores:
/// - `skin_consistency`: stability of the skin-tone pixel fraction
/// - `texture_balance`: sharpness of the frame centre relative to the whole
pub struct FacialAnalyzer;

impl FacialAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FacialAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for FacialAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<AnalyzerResult, AnalyzerError> {
        if ctx.frames.is_empty() {
            return Ok(AnalyzerResult::zeroed(&[SKIN_CONSISTENCY, TEXTURE_BALANCE]));
        }

        let coverage: Vec<f64> = ctx.frames.iter().map(skin_fraction).collect();
        let ratios: Vec<Option<f64>> = ctx.frames.iter().map(texture_ratio).collect();

        let mean_coverage = mean(&coverage);
        let skin_consistency = if mean_coverage < MIN_SKIN_COVERAGE {
            0.5
        } else {
            1.0 - (std_dev(&coverage) / mean_coverage).min(1.0)
        };

        let measured: Vec<f64> = ratios.iter().flatten().map(|r| r.min(1.0)).collect();
        let texture_balance = if measured.is_empty() {
            0.5
        } else {
            mean(&measured)
        };

        let peak = ratios
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.map(|r| (i, r)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| FrameMarker {
                index: ctx.frames[i].index(),
                timestamp: ctx.frames[i].timestamp(),
            });

        Ok(AnalyzerResult::from_mean([
            (SKIN_CONSISTENCY, skin_consistency),
            (TEXTURE_BALANCE, texture_balance),
        ])
        .with_peak(peak))
    }
}

/// Fraction of sampled pixels inside the classic YCbCr skin box.
fn skin_fraction(frame: &Frame) -> f64 {
    if frame.channels() < 3 {
        return 0.0;
    }
    let px = frame.as_ndarray();
    let (h, w, _) = px.dim();
    let mut total = 0usize;
    let mut skin = 0usize;
    for y in (0..h).step_by(SKIN_SAMPLE_STEP) {
        for x in (0..w).step_by(SKIN_SAMPLE_STEP) {
            let r = px[[y, x, 0]] as f64;
            let g = px[[y, x, 1]] as f64;
            let b = px[[y, x, 2]] as f64;
            let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
            let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
            if (77.0..=127.0).contains(&cb) && (133.0..=173.0).contains(&cr) {
                skin += 1;
            }
            total += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        skin as f64 / total as f64
    }
}

/// Centre sharpness over whole-frame sharpness; `None` for flat frames.
fn texture_ratio(frame: &Frame) -> Option<f64> {
    let plane = luma_plane(frame);
    let whole = laplacian_variance(&plane);
    if whole <= f64::EPSILON {
        return None;
    }
    Some(laplacian_variance(&center_region(&plane)) / whole)
}
