use ndarray::Zip;

use crate::analysis::domain::analyzer::{AnalysisContext, Analyzer, AnalyzerError};
use crate::analysis::domain::analyzer_result::{AnalyzerResult, FrameMarker};

use super::luma::{luma_plane, mean};

pub const NAME: &str = "temporal";

const MOTION_SMOOTHNESS: &str = "motion_smoothness";
const FROZEN_RATIO: &str = "frozen_ratio";

/// Mean absolute luma difference below which two samples count as identical.
const FROZEN_EPSILON: f64 = 1e-3;

/// Frame-to-frame coherence of the sampled sequence.
///
/// Scores how evenly motion energy changes between consecutive samples
/// (`motion_smoothness`) and penalizes runs of byte-identical samples that
/// show up when a generator duplicates frames (`frozen_ratio`, reported as
/// `1 - fraction_frozen`). A single frame carries no temporal signal and
/// scores a neutral 0.5.
pub struct TemporalAnalyzer;

impl TemporalAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TemporalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for TemporalAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<AnalyzerResult, AnalyzerError> {
        match ctx.frames.len() {
            0 => return Ok(AnalyzerResult::zeroed(&[MOTION_SMOOTHNESS, FROZEN_RATIO])),
            1 => return Ok(AnalyzerResult::uniform(&[MOTION_SMOOTHNESS, FROZEN_RATIO], 0.5)),
            _ => {}
        }

        let planes: Vec<_> = ctx.frames.iter().map(luma_plane).collect();
        let mut diffs = Vec::with_capacity(planes.len() - 1);
        for pair in planes.windows(2) {
            if pair[0].dim() != pair[1].dim() {
                return Err(AnalyzerError::Failed(format!(
                    "frame size changed mid-stream: {:?} -> {:?}",
                    pair[0].dim(),
                    pair[1].dim()
                )));
            }
            let mut total = 0.0f64;
            Zip::from(&pair[0]).and(&pair[1]).for_each(|&a, &b| {
                total += (a - b).abs() as f64;
            });
            diffs.push(if pair[0].is_empty() {
                0.0
            } else {
                total / pair[0].len() as f64
            });
        }

        let frozen = diffs.iter().filter(|&&d| d < FROZEN_EPSILON).count();
        let frozen_score = 1.0 - frozen as f64 / diffs.len() as f64;

        let jumps: Vec<f64> = diffs.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        let mean_diff = mean(&diffs);
        let smoothness = if jumps.is_empty() || mean_diff < FROZEN_EPSILON {
            1.0
        } else {
            1.0 - (mean(&jumps) / mean_diff / 2.0).min(1.0)
        };

        // The frame that follows the largest jump in motion energy.
        let peak = diffs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| FrameMarker {
                index: ctx.frames[i + 1].index(),
                timestamp: ctx.frames[i + 1].timestamp(),
            });

        Ok(AnalyzerResult::from_mean([
            (MOTION_SMOOTHNESS, smoothness),
            (FROZEN_RATIO, frozen_score),
        ])
        .with_peak(peak))
    }
}
