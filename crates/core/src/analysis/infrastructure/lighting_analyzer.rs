use ndarray::s;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::analysis::domain::analyzer::{AnalysisContext, Analyzer, AnalyzerError};
use crate::analysis::domain::analyzer_result::{AnalyzerResult, FrameMarker};

use super::luma::{luma_plane, mean, mean_luma, most_deviant, std_dev};

pub const NAME: &str = "lighting";

const SPECTRAL_FLICKER: &str = "spectral_flicker";
const ILLUMINATION_BALANCE: &str = "illumination_balance";

/// Shortest brightness series worth a spectrum.
const MIN_SPECTRUM_SAMPLES: usize = 4;

/// Left/right brightness drift (std-dev, in luma units) that maps to score 0.
const MAX_BALANCE_DRIFT: f64 = 0.25;

/// Scene illumination consistency.
///
/// Natural lighting changes slowly, so the brightness series of the sampled
/// frames should carry little high-frequency energy. Composited faces often
/// do not track the scene light, which shows up as drift in the left/right
/// illumination balance.
pub struct LightingAnalyzer;

impl LightingAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LightingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for LightingAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<AnalyzerResult, AnalyzerError> {
        if ctx.frames.is_empty() {
            return Ok(AnalyzerResult::zeroed(&[
                SPECTRAL_FLICKER,
                ILLUMINATION_BALANCE,
            ]));
        }

        let mut brightness = Vec::with_capacity(ctx.frames.len());
        let mut balance = Vec::with_capacity(ctx.frames.len());
        for frame in ctx.frames {
            let plane = luma_plane(frame);
            brightness.push(mean_luma(&plane));
            let half = plane.ncols() / 2;
            let left = mean_luma(&plane.slice(s![.., ..half]).to_owned());
            let right = mean_luma(&plane.slice(s![.., half..]).to_owned());
            balance.push(left - right);
        }

        let flicker = 1.0 - high_frequency_ratio(&brightness);
        let balance_score = 1.0 - (std_dev(&balance) / MAX_BALANCE_DRIFT).min(1.0);

        let peak = most_deviant(&balance).map(|i| FrameMarker {
            index: ctx.frames[i].index(),
            timestamp: ctx.frames[i].timestamp(),
        });

        Ok(AnalyzerResult::from_mean([
            (SPECTRAL_FLICKER, flicker),
            (ILLUMINATION_BALANCE, balance_score),
        ])
        .with_peak(peak))
    }
}

/// Share of spectral energy in the upper half of the non-DC band.
///
/// Returns 0 when the series is too short or carries no variation at all.
fn high_frequency_ratio(series: &[f64]) -> f64 {
    let n = series.len();
    if n < MIN_SPECTRUM_SAMPLES {
        return 0.0;
    }

    let m = mean(series);
    let mut buffer: Vec<Complex<f64>> = series.iter().map(|v| Complex::new(v - m, 0.0)).collect();
    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    let nyquist = n / 2;
    let power: Vec<f64> = buffer[1..=nyquist].iter().map(|c| c.norm_sqr()).collect();
    let total: f64 = power.iter().sum();
    if total <= 1e-12 {
        return 0.0;
    }
    let split = power.len() / 2;
    let high: f64 = power[split..].iter().sum();
    high / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::infrastructure::test_support::{solid_frame, Fixture};
    use crate::shared::frame::Frame;
    use approx::assert_relative_eq;

    /// Left half at `left`, right half at `right`.
    fn split_frame(index: usize, left: u8, right: u8) -> Frame {
        let (w, h) = (64usize, 48usize);
        let mut data = Vec::with_capacity(w * h * 3);
        for _ in 0..h {
            for x in 0..w {
                let v = if x < w / 2 { left } else { right };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(data, w as u32, h as u32, 3, index, index as f64 / 30.0)
    }

    #[test]
    fn test_empty_frames_yield_zero_scores() {
        let fixture = Fixture::new(vec![]);
        let result = LightingAnalyzer::new().analyze(&fixture.ctx()).unwrap();
        assert_eq!(result.overall(), 0.0);
    }

    #[test]
    fn test_constant_lighting_scores_perfect() {
        let fixture = Fixture::new((0..8).map(|i| solid_frame(i, 120)).collect());
        let result = LightingAnalyzer::new().analyze(&fixture.ctx()).unwrap();
        assert_relative_eq!(result.overall(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_alternating_brightness_is_flicker() {
        let frames = (0..8)
            .map(|i| solid_frame(i, if i % 2 == 0 { 40 } else { 200 }))
            .collect();
        let fixture = Fixture::new(frames);
        let result = LightingAnalyzer::new().analyze(&fixture.ctx()).unwrap();
        assert!(result.named_scores()[SPECTRAL_FLICKER] < 0.1);
    }

    #[test]
    fn test_slow_ramp_is_not_flicker() {
        let frames = (0..16).map(|i| solid_frame(i, (i * 8) as u8)).collect();
        let fixture = Fixture::new(frames);
        let result = LightingAnalyzer::new().analyze(&fixture.ctx()).unwrap();
        assert!(result.named_scores()[SPECTRAL_FLICKER] > 0.7);
    }

    #[test]
    fn test_balance_drift_lowers_score_and_marks_peak() {
        let frames = vec![
            split_frame(0, 100, 100),
            split_frame(10, 100, 100),
            split_frame(20, 250, 20),
            split_frame(30, 100, 100),
        ];
        let fixture = Fixture::new(frames);
        let result = LightingAnalyzer::new().analyze(&fixture.ctx()).unwrap();
        assert!(result.named_scores()[ILLUMINATION_BALANCE] < 0.8);
        assert_eq!(result.peak().map(|p| p.index), Some(20));
    }

    #[test]
    fn test_short_series_has_no_high_frequency() {
        assert_eq!(high_frequency_ratio(&[0.1, 0.9]), 0.0);
    }
}
