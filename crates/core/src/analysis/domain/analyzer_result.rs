use std::collections::BTreeMap;

/// Points at the sampled frame an analyzer found most suspicious.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMarker {
    pub index: usize,
    pub timestamp: f64,
}

/// Scores produced by one analyzer for one run.
///
/// All scores are clamped to `[0, 1]` on construction. Higher means more
/// likely authentic. A non-finite `overall` is kept as-is so the
/// orchestrator can reject it; NaN sub-scores are dropped to 0.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzerResult {
    named_scores: BTreeMap<String, f64>,
    overall: f64,
    peak: Option<FrameMarker>,
}

impl AnalyzerResult {
    pub fn new<I, K>(named_scores: I, overall: f64) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            named_scores: named_scores
                .into_iter()
                .map(|(k, v)| (k.into(), clamp_score(v)))
                .collect(),
            overall: if overall.is_finite() {
                overall.clamp(0.0, 1.0)
            } else {
                overall
            },
            peak: None,
        }
    }

    /// Result for an empty input: every named score and the overall at 0.
    pub fn zeroed(names: &[&str]) -> Self {
        Self::new(names.iter().map(|n| (*n, 0.0)), 0.0)
    }

    /// Result with every named score and the overall set to `value`.
    pub fn uniform(names: &[&str], value: f64) -> Self {
        Self::new(names.iter().map(|n| (*n, value)), value)
    }

    /// Overall as the unweighted mean of the named scores.
    pub fn from_mean<I, K>(named_scores: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut result = Self::new(named_scores, 0.0);
        if !result.named_scores.is_empty() {
            result.overall =
                result.named_scores.values().sum::<f64>() / result.named_scores.len() as f64;
        }
        result
    }

    pub fn with_peak(mut self, peak: Option<FrameMarker>) -> Self {
        self.peak = peak;
        self
    }

    pub fn named_scores(&self) -> &BTreeMap<String, f64> {
        &self.named_scores
    }

    pub fn overall(&self) -> f64 {
        self.overall
    }

    pub fn peak(&self) -> Option<FrameMarker> {
        self.peak
    }
}

fn clamp_score(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scores_clamped() {
        let result = AnalyzerResult::new([("a", 1.4), ("b", -0.2)], 2.0);
        assert_eq!(result.named_scores()["a"], 1.0);
        assert_eq!(result.named_scores()["b"], 0.0);
        assert_eq!(result.overall(), 1.0);
    }

    #[test]
    fn test_non_finite_overall_preserved_nan_subscore_zeroed() {
        let result = AnalyzerResult::new([("a", f64::NAN)], f64::NAN);
        assert_eq!(result.named_scores()["a"], 0.0);
        assert!(result.overall().is_nan());

        let result = AnalyzerResult::new([("a", 0.5)], f64::INFINITY);
        assert!(result.overall().is_infinite());
    }

    #[test]
    fn test_zeroed() {
        let result = AnalyzerResult::zeroed(&["x", "y"]);
        assert_eq!(result.overall(), 0.0);
        assert_eq!(result.named_scores().len(), 2);
        assert!(result.named_scores().values().all(|v| *v == 0.0));
    }

    #[test]
    fn test_from_mean() {
        let result = AnalyzerResult::from_mean([("a", 0.2), ("b", 0.6)]);
        assert_relative_eq!(result.overall(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_from_mean_empty_is_zero() {
        let result = AnalyzerResult::from_mean(Vec::<(String, f64)>::new());
        assert_eq!(result.overall(), 0.0);
    }

    #[test]
    fn test_peak_marker() {
        let marker = FrameMarker {
            index: 30,
            timestamp: 1.0,
        };
        let result = AnalyzerResult::uniform(&["a"], 0.5).with_peak(Some(marker));
        assert_eq!(result.peak(), Some(marker));
    }
}
