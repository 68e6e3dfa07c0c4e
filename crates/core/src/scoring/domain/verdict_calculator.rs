use std::collections::BTreeMap;

use crate::shared::constants::{FAKE_BELOW, NEUTRAL_SCORE, REAL_ABOVE};
use crate::shared::detection_result::{AnalyzerScoreMap, Verdict};

/// Weighted-mean ensemble over the analyzer score map.
///
/// Stateless apart from the weights fixed at construction, so the verdict
/// is a pure function of the scores. Scores without a configured weight
/// count with weight 1.0.
pub struct VerdictCalculator {
    weights: BTreeMap<String, f64>,
}

impl VerdictCalculator {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    pub fn weight_of(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(1.0)
    }

    /// Returns `(confidence, verdict)`.
    pub fn calculate(&self, scores: &AnalyzerScoreMap) -> (f64, Verdict) {
        let (weighted, total) = scores
            .iter()
            .fold((0.0f64, 0.0f64), |(weighted, total), (name, score)| {
                let weight = self.weight_of(name);
                (weighted + score * weight, total + weight)
            });

        if scores.is_empty() || total <= 0.0 || !weighted.is_finite() {
            return (NEUTRAL_SCORE, Verdict::Unknown);
        }

        let confidence = (weighted / total).clamp(0.0, 1.0);
        (confidence, verdict_for(confidence))
    }
}

/// Decision table over a confidence value.
pub fn verdict_for(confidence: f64) -> Verdict {
    if confidence < FAKE_BELOW {
        Verdict::Fake
    } else if confidence > REAL_ABOVE {
        Verdict::Real
    } else {
        Verdict::Uncertain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn scores(entries: &[(&str, f64)]) -> AnalyzerScoreMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn equal_weights(names: &[&str]) -> VerdictCalculator {
        VerdictCalculator::new(names.iter().map(|n| (n.to_string(), 1.0)).collect())
    }

    #[test]
    fn test_consistent_high_scores_are_real() {
        let calc = equal_weights(&["facial", "temporal", "lighting"]);
        let (confidence, verdict) =
            calc.calculate(&scores(&[("facial", 0.9), ("temporal", 0.85), ("lighting", 0.88)]));
        assert_relative_eq!(confidence, 0.8767, epsilon = 1e-3);
        assert_eq!(verdict, Verdict::Real);
    }

    #[test]
    fn test_consistent_low_scores_are_fake() {
        let calc = equal_weights(&["facial", "temporal", "lighting"]);
        let (confidence, verdict) =
            calc.calculate(&scores(&[("facial", 0.3), ("temporal", 0.25), ("lighting", 0.35)]));
        assert_relative_eq!(confidence, 0.30, epsilon = 1e-9);
        assert_eq!(verdict, Verdict::Fake);
    }

    #[test]
    fn test_single_neutral_score_is_uncertain() {
        let calc = equal_weights(&["facial"]);
        let (confidence, verdict) = calc.calculate(&scores(&[("facial", 0.5)]));
        assert_eq!(confidence, 0.5);
        assert_eq!(verdict, Verdict::Uncertain);
    }

    #[test]
    fn test_empty_map_is_unknown() {
        let calc = equal_weights(&["facial"]);
        assert_eq!(
            calc.calculate(&AnalyzerScoreMap::new()),
            (0.5, Verdict::Unknown)
        );
    }

    #[test]
    fn test_zero_total_weight_is_unknown() {
        let calc = VerdictCalculator::new(BTreeMap::from([("facial".to_string(), 0.0)]));
        assert_eq!(
            calc.calculate(&scores(&[("facial", 0.1)])),
            (0.5, Verdict::Unknown)
        );
    }

    #[test]
    fn test_missing_weight_defaults_to_one() {
        let calc = VerdictCalculator::new(BTreeMap::from([("facial".to_string(), 3.0)]));
        let (confidence, _) = calc.calculate(&scores(&[("facial", 1.0), ("plugin", 0.0)]));
        assert_relative_eq!(confidence, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_weights_shift_confidence() {
        let calc = VerdictCalculator::new(BTreeMap::from([
            ("facial".to_string(), 1.0),
            ("metadata".to_string(), 0.5),
        ]));
        let (confidence, _) = calc.calculate(&scores(&[("facial", 0.9), ("metadata", 0.3)]));
        assert_relative_eq!(confidence, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_confidence_matches_weighted_mean_in_any_order() {
        let entries = [
            ("zeta", 0.12, 0.3),
            ("alpha", 0.97, 2.0),
            ("mu", 0.45, 1.0),
            ("beta", 0.61, 0.7),
        ];
        let calc = VerdictCalculator::new(
            entries
                .iter()
                .map(|&(name, _, weight)| (name.to_string(), weight))
                .collect(),
        );

        let orders = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]];
        for order in orders {
            let permuted: Vec<_> = order.iter().map(|&i| entries[i]).collect();
            let (weighted, total) = permuted
                .iter()
                .fold((0.0, 0.0), |(w, t), &(_, score, weight)| {
                    (w + score * weight, t + weight)
                });
            let map: AnalyzerScoreMap = permuted
                .iter()
                .map(|&(name, score, _)| (name.to_string(), score))
                .collect();

            let (confidence, _) = calc.calculate(&map);
            assert_relative_eq!(confidence, weighted / total, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_confidence_stays_in_unit_interval() {
        let calc = VerdictCalculator::new(BTreeMap::from([
            ("a".to_string(), 0.001),
            ("b".to_string(), 1000.0),
            ("c".to_string(), 7.5),
        ]));
        for a in [0.0, 0.3, 1.0] {
            for b in [0.0, 0.5, 1.0] {
                for c in [0.0, 0.99, 1.0] {
                    let (confidence, _) =
                        calc.calculate(&scores(&[("a", a), ("b", b), ("c", c)]));
                    assert!((0.0..=1.0).contains(&confidence));
                }
            }
        }
    }

    #[rstest]
    #[case(0.0, Verdict::Fake)]
    #[case(0.399, Verdict::Fake)]
    #[case(0.4, Verdict::Uncertain)]
    #[case(0.6, Verdict::Uncertain)]
    #[case(0.601, Verdict::Real)]
    #[case(1.0, Verdict::Real)]
    fn test_verdict_boundaries(#[case] confidence: f64, #[case] expected: Verdict) {
        assert_eq!(verdict_for(confidence), expected);
    }
}
