use std::collections::BTreeMap;

use crate::analysis::domain::analyzer_result::FrameMarker;
use crate::shared::detection_result::{AnalyzerScoreMap, Anomaly, Severity};

/// Flags analyzers that scored below their configured threshold.
///
/// Advisory only: the anomalies never feed back into confidence or verdict.
/// An analyzer without a configured threshold never raises one.
pub struct AnomalyCollector {
    thresholds: BTreeMap<String, f64>,
}

impl AnomalyCollector {
    pub fn new(thresholds: BTreeMap<String, f64>) -> Self {
        Self { thresholds }
    }

    /// One anomaly per analyzer with `score < threshold`, located at the
    /// analyzer's peak frame when it reported one.
    pub fn collect(
        &self,
        scores: &AnalyzerScoreMap,
        peaks: &BTreeMap<String, FrameMarker>,
    ) -> Vec<Anomaly> {
        scores
            .iter()
            .filter_map(|(name, &score)| {
                let threshold = *self.thresholds.get(name)?;
                if score >= threshold {
                    return None;
                }
                let severity = if score < threshold / 2.0 {
                    Severity::High
                } else {
                    Severity::Medium
                };
                let (frame_index, timestamp) = peaks
                    .get(name)
                    .map(|m| (m.index, m.timestamp))
                    .unwrap_or((0, 0.0));
                Some(Anomaly {
                    timestamp,
                    frame_index,
                    kind: format!("{name}_score"),
                    severity,
                    description: format!(
                        "{name} analyzer scored {score:.3}, below its threshold of {threshold:.3}"
                    ),
                })
            })
            .collect()
    }
}
