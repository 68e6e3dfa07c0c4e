use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::shared::constants::NEUTRAL_SCORE;

/// Analyzer name → overall score, built once per run.
pub type AnalyzerScoreMap = BTreeMap<String, f64>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Fake,
    Real,
    Uncertain,
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Fake => write!(f, "FAKE"),
            Verdict::Real => write!(f, "REAL"),
            Verdict::Uncertain => write!(f, "UNCERTAIN"),
            Verdict::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Advisory flag raised when an analyzer scores below its threshold.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Anomaly {
    pub timestamp: f64,
    pub frame_index: usize,
    pub kind: String,
    pub severity: Severity,
    pub description: String,
}

/// Outcome of one `Detector::analyze` call, handed to the reporting layer.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionResult {
    pub verdict: Verdict,
    pub confidence: f64,
    pub scores: AnalyzerScoreMap,
    pub anomalies: Vec<Anomaly>,
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Named sub-scores reported by each analyzer that completed.
    pub details: BTreeMap<String, BTreeMap<String, f64>>,
    /// Analyzers that were neutral-scored, with the reason.
    pub failures: BTreeMap<String, String>,
    pub processing_time_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResult {
    /// Result for a run that could not read its input at all.
    pub fn failed(error: impl Into<String>, processing_time_seconds: f64) -> Self {
        Self {
            verdict: Verdict::Unknown,
            confidence: NEUTRAL_SCORE,
            scores: AnalyzerScoreMap::new(),
            anomalies: Vec::new(),
            metadata: BTreeMap::new(),
            details: BTreeMap::new(),
            failures: BTreeMap::new(),
            processing_time_seconds,
            error: Some(error.into()),
        }
    }
}
