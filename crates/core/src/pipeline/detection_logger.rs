use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for detection runs: stage timings, metrics and messages.
///
/// Keeps the detector free of output concerns; the CLI prints a summary,
/// tests pass the null logger.
pub trait DetectionLogger: Send {
    /// Report batch-level progress (videos done out of total).
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one video.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. frames sampled).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-batch summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullDetectionLogger;

impl DetectionLogger for NullDetectionLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI logger that accumulates stage timings and metrics across a batch
/// and reports them through the `log` facade.
///
/// Progress output is throttled to every `throttle_items` videos.
pub struct StdoutDetectionLogger {
    throttle_items: usize,
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, Vec<f64>>,
    start_time: Instant,
    total_items: usize,
    messages: Vec<String>,
}

impl StdoutDetectionLogger {
    pub fn new(throttle_items: usize) -> Self {
        Self {
            throttle_items: throttle_items.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            total_items: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Detection summary ({} videos, {:.1}s total):",
            self.total_items,
            elapsed_ms / 1000.0
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:18}: avg {avg_ms:7.1}ms  max {max_ms:7.1}ms  total {total_ms:8.0}ms"
            ));
        }

        for (name, values) in &self.metrics {
            let avg = values.iter().sum::<f64>() / values.len().max(1) as f64;
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutDetectionLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl DetectionLogger for StdoutDetectionLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_items = total;
        if total > 0 && (current % self.throttle_items == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Analyzed {current}/{total} videos ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
