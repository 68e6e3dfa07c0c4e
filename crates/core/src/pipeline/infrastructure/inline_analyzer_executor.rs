use std::sync::Arc;

use crate::analysis::domain::analyzer::Analyzer;
use crate::pipeline::analyzer_executor::{run_isolated, AnalysisJob, AnalyzerExecutor, AnalyzerRun};

/// Runs analyzers one after another on the calling thread.
///
/// Panics are caught per analyzer. There is no timeout: a hung analyzer
/// hangs the run, so configure a timeout to get the threaded executor.
pub struct InlineAnalyzerExecutor;

impl AnalyzerExecutor for InlineAnalyzerExecutor {
    fn execute(&self, analyzers: &[Arc<dyn Analyzer>], job: Arc<AnalysisJob>) -> Vec<AnalyzerRun> {
        analyzers
            .iter()
            .map(|analyzer| run_isolated(analyzer.as_ref(), &job))
            .collect()
    }
}
