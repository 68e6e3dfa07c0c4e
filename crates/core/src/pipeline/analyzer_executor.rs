use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analysis::domain::analyzer::{AnalysisContext, Analyzer, AnalyzerError};
use crate::analysis::domain::analyzer_result::AnalyzerResult;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::{ContainerMetadata, VideoMetadata};

/// Read-only input shared by every analyzer of one run.
pub struct AnalysisJob {
    pub frames: Arc<[Frame]>,
    pub video_path: PathBuf,
    pub video: VideoMetadata,
    pub container: ContainerMetadata,
}

impl AnalysisJob {
    pub fn context(&self) -> AnalysisContext<'_> {
        AnalysisContext {
            frames: &self.frames,
            video_path: &self.video_path,
            video: &self.video,
            container: &self.container,
        }
    }
}

/// What one analyzer produced, or why it produced nothing.
#[derive(Debug)]
pub struct AnalyzerRun {
    pub name: String,
    pub outcome: Result<AnalyzerResult, AnalyzerError>,
    pub duration: Duration,
}

/// Abstracts how the enabled analyzers are scheduled.
///
/// Implementations return exactly one `AnalyzerRun` per analyzer, in the
/// order given, and only once every analyzer has finished, failed or timed
/// out. They never propagate an analyzer's failure.
pub trait AnalyzerExecutor: Send + Sync {
    fn execute(&self, analyzers: &[Arc<dyn Analyzer>], job: Arc<AnalysisJob>) -> Vec<AnalyzerRun>;
}

/// Runs one analyzer with panics caught and non-finite scores rejected.
pub fn run_isolated(analyzer: &dyn Analyzer, job: &AnalysisJob) -> AnalyzerRun {
    let started = Instant::now();
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(&job.context())))
    {
        Ok(Ok(result)) if !result.overall().is_finite() => Err(AnalyzerError::NonFiniteScore),
        Ok(outcome) => outcome,
        Err(payload) => Err(AnalyzerError::Panicked(panic_message(payload.as_ref()))),
    };
    AnalyzerRun {
        name: analyzer.name().to_string(),
        outcome,
        duration: started.elapsed(),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
