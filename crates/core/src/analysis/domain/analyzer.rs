use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::analysis::domain::analyzer_result::AnalyzerResult;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::{ContainerMetadata, VideoMetadata};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("{0}")]
    Failed(String),
    #[error("model inference failed: {0}")]
    Model(String),
    #[error("analyzer panicked: {0}")]
    Panicked(String),
    #[error("analyzer timed out after {0:?}")]
    TimedOut(Duration),
    #[error("analyzer returned a non-finite overall score")]
    NonFiniteScore,
}

/// Everything an analyzer may look at during one run.
///
/// Frame-based analyzers read `frames`; the metadata analyzer reads the
/// path and the two metadata records.
pub struct AnalysisContext<'a> {
    pub frames: &'a [Frame],
    pub video_path: &'a Path,
    pub video: &'a VideoMetadata,
    pub container: &'a ContainerMetadata,
}

/// Domain interface for one independent authenticity signal.
///
/// Implementations must be reentrant: `analyze` takes `&self` and may be
/// called from several threads at once. Any cache an analyzer keeps is its
/// own and must be internally synchronized.
///
/// An empty frame sequence is not an error: frame-based analyzers return a
/// result with every score at 0.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<AnalyzerResult, AnalyzerError>;
}
