use std::sync::Arc;

use crate::analysis::domain::analyzer::Analyzer;
use crate::shared::detector_config::{ConfigurationError, DetectorConfig, ModelOptions};

use super::facial_analyzer::{self, FacialAnalyzer};
use super::geometry_analyzer::{self, GeometryAnalyzer};
use super::lighting_analyzer::{self, LightingAnalyzer};
use super::metadata_analyzer::{self, MetadataAnalyzer};
use super::model_analyzer::{self, ModelAnalyzer};
use super::temporal_analyzer::{self, TemporalAnalyzer};

/// The closed set of built-in analyzers, addressable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnalyzerKind {
    Facial,
    Temporal,
    Metadata,
    Lighting,
    Geometry,
    Model,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 6] = [
        AnalyzerKind::Facial,
        AnalyzerKind::Temporal,
        AnalyzerKind::Metadata,
        AnalyzerKind::Lighting,
        AnalyzerKind::Geometry,
        AnalyzerKind::Model,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnalyzerKind::Facial => facial_analyzer::NAME,
            AnalyzerKind::Temporal => temporal_analyzer::NAME,
            AnalyzerKind::Metadata => metadata_analyzer::NAME,
            AnalyzerKind::Lighting => lighting_analyzer::NAME,
            AnalyzerKind::Geometry => geometry_analyzer::NAME,
            AnalyzerKind::Model => model_analyzer::NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Instantiate the analyzer. Only the model variant can fail, when a
    /// model path is configured but cannot be loaded.
    pub fn build(self, model: &ModelOptions) -> Result<Arc<dyn Analyzer>, ConfigurationError> {
        let analyzer: Arc<dyn Analyzer> = match self {
            AnalyzerKind::Facial => Arc::new(FacialAnalyzer::new()),
            AnalyzerKind::Temporal => Arc::new(TemporalAnalyzer::new()),
            AnalyzerKind::Metadata => Arc::new(MetadataAnalyzer::new()),
            AnalyzerKind::Lighting => Arc::new(LightingAnalyzer::new()),
            AnalyzerKind::Geometry => Arc::new(GeometryAnalyzer::new()),
            AnalyzerKind::Model => match &model.path {
                None => Arc::new(ModelAnalyzer::placeholder(model.neutral_score)),
                Some(path) => Arc::new(
                    ModelAnalyzer::from_model(path, model.neutral_score, model.max_frames)
                        .map_err(|e| ConfigurationError::ModelLoad {
                            path: path.clone(),
                            message: e.to_string(),
                        })?,
                ),
            },
        };
        Ok(analyzer)
    }
}

/// Build every enabled analyzer named in `config`, in name order.
pub fn build_enabled(config: &DetectorConfig) -> Result<Vec<Arc<dyn Analyzer>>, ConfigurationError> {
    config
        .enabled_analyzers()
        .map(|(name, _)| {
            AnalyzerKind::from_name(name)
                .ok_or_else(|| ConfigurationError::UnknownAnalyzer(name.clone()))?
                .build(&config.model)
        })
        .collect()
}
