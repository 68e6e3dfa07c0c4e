use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_ANALYZERS, DEFAULT_BATCH_SIZE,
    DEFAULT_FRAME_SKIP, DEFAULT_MODEL_MAX_FRAMES, NEUTRAL_SCORE,
};

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("weight for analyzer '{analyzer}' must be non-negative, got {weight}")]
    NegativeWeight { analyzer: String, weight: f64 },
    #[error("weight for analyzer '{analyzer}' must be finite")]
    NonFiniteWeight { analyzer: String },
    #[error("threshold for analyzer '{analyzer}' must be between 0.0 and 1.0, got {threshold}")]
    ThresholdOutOfRange { analyzer: String, threshold: f64 },
    #[error("frame_skip must be >= 1")]
    InvalidFrameSkip,
    #[error("batch_size must be >= 1")]
    InvalidBatchSize,
    #[error("max_frames must be >= 1 when set")]
    InvalidMaxFrames,
    #[error("max_workers must be >= 1")]
    InvalidMaxWorkers,
    #[error("analyzer_timeout_ms must be >= 1 when set")]
    InvalidTimeout,
    #[error("model neutral score must be between 0.0 and 1.0, got {0}")]
    NeutralScoreOutOfRange(f64),
    #[error("unknown analyzer '{0}'")]
    UnknownAnalyzer(String),
    #[error("analyzer '{0}' has no configuration entry")]
    MissingAnalyzerConfig(String),
    #[error("analyzer '{0}' registered more than once")]
    DuplicateAnalyzer(String),
    #[error("failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-analyzer knobs: whether it runs, its influence on confidence and
/// the score below which it raises an anomaly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub enabled: bool,
    pub weight: f64,
    pub threshold: f64,
}

impl AnalyzerConfig {
    pub fn new(weight: f64, threshold: f64) -> Self {
        Self {
            enabled: true,
            weight,
            threshold,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::new(1.0, 0.5)
    }
}

/// Settings for the model analyzer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// ONNX classifier; without one the analyzer reports `neutral_score`.
    pub path: Option<PathBuf>,
    pub neutral_score: f64,
    pub max_frames: usize,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            path: None,
            neutral_score: NEUTRAL_SCORE,
            max_frames: DEFAULT_MODEL_MAX_FRAMES,
        }
    }
}

/// Everything a `Detector` needs, fixed at construction.
///
/// Every sampled frame is held in memory as full-resolution RGB until the
/// analyzers finish, so peak memory grows with `width * height * 3` times
/// the sample count. Long or high-resolution inputs should set `max_frames`
/// or raise `frame_skip`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Keep every Nth decoded frame.
    pub frame_skip: usize,
    pub batch_size: usize,
    /// Cap on sampled frames per run; `None` samples the whole video.
    pub max_frames: Option<usize>,
    pub analyzers: BTreeMap<String, AnalyzerConfig>,
    pub use_parallel: bool,
    pub max_workers: usize,
    pub analyzer_timeout_ms: Option<u64>,
    pub model: ModelOptions,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            frame_skip: DEFAULT_FRAME_SKIP,
            batch_size: DEFAULT_BATCH_SIZE,
            max_frames: None,
            analyzers: DEFAULT_ANALYZERS
                .iter()
                .map(|&(name, weight, threshold)| {
                    (name.to_string(), AnalyzerConfig::new(weight, threshold))
                })
                .collect(),
            use_parallel: false,
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            analyzer_timeout_ms: None,
            model: ModelOptions::default(),
        }
    }
}

impl DetectorConfig {
    /// Checks every invariant that can be checked without touching a video.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.frame_skip == 0 {
            return Err(ConfigurationError::InvalidFrameSkip);
        }
        if self.batch_size == 0 {
            return Err(ConfigurationError::InvalidBatchSize);
        }
        if self.max_frames == Some(0) {
            return Err(ConfigurationError::InvalidMaxFrames);
        }
        if self.max_workers == 0 {
            return Err(ConfigurationError::InvalidMaxWorkers);
        }
        if self.analyzer_timeout_ms == Some(0) {
            return Err(ConfigurationError::InvalidTimeout);
        }
        if !(0.0..=1.0).contains(&self.model.neutral_score) {
            return Err(ConfigurationError::NeutralScoreOutOfRange(
                self.model.neutral_score,
            ));
        }
        for (name, cfg) in &self.analyzers {
            if !cfg.weight.is_finite() {
                return Err(ConfigurationError::NonFiniteWeight {
                    analyzer: name.clone(),
                });
            }
            if cfg.weight < 0.0 {
                return Err(ConfigurationError::NegativeWeight {
                    analyzer: name.clone(),
                    weight: cfg.weight,
                });
            }
            if !(0.0..=1.0).contains(&cfg.threshold) {
                return Err(ConfigurationError::ThresholdOutOfRange {
                    analyzer: name.clone(),
                    threshold: cfg.threshold,
                });
            }
        }
        Ok(())
    }

    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Platform config location, e.g. `~/.config/deepscan/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the platform config file if one exists, defaults otherwise.
    pub fn load_or_default() -> Result<Self, ConfigurationError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn analyzer_timeout(&self) -> Option<Duration> {
        self.analyzer_timeout_ms.map(Duration::from_millis)
    }

    pub fn enabled_analyzers(&self) -> impl Iterator<Item = (&String, &AnalyzerConfig)> {
        self.analyzers.iter().filter(|(_, cfg)| cfg.enabled)
    }

    pub fn weights(&self) -> BTreeMap<String, f64> {
        self.enabled_analyzers()
            .map(|(name, cfg)| (name.clone(), cfg.weight))
            .collect()
    }

    pub fn thresholds(&self) -> BTreeMap<String, f64> {
        self.enabled_analyzers()
            .map(|(name, cfg)| (name.clone(), cfg.threshold))
            .collect()
    }
}
