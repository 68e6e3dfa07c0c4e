use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;

use crate::analysis::domain::analyzer::Analyzer;
use crate::analysis::infrastructure::analyzer_kind;
use crate::pipeline::analyzer_executor::{panic_message, AnalysisJob, AnalyzerExecutor};
use crate::pipeline::detection_logger::{DetectionLogger, NullDetectionLogger};
use crate::pipeline::infrastructure::inline_analyzer_executor::InlineAnalyzerExecutor;
use crate::pipeline::infrastructure::threaded_analyzer_executor::ThreadedAnalyzerExecutor;
use crate::scoring::domain::anomaly_collector::AnomalyCollector;
use crate::scoring::domain::verdict_calculator::VerdictCalculator;
use crate::shared::constants::{IMAGE_EXTENSIONS, NEUTRAL_SCORE};
use crate::shared::detection_result::{AnalyzerScoreMap, DetectionResult};
use crate::shared::detector_config::{ConfigurationError, DetectorConfig};
use crate::shared::video_metadata::ContainerMetadata;
use crate::video::domain::frame_batcher::FrameBatcher;
use crate::video::domain::frame_source::FrameSource;
use crate::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use crate::video::infrastructure::image_frame_source::ImageFrameSource;

/// Builds a fresh frame source for each analyzed path.
pub type SourceFactory = Box<dyn Fn(&Path) -> Box<dyn FrameSource> + Send + Sync>;

/// Orchestrates one detection run per call.
///
/// Wires the frame source, batcher, analyzers and scoring together. The
/// configuration and analyzer set are fixed at construction, so one
/// detector can analyze many videos, from several threads if needed.
pub struct Detector {
    config: DetectorConfig,
    analyzers: Vec<Arc<dyn Analyzer>>,
    executor: Box<dyn AnalyzerExecutor>,
    source_factory: SourceFactory,
    verdicts: VerdictCalculator,
    anomalies: AnomalyCollector,
}

impl Detector {
    /// Validates `config` and builds every enabled built-in analyzer.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let analyzers = analyzer_kind::build_enabled(&config)?;
        Ok(Self::assemble(config, analyzers))
    }

    /// Uses caller-supplied analyzers instead of the built-in registry.
    ///
    /// Every analyzer needs an entry in `config.analyzers` for its weight
    /// and threshold; analyzers whose entry is disabled are dropped.
    pub fn with_analyzers(
        config: DetectorConfig,
        analyzers: Vec<Arc<dyn Analyzer>>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let mut seen = HashSet::new();
        let mut enabled = Vec::with_capacity(analyzers.len());
        for analyzer in analyzers {
            let name = analyzer.name().to_string();
            if !seen.insert(name.clone()) {
                return Err(ConfigurationError::DuplicateAnalyzer(name));
            }
            match config.analyzers.get(&name) {
                None => return Err(ConfigurationError::MissingAnalyzerConfig(name)),
                Some(cfg) if cfg.enabled => enabled.push(analyzer),
                Some(_) => {}
            }
        }
        Ok(Self::assemble(config, enabled))
    }

    fn assemble(config: DetectorConfig, analyzers: Vec<Arc<dyn Analyzer>>) -> Self {
        let executor: Box<dyn AnalyzerExecutor> =
            if !config.use_parallel && config.analyzer_timeout().is_none() {
                Box::new(InlineAnalyzerExecutor)
            } else {
                let workers = if config.use_parallel {
                    config.max_workers
                } else {
                    1
                };
                Box::new(ThreadedAnalyzerExecutor::new(
                    workers,
                    config.analyzer_timeout(),
                ))
            };

        log::debug!(
            "Detector ready with {} analyzers ({})",
            analyzers.len(),
            if config.use_parallel { "parallel" } else { "sequential" }
        );

        Self {
            verdicts: VerdictCalculator::new(config.weights()),
            anomalies: AnomalyCollector::new(config.thresholds()),
            config,
            analyzers,
            executor,
            source_factory: Box::new(default_source),
        }
    }

    pub fn with_source_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Path) -> Box<dyn FrameSource> + Send + Sync + 'static,
    {
        self.source_factory = Box::new(factory);
        self
    }

    pub fn with_executor(mut self, executor: Box<dyn AnalyzerExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn analyzer_names(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Analyzes one video. Never panics and never fails: an unreadable
    /// input yields an `UNKNOWN` result with `error` set.
    pub fn analyze(&self, path: &Path) -> DetectionResult {
        self.analyze_with_logger(path, &mut NullDetectionLogger)
    }

    pub fn analyze_with_logger(
        &self,
        path: &Path,
        logger: &mut dyn DetectionLogger,
    ) -> DetectionResult {
        let start = Instant::now();
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(path, logger, start))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Detection of {} panicked: {message}", path.display());
                DetectionResult::failed(
                    format!("internal error: {message}"),
                    start.elapsed().as_secs_f64(),
                )
            }
        }
    }

    fn run(&self, path: &Path, logger: &mut dyn DetectionLogger, start: Instant) -> DetectionResult {
        let mut source = (self.source_factory)(path);

        let video = match source.open(path) {
            Ok(video) => video,
            Err(e) => {
                log::error!("Cannot analyze {}: {e}", path.display());
                source.close();
                return DetectionResult::failed(e.to_string(), start.elapsed().as_secs_f64());
            }
        };
        logger.timing("open", elapsed_ms(start));

        let probe_start = Instant::now();
        let container = source.probe(path).unwrap_or_else(|e| {
            log::warn!(
                "Probing {} failed, using file system metadata: {e}",
                path.display()
            );
            ContainerMetadata::from_file_system(path)
        });
        logger.timing("probe", elapsed_ms(probe_start));

        let sample_start = Instant::now();
        let batcher = FrameBatcher::new(self.config.batch_size, self.config.max_frames);
        let sampled = batcher.sample(source.frames(self.config.frame_skip));
        source.close();
        let sampled = match sampled {
            Ok(sampled) => sampled,
            Err(e) => {
                log::error!("No frames could be sampled from {}: {e}", path.display());
                return DetectionResult::failed(e.to_string(), start.elapsed().as_secs_f64());
            }
        };
        logger.timing("sample", elapsed_ms(sample_start));
        logger.metric("frames_sampled", sampled.frames.len() as f64);

        let mut metadata = BTreeMap::new();
        metadata.insert("frames_analyzed".to_string(), json!(sampled.frames.len()));
        metadata.insert("batches".to_string(), json!(sampled.batches));
        metadata.insert("truncated".to_string(), json!(sampled.truncated));
        metadata.insert("width".to_string(), json!(video.width));
        metadata.insert("height".to_string(), json!(video.height));
        metadata.insert("fps".to_string(), json!(video.fps));
        metadata.insert("codec".to_string(), json!(video.codec));
        metadata.insert("duration_seconds".to_string(), json!(container.duration_seconds));
        metadata.insert("format".to_string(), json!(container.format_name));
        metadata.insert("file_size_bytes".to_string(), json!(container.file_size_bytes));

        let job = Arc::new(AnalysisJob {
            frames: sampled.frames.into(),
            video_path: path.to_path_buf(),
            video,
            container,
        });
        let runs = self.executor.execute(&self.analyzers, job);

        let mut scores = AnalyzerScoreMap::new();
        let mut details = BTreeMap::new();
        let mut failures = BTreeMap::new();
        let mut peaks = BTreeMap::new();
        for run in runs {
            logger.timing(
                &format!("analyze:{}", run.name),
                run.duration.as_secs_f64() * 1000.0,
            );
            match run.outcome {
                Ok(result) => {
                    scores.insert(run.name.clone(), result.overall());
                    details.insert(run.name.clone(), result.named_scores().clone());
                    if let Some(peak) = result.peak() {
                        peaks.insert(run.name, peak);
                    }
                }
                Err(e) => {
                    log::warn!(
                        "Analyzer '{}' failed on {}, using neutral score: {e}",
                        run.name,
                        path.display()
                    );
                    scores.insert(run.name.clone(), NEUTRAL_SCORE);
                    failures.insert(run.name, e.to_string());
                }
            }
        }
        logger.metric("analyzer_failures", failures.len() as f64);

        let (confidence, verdict) = self.verdicts.calculate(&scores);
        let anomalies = self.anomalies.collect(&scores, &peaks);
        logger.info(&format!(
            "{}: {verdict} (confidence {confidence:.3}, {} anomalies)",
            path.display(),
            anomalies.len()
        ));

        DetectionResult {
            verdict,
            confidence,
            scores,
            anomalies,
            metadata,
            details,
            failures,
            processing_time_seconds: start.elapsed().as_secs_f64(),
            error: None,
        }
    }
}

fn default_source(path: &Path) -> Box<dyn FrameSource> {
    let is_image = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if is_image {
        Box::new(ImageFrameSource::new())
    } else {
        Box::new(FfmpegFrameSource::new())
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::analyzer::{AnalysisContext, AnalyzerError};
    use crate::analysis::domain::analyzer_result::{AnalyzerResult, FrameMarker};
    use crate::pipeline::analyzer_executor::test_support::{Behavior, StubAnalyzer};
    use crate::pipeline::detection_logger::StdoutDetectionLogger;
    use crate::shared::detection_result::{Severity, Verdict};
    use crate::shared::detector_config::AnalyzerConfig;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::frame_source::FrameSourceError;
    use approx::assert_relative_eq;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;
    use std::time::Duration;

    // --- Stubs ---

    struct StubSource {
        frames: Vec<Frame>,
        fail_open: bool,
        closed: Arc<Mutex<bool>>,
    }

    impl FrameSource for StubSource {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, FrameSourceError> {
            if self.fail_open {
                return Err(FrameSourceError::Open {
                    path: path.to_path_buf(),
                    message: "No such file or directory".to_string(),
                });
            }
            Ok(VideoMetadata {
                width: 8,
                height: 8,
                fps: 30.0,
                total_frames: self.frames.len(),
                codec: "stub".to_string(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn probe(&mut self, _path: &Path) -> Result<ContainerMetadata, FrameSourceError> {
            Err(FrameSourceError::NotOpened)
        }

        fn frames(
            &mut self,
            stride: usize,
        ) -> Box<dyn Iterator<Item = Result<Frame, FrameSourceError>> + '_> {
            Box::new(
                self.frames
                    .drain(..)
                    .filter(move |f| f.index() % stride == 0)
                    .map(Ok),
            )
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    fn frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame::new(vec![(i % 256) as u8; 8 * 8 * 3], 8, 8, 3, i, i as f64 / 30.0))
            .collect()
    }

    fn stub_source(count: usize) -> impl Fn(&Path) -> Box<dyn FrameSource> + Send + Sync {
        move |_: &Path| -> Box<dyn FrameSource> {
            Box::new(StubSource {
                frames: frames(count),
                fail_open: false,
                closed: Arc::new(Mutex::new(false)),
            })
        }
    }

    fn config(entries: &[(&str, f64, f64)]) -> DetectorConfig {
        DetectorConfig {
            frame_skip: 1,
            analyzers: entries
                .iter()
                .map(|&(n, w, t)| (n.to_string(), AnalyzerConfig::new(w, t)))
                .collect(),
            ..DetectorConfig::default()
        }
    }

    /// Counts frames it received and marks the last one as its peak.
    struct FrameCounter;

    impl Analyzer for FrameCounter {
        fn name(&self) -> &str {
            "counter"
        }

        fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<AnalyzerResult, AnalyzerError> {
            let peak = ctx.frames.last().map(|f| FrameMarker {
                index: f.index(),
                timestamp: f.timestamp(),
            });
            Ok(
                AnalyzerResult::new([("frames", ctx.frames.len() as f64 / 100.0)], 0.1)
                    .with_peak(peak),
            )
        }
    }

    fn counter() -> Vec<Arc<dyn Analyzer>> {
        vec![Arc::new(FrameCounter)]
    }

    // --- Tests ---

    #[test]
    fn test_failing_analyzer_is_neutral_scored() {
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![
            StubAnalyzer::new("facial", Behavior::Score(0.8)),
            StubAnalyzer::new("temporal", Behavior::Score(0.8)),
            StubAnalyzer::new("metadata", Behavior::Fail("corrupt atom")),
        ];
        let cfg = config(&[
            ("facial", 1.0, 0.5),
            ("temporal", 1.0, 0.5),
            ("metadata", 1.0, 0.4),
        ]);
        let detector = Detector::with_analyzers(cfg, analyzers)
            .unwrap()
            .with_source_factory(stub_source(10));

        let result = detector.analyze(Path::new("clip.mp4"));
        assert!(result.error.is_none());
        assert_eq!(result.scores["metadata"], 0.5);
        assert_relative_eq!(result.confidence, 0.7, epsilon = 1e-9);
        assert_eq!(result.verdict, Verdict::Real);
        assert!(result.anomalies.is_empty());
        assert!(result.failures["metadata"].contains("corrupt atom"));
        assert!(!result.details.contains_key("metadata"));
    }

    #[test]
    fn test_neutral_failure_score_can_still_raise_anomaly() {
        let analyzers: Vec<Arc<dyn Analyzer>> =
            vec![StubAnalyzer::new("metadata", Behavior::Fail("x"))];
        let detector = Detector::with_analyzers(config(&[("metadata", 1.0, 0.6)]), analyzers)
            .unwrap()
            .with_source_factory(stub_source(3));

        let result = detector.analyze(Path::new("clip.mp4"));
        assert_eq!(result.anomalies.len(), 1);
        assert_eq!(result.anomalies[0].severity, Severity::Medium);
        assert_eq!(result.anomalies[0].kind, "metadata_score");
    }

    #[test]
    fn test_open_failure_is_unknown_with_error() {
        let closed = Arc::new(Mutex::new(false));
        let flag = closed.clone();
        let detector = Detector::new(DetectorConfig::default())
            .unwrap()
            .with_source_factory(move |_: &Path| -> Box<dyn FrameSource> {
                Box::new(StubSource {
                    frames: Vec::new(),
                    fail_open: true,
                    closed: flag.clone(),
                })
            });

        let result = detector.analyze(Path::new("/missing.mp4"));
        assert_eq!(result.verdict, Verdict::Unknown);
        assert_eq!(result.confidence, 0.5);
        assert!(result.error.as_deref().unwrap().contains("No such file"));
        assert!(result.scores.is_empty());
        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn test_missing_file_with_real_sources() {
        let detector = Detector::new(DetectorConfig::default()).unwrap();
        let result = detector.analyze(Path::new("/nonexistent/clip.mp4"));
        assert_eq!(result.verdict, Verdict::Unknown);
        assert!(!result.error.unwrap().is_empty());
    }

    #[test]
    fn test_panic_and_timeout_are_isolated() {
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![
            StubAnalyzer::new("panics", Behavior::Panic),
            StubAnalyzer::new("hangs", Behavior::Sleep(Duration::from_secs(5), 1.0)),
            StubAnalyzer::new("works", Behavior::Score(0.9)),
        ];
        let mut cfg = config(&[("panics", 1.0, 0.5), ("hangs", 1.0, 0.5), ("works", 1.0, 0.5)]);
        cfg.analyzer_timeout_ms = Some(100);
        let detector = Detector::with_analyzers(cfg, analyzers)
            .unwrap()
            .with_source_factory(stub_source(4));

        let result = detector.analyze(Path::new("clip.mp4"));
        assert!(result.error.is_none());
        assert_eq!(result.scores["panics"], 0.5);
        assert_eq!(result.scores["hangs"], 0.5);
        assert_eq!(result.scores["works"], 0.9);
        assert!(result.failures["hangs"].contains("timed out"));
        assert!(result.failures["panics"].contains("panicked"));
        assert_relative_eq!(result.confidence, 1.9 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let make = |parallel: bool| {
            let analyzers: Vec<Arc<dyn Analyzer>> = vec![
                StubAnalyzer::new("a", Behavior::Score(0.2)),
                StubAnalyzer::new("b", Behavior::Sleep(Duration::from_millis(10), 0.7)),
                StubAnalyzer::new("c", Behavior::Fail("nope")),
                Arc::new(FrameCounter),
            ];
            let mut cfg = config(&[
                ("a", 2.0, 0.5),
                ("b", 1.0, 0.5),
                ("c", 0.5, 0.5),
                ("counter", 1.0, 0.5),
            ]);
            cfg.use_parallel = parallel;
            cfg.max_workers = 3;
            Detector::with_analyzers(cfg, analyzers)
                .unwrap()
                .with_source_factory(stub_source(12))
        };

        let sequential = make(false).analyze(Path::new("clip.mp4"));
        let parallel = make(true).analyze(Path::new("clip.mp4"));
        assert_eq!(sequential.scores, parallel.scores);
        assert_eq!(sequential.confidence, parallel.confidence);
        assert_eq!(sequential.verdict, parallel.verdict);
        assert_eq!(sequential.anomalies, parallel.anomalies);
    }

    #[test]
    fn test_frames_sampled_with_stride_and_located_anomaly() {
        let mut cfg = config(&[("counter", 1.0, 0.5)]);
        cfg.frame_skip = 3;
        cfg.batch_size = 2;
        let detector = Detector::with_analyzers(cfg, counter())
            .unwrap()
            .with_source_factory(stub_source(10));

        let result = detector.analyze(Path::new("clip.mp4"));
        // Indices 0, 3, 6, 9 in batches of two.
        assert_eq!(result.metadata["frames_analyzed"], json!(4));
        assert_eq!(result.metadata["batches"], json!(2));
        assert_eq!(result.details["counter"]["frames"], 0.04);
        assert_eq!(result.anomalies.len(), 1);
        assert_eq!(result.anomalies[0].frame_index, 9);
        assert_relative_eq!(result.anomalies[0].timestamp, 0.3, epsilon = 1e-9);
        assert_eq!(result.anomalies[0].severity, Severity::High);
    }

    #[test]
    fn test_max_frames_caps_sampling() {
        let mut cfg = config(&[("counter", 1.0, 0.5)]);
        cfg.max_frames = Some(5);
        let detector = Detector::with_analyzers(cfg, counter())
            .unwrap()
            .with_source_factory(stub_source(50));
        let result = detector.analyze(Path::new("clip.mp4"));
        assert_eq!(result.metadata["frames_analyzed"], json!(5));
    }

    #[test]
    fn test_metadata_falls_back_to_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![0u8; 1234]).unwrap();

        let detector = Detector::with_analyzers(config(&[("counter", 1.0, 0.5)]), counter())
            .unwrap()
            .with_source_factory(stub_source(2));
        let result = detector.analyze(&path);
        assert_eq!(result.metadata["file_size_bytes"], json!(1234));
        assert_eq!(result.metadata["duration_seconds"], serde_json::Value::Null);
        assert_eq!(result.metadata["codec"], json!("stub"));
    }

    #[test]
    fn test_empty_video_runs_analyzers_on_no_frames() {
        let detector = Detector::with_analyzers(config(&[("counter", 1.0, 0.0)]), counter())
            .unwrap()
            .with_source_factory(stub_source(0));
        let result = detector.analyze(Path::new("clip.mp4"));
        assert!(result.error.is_none());
        assert_eq!(result.metadata["frames_analyzed"], json!(0));
        assert_eq!(result.details["counter"]["frames"], 0.0);
    }

    #[test]
    fn test_disabled_analyzer_is_dropped() {
        let stub = StubAnalyzer::new("skipped", Behavior::Score(0.0));
        let mut cfg = config(&[("counter", 1.0, 0.5)]);
        cfg.analyzers
            .insert("skipped".to_string(), AnalyzerConfig::disabled());
        let analyzers: Vec<Arc<dyn Analyzer>> = vec![stub.clone(), Arc::new(FrameCounter)];
        let detector = Detector::with_analyzers(cfg, analyzers)
            .unwrap()
            .with_source_factory(stub_source(2));

        assert_eq!(detector.analyzer_names(), vec!["counter"]);
        let result = detector.analyze(Path::new("clip.mp4"));
        assert!(!result.scores.contains_key("skipped"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_injected_analyzer_needs_config_entry() {
        let result = Detector::with_analyzers(config(&[]), counter());
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingAnalyzerConfig(ref name)) if name == "counter"
        ));
    }

    #[test]
    fn test_duplicate_analyzer_rejected() {
        let mut analyzers = counter();
        analyzers.extend(counter());
        let result = Detector::with_analyzers(config(&[("counter", 1.0, 0.5)]), analyzers);
        assert!(matches!(result, Err(ConfigurationError::DuplicateAnalyzer(_))));
    }

    #[test]
    fn test_invalid_config_fails_before_any_video() {
        let mut cfg = DetectorConfig::default();
        cfg.analyzers.get_mut("facial").unwrap().weight = -1.0;
        assert!(matches!(
            Detector::new(cfg),
            Err(ConfigurationError::NegativeWeight { .. })
        ));

        let cfg = DetectorConfig {
            analyzer_timeout_ms: Some(0),
            ..DetectorConfig::default()
        };
        assert!(matches!(
            Detector::new(cfg),
            Err(ConfigurationError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_logger_receives_stage_timings() {
        let detector = Detector::with_analyzers(config(&[("counter", 1.0, 0.5)]), counter())
            .unwrap()
            .with_source_factory(stub_source(3));
        let mut logger = StdoutDetectionLogger::new(1);
        detector.analyze_with_logger(Path::new("clip.mp4"), &mut logger);

        for stage in ["open", "probe", "sample", "analyze:counter"] {
            assert_eq!(logger.timings_for(stage).map(<[f64]>::len), Some(1), "{stage}");
        }
        assert_eq!(logger.metrics_for("frames_sampled"), Some(&[3.0][..]));
    }

    #[test]
    fn test_default_source_routes_images() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("still.PNG");
        image::RgbImage::from_pixel(32, 24, image::Rgb([120, 90, 60]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let detector = Detector::new(DetectorConfig::default()).unwrap();
        let result = detector.analyze(&path);
        assert!(result.error.is_none(), "{:?}", result.error);
        assert_eq!(result.metadata["frames_analyzed"], json!(1));
        assert_eq!(result.scores.len(), 6);
    }

    #[test]
    fn test_end_to_end_on_generated_video() {
        use crate::video::infrastructure::ffmpeg_frame_source::tests::create_test_video;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        create_test_video(&path, 30, 160, 120, 30);

        let cfg = DetectorConfig {
            frame_skip: 2,
            use_parallel: true,
            max_workers: 2,
            ..DetectorConfig::default()
        };
        let result = Detector::new(cfg).unwrap().analyze(&path);

        assert!(result.error.is_none(), "{:?}", result.error);
        assert_eq!(result.scores.len(), 6);
        assert!(result.scores.values().all(|s| (0.0..=1.0).contains(s)));
        assert!((0.0..=1.0).contains(&result.confidence));
        assert_eq!(result.metadata["frames_analyzed"], json!(15));
        assert_eq!(result.metadata["width"], json!(160));
        assert!(result.processing_time_seconds > 0.0);
    }
}
