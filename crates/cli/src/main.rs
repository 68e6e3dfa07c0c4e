use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use deepscan_core::analysis::infrastructure::analyzer_kind::AnalyzerKind;
use deepscan_core::pipeline::detection_logger::{DetectionLogger, StdoutDetectionLogger};
use deepscan_core::pipeline::detector::Detector;
use deepscan_core::shared::detection_result::DetectionResult;
use deepscan_core::shared::detector_config::DetectorConfig;

/// Deepfake detection for videos and images.
#[derive(Parser)]
#[command(name = "deepscan")]
struct Cli {
    /// Input video or image files.
    #[arg(required_unless_present = "print_config")]
    inputs: Vec<PathBuf>,

    /// JSON config file (default: the platform config dir, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Analyze every Nth frame (1 = every frame).
    #[arg(long)]
    frame_skip: Option<usize>,

    /// Frames per batch while sampling.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Stop sampling after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Run analyzers on a worker pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads when --parallel is set.
    #[arg(long)]
    workers: Option<usize>,

    /// Per-analyzer timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// ONNX authenticity model for the model analyzer.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Analyzers to skip (comma-separated).
    #[arg(long, value_delimiter = ',')]
    disable: Vec<String>,

    /// Output format: json or text.
    #[arg(long, default_value = "json")]
    format: String,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let detector = Detector::new(config)?;
    log::info!("Analyzers: {}", detector.analyzer_names().join(", "));

    let mut logger = StdoutDetectionLogger::default();
    let total = cli.inputs.len();
    let mut unreadable = 0;

    for (i, input) in cli.inputs.iter().enumerate() {
        let result = detector.analyze_with_logger(input, &mut logger);
        if result.error.is_some() {
            unreadable += 1;
        }
        match cli.format.as_str() {
            "text" => println!("{}", format_text(input, &result)),
            _ => println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "path": input.display().to_string(),
                    "result": result,
                }))?
            ),
        }
        logger.progress(i + 1, total);
    }

    logger.summary();

    if unreadable == total {
        return Err(format!("none of the {total} inputs could be analyzed").into());
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<DetectorConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => DetectorConfig::load(path)?,
        None => DetectorConfig::load_or_default()?,
    };

    if let Some(n) = cli.frame_skip {
        config.frame_skip = n;
    }
    if let Some(n) = cli.batch_size {
        config.batch_size = n;
    }
    if cli.max_frames.is_some() {
        config.max_frames = cli.max_frames;
    }
    if cli.parallel {
        config.use_parallel = true;
    }
    if let Some(n) = cli.workers {
        config.max_workers = n;
    }
    if cli.timeout_ms.is_some() {
        config.analyzer_timeout_ms = cli.timeout_ms;
    }
    if cli.model.is_some() {
        config.model.path = cli.model.clone();
    }
    for name in &cli.disable {
        if let Some(entry) = config.analyzers.get_mut(name) {
            entry.enabled = false;
        }
    }

    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.format != "json" && cli.format != "text" {
        return Err(format!("Format must be 'json' or 'text', got '{}'", cli.format).into());
    }
    if let Some(name) = cli
        .disable
        .iter()
        .find(|n| AnalyzerKind::from_name(n).is_none())
    {
        let known: Vec<&str> = AnalyzerKind::ALL.iter().map(|k| k.name()).collect();
        return Err(format!(
            "Unknown analyzer '{name}' in --disable (known: {})",
            known.join(", ")
        )
        .into());
    }
    if let Some(model) = &cli.model {
        if !model.exists() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    Ok(())
}

fn format_text(input: &Path, result: &DetectionResult) -> String {
    let mut lines = vec![format!(
        "{}: {} (confidence {:.3}, {:.2}s)",
        input.display(),
        result.verdict,
        result.confidence,
        result.processing_time_seconds
    )];

    if let Some(error) = &result.error {
        lines.push(format!("  error: {error}"));
        return lines.join("\n");
    }

    for (name, score) in &result.scores {
        match result.failures.get(name) {
            Some(reason) => lines.push(format!("  {name:10} {score:.3}  (failed: {reason})")),
            None => lines.push(format!("  {name:10} {score:.3}")),
        }
    }
    for anomaly in &result.anomalies {
        lines.push(format!(
            "  [{}] frame {} @ {:.2}s: {}",
            anomaly.severity, anomaly.frame_index, anomaly.timestamp, anomaly.description
        ));
    }
    lines.join("\n")
}
