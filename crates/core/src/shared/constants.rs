/// Score recorded for an analyzer that failed, panicked or timed out.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Confidence strictly below this is classified as fake.
pub const FAKE_BELOW: f64 = 0.4;

/// Confidence strictly above this is classified as real.
pub const REAL_ABOVE: f64 = 0.6;

pub const DEFAULT_FRAME_SKIP: usize = 10;
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Frames fed to the ONNX model per run, spread evenly over the sample.
pub const DEFAULT_MODEL_MAX_FRAMES: usize = 16;

/// Fallback model input resolution when the model doesn't specify dimensions.
pub const DEFAULT_MODEL_INPUT_SIZE: u32 = 224;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const CONFIG_DIR_NAME: &str = "deepscan";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Built-in analyzers enabled by default: `(name, weight, threshold)`.
pub const DEFAULT_ANALYZERS: &[(&str, f64, f64)] = &[
    ("facial", 1.0, 0.5),
    ("temporal", 1.0, 0.5),
    ("metadata", 0.5, 0.4),
    ("lighting", 0.8, 0.5),
    ("geometry", 0.8, 0.5),
    ("model", 1.0, 0.5),
];
