//! Learned authenticity classifier backed by an optional ONNX model.
//!
//! Without a model the analyzer is a placeholder: any non-empty input scores
//! the configured neutral default. With a model it classifies up to
//! `max_frames` evenly spaced samples and averages the per-frame
//! authenticity probability.
use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use image::RgbImage;

use crate::analysis::domain::analyzer::{AnalysisContext, Analyzer, AnalyzerError};
use crate::analysis::domain::analyzer_result::{AnalyzerResult, FrameMarker};
use crate::shared::constants::{DEFAULT_MODEL_INPUT_SIZE, DEFAULT_MODEL_MAX_FRAMES, NEUTRAL_SCORE};
use crate::shared::frame::Frame;

pub const NAME: &str = "model";

const AUTHENTICITY: &str = "authenticity";
const FRAMES_SCORED: &str = "frames_scored";

pub struct ModelAnalyzer {
    /// Owned by this analyzer; `run` needs `&mut Session`, hence the lock.
    session: Option<Mutex<ort::session::Session>>,
    neutral_score: f64,
    max_frames: usize,
    input_size: u32,
}

impl ModelAnalyzer {
    /// Placeholder variant that reports `neutral_score` for any input.
    pub fn placeholder(neutral_score: f64) -> Self {
        Self {
            session: None,
            neutral_score,
            max_frames: DEFAULT_MODEL_MAX_FRAMES,
            input_size: DEFAULT_MODEL_INPUT_SIZE,
        }
    }

    /// Load an ONNX classifier.
    ///
    /// The input resolution is read from the model's input shape (expecting
    /// NCHW). Falls back to `DEFAULT_MODEL_INPUT_SIZE` if the shape is
    /// dynamic or unreadable.
    pub fn from_model(
        model_path: &Path,
        neutral_score: f64,
        max_frames: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_MODEL_INPUT_SIZE);

        log::info!(
            "Loaded authenticity model {} (input {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session: Some(Mutex::new(session)),
            neutral_score,
            max_frames: max_frames.max(1),
            input_size,
        })
    }

    fn classify(
        &self,
        session: &Mutex<ort::session::Session>,
        frame: &Frame,
    ) -> Result<f64, AnalyzerError> {
        let tensor = to_input_tensor(frame, self.input_size)?;
        let input_value = ort::value::Tensor::from_array(tensor)
            .map_err(|e| AnalyzerError::Model(e.to_string()))?;

        let mut session = session
            .lock()
            .map_err(|_| AnalyzerError::Model("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| AnalyzerError::Model(e.to_string()))?;
        if outputs.len() == 0 {
            return Err(AnalyzerError::Model("model produced no outputs".to_string()));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| AnalyzerError::Model(e.to_string()))?;
        let values: Vec<f64> = tensor.iter().map(|&v| v as f64).collect();
        authenticity_from_output(&values)
    }
}

impl Analyzer for ModelAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<AnalyzerResult, AnalyzerError> {
        if ctx.frames.is_empty() {
            return Ok(AnalyzerResult::zeroed(&[AUTHENTICITY, FRAMES_SCORED]));
        }

        let Some(session) = self.session.as_ref() else {
            return Ok(AnalyzerResult::new(
                [(AUTHENTICITY, self.neutral_score), (FRAMES_SCORED, 0.0)],
                self.neutral_score,
            ));
        };

        let picks = spread_indices(ctx.frames.len(), self.max_frames);
        let mut scores = Vec::with_capacity(picks.len());
        for &i in &picks {
            let frame = &ctx.frames[i];
            if frame.channels() != 3 {
                continue;
            }
            scores.push((i, self.classify(session, frame)?));
        }

        if scores.is_empty() {
            return Ok(AnalyzerResult::new(
                [(AUTHENTICITY, self.neutral_score), (FRAMES_SCORED, 0.0)],
                self.neutral_score,
            ));
        }

        let authenticity = scores.iter().map(|(_, s)| s).sum::<f64>() / scores.len() as f64;
        let peak = scores
            .iter()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|&(i, _)| FrameMarker {
                index: ctx.frames[i].index(),
                timestamp: ctx.frames[i].timestamp(),
            });
        let coverage = scores.len() as f64 / ctx.frames.len() as f64;

        Ok(AnalyzerResult::new(
            [(AUTHENTICITY, authenticity), (FRAMES_SCORED, coverage)],
            authenticity,
        )
        .with_peak(peak))
    }
}

impl Default for ModelAnalyzer {
    fn default() -> Self {
        Self::placeholder(NEUTRAL_SCORE)
    }
}

/// Up to `count` indices spread evenly over `0..len`, always including 0.
fn spread_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if len <= count {
        return (0..len).collect();
    }
    (0..count).map(|k| k * len / count).collect()
}

/// Interprets a classifier output as the probability the frame is authentic.
///
/// Two-class outputs are read as `[fake, real]`; a single value is read as
/// the real probability, passed through a sigmoid if it is a raw logit.
fn authenticity_from_output(values: &[f64]) -> Result<f64, AnalyzerError> {
    let value = match values {
        [] => return Err(AnalyzerError::Model("empty model output".to_string())),
        [single] => *single,
        [_, real, ..] => *real,
    };
    if !value.is_finite() {
        return Err(AnalyzerError::Model(format!("non-finite output {value}")));
    }
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Ok(1.0 / (1.0 + (-value).exp()))
    }
}

/// Resize to a square model input and lay out as normalized NCHW float32.
fn to_input_tensor(frame: &Frame, size: u32) -> Result<ndarray::Array4<f32>, AnalyzerError> {
    let image = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or_else(|| AnalyzerError::Failed("frame buffer does not match its size".into()))?;
    let resized = image::imageops::resize(&image, size, size, FilterType::Triangle);

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    Ok(tensor)
}
