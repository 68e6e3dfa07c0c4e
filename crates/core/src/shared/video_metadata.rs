use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// Stream-level properties reported when a frame source is opened.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

/// Container-level properties, probed independently of frame decoding.
///
/// Every field is optional in practice: a still image has no duration or
/// bit rate, and many muxers omit tags entirely.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ContainerMetadata {
    pub format_name: String,
    pub duration_seconds: Option<f64>,
    pub bit_rate: Option<u64>,
    pub file_size_bytes: Option<u64>,
    pub stream_count: usize,
    pub tags: BTreeMap<String, String>,
}

impl ContainerMetadata {
    /// Fallback used when probing fails: only what the file system knows.
    pub fn from_file_system(path: &std::path::Path) -> Self {
        Self {
            file_size_bytes: std::fs::metadata(path).ok().map(|m| m.len()),
            ..Self::default()
        }
    }

    /// Case-insensitive tag lookup.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
