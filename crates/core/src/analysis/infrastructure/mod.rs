pub mod analyzer_kind;
pub mod facial_analyzer;
pub mod geometry_analyzer;
pub mod lighting_analyzer;
mod luma;
pub mod metadata_analyzer;
pub mod model_analyzer;
pub mod temporal_analyzer;
#[cfg(test)]
pub(crate) mod test_support;
