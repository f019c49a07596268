//! Turns an authored level scene into runtime assets: spatial chunk exports,
//! spawn point markers, instance metadata sync and a clean whole-level export.

pub mod asset_pipeline;
pub mod config;
pub mod error;
pub mod export;
pub mod scene_graph;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
