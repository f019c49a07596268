use std::path::PathBuf;

use crate::asset_pipeline::chunking::ChunkFailurePolicy;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Edge length of one grid cell in world units.
    pub chunk_size: f32,
    pub chunk_dir: PathBuf,
    pub level_dir: PathBuf,
    pub chunk_failure_policy: ChunkFailurePolicy,
    pub spawn: SpawnConfig,
}

#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub container_name: String,
    /// Matched case-insensitively; stripped by length when deriving categories.
    pub collection_prefix: String,
    pub marker_name_prefix: String,
    pub marker_display_size: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10.0,
            chunk_dir: PathBuf::from("chunks"),
            level_dir: PathBuf::from("../../public"),
            chunk_failure_policy: ChunkFailurePolicy::Continue,
            spawn: SpawnConfig::default(),
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            container_name: "SPAWN_POINTS".to_string(),
            collection_prefix: "vis".to_string(),
            marker_name_prefix: "s_".to_string(),
            marker_display_size: 0.5,
        }
    }
}
