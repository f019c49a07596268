pub mod chunking;
pub mod level_export;
pub mod property_sync;
pub mod registry;
pub mod spawn_points;
pub mod visibility;

pub use chunking::{ChunkExportReport, ChunkExporter, ChunkFailurePolicy, ChunkKey};
pub use level_export::{ExportStatus, LevelExporter};
pub use property_sync::{sync_instance_properties, SyncReport};
pub use registry::{RoutineRegistry, SceneRoutine};
pub use spawn_points::{SpawnPointDeriver, SpawnReport};
pub use visibility::VisibilityToggler;
