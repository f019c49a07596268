use std::path::PathBuf;

use crate::error::Result;
use crate::scene_graph::{ObjectId, Scene};

pub mod glb;
pub mod memory;

pub use glb::GlbExporter;
pub use memory::MemoryExporter;

pub const EXPORT_EXTENSION: &str = "glb";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    /// Only the currently selected objects.
    Selection,
    /// Every object visible in the view layer.
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFlags {
    pub apply_transforms: bool,
    pub animations: bool,
    pub extras: bool,
    pub scope: ExportScope,
}

impl ExportFlags {
    pub fn selection() -> Self {
        Self {
            apply_transforms: false,
            animations: false,
            extras: false,
            scope: ExportScope::Selection,
        }
    }

    pub fn visible_level() -> Self {
        Self {
            apply_transforms: true,
            animations: true,
            extras: true,
            scope: ExportScope::Visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub path: PathBuf,
    pub flags: ExportFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedArtifact {
    pub path: PathBuf,
    pub object_count: usize,
}

pub trait SceneExporter {
    fn export(&mut self, scene: &Scene, request: &ExportRequest) -> Result<ExportedArtifact>;
}

/// Objects an export request covers, in scene order.
pub fn objects_in_scope(scene: &Scene, scope: ExportScope) -> Result<Vec<ObjectId>> {
    match scope {
        ExportScope::Selection => {
            let selected = scene.selected_objects();
            Ok(scene
                .objects()?
                .into_iter()
                .filter(|id| selected.contains(id))
                .collect())
        }
        ExportScope::Visible => scene.visible_objects(),
    }
}
