use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};
use crate::export::{objects_in_scope, ExportRequest, ExportedArtifact, SceneExporter};
use crate::scene_graph::Scene;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExport {
    pub request: ExportRequest,
    pub object_names: Vec<String>,
}

/// Records what would be exported without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryExporter {
    pub exports: Vec<RecordedExport>,
    failing: HashSet<PathBuf>,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every export to `path` fail, after recording the attempt.
    pub fn fail_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.insert(path.into());
        self
    }
}

impl SceneExporter for MemoryExporter {
    fn export(&mut self, scene: &Scene, request: &ExportRequest) -> Result<ExportedArtifact> {
        let object_names = objects_in_scope(scene, request.flags.scope)?
            .into_iter()
            .map(|id| Ok(scene.object(id)?.name.clone()))
            .collect::<Result<Vec<_>>>()?;
        let object_count = object_names.len();

        self.exports.push(RecordedExport {
            request: request.clone(),
            object_names,
        });

        if self.failing.contains(&request.path) {
            return Err(PipelineError::host_failed(
                format!("export {}", request.path.display()),
                "exporter rejected the request",
            ));
        }

        log::info!(
            "Dry run: would write {} objects to {}",
            object_count,
            request.path.display()
        );

        Ok(ExportedArtifact {
            path: request.path.clone(),
            object_count,
        })
    }
}
