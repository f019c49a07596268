use std::path::{Path, PathBuf};

use crate::asset_pipeline::registry::{RoutineRegistry, GENERATE_SPAWN_POINTS};
use crate::asset_pipeline::visibility::VisibilityToggler;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export::{ExportFlags, ExportRequest, SceneExporter, EXPORT_EXTENSION};
use crate::scene_graph::Scene;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Exported { path: PathBuf, lines: Vec<String> },
    /// The spawn routine was missing, so nothing was written.
    Skipped { lines: Vec<String> },
    Failed { lines: Vec<String> },
}

impl ExportStatus {
    pub fn lines(&self) -> &[String] {
        match self {
            ExportStatus::Exported { lines, .. }
            | ExportStatus::Skipped { lines }
            | ExportStatus::Failed { lines } => lines,
        }
    }

    pub fn is_exported(&self) -> bool {
        matches!(self, ExportStatus::Exported { .. })
    }
}

/// Regenerates spawn points, then exports the whole level with the helper
/// collections excluded.
pub struct LevelExporter {
    pub out_dir: PathBuf,
    /// Prefix of helper collections hidden during the export.
    pub helper_prefix: String,
    /// Base name of the level artifact; the scene name is used when unset.
    pub level_name: Option<String>,
}

impl LevelExporter {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            out_dir: config.level_dir.clone(),
            helper_prefix: config.spawn.collection_prefix.clone(),
            level_name: None,
        }
    }

    /// Names the level artifact after the scene file it was loaded from.
    pub fn for_scene_file(config: &PipelineConfig, scene_file: &Path) -> Self {
        Self {
            level_name: scene_file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned()),
            ..Self::from_config(config)
        }
    }

    pub fn level_path(&self, scene: &Scene) -> PathBuf {
        let name = self.level_name.as_deref().unwrap_or(&scene.name);
        self.out_dir.join(format!("{}.{}", name, EXPORT_EXTENSION))
    }

    pub fn run(
        &self,
        scene: &mut Scene,
        registry: &RoutineRegistry,
        exporter: &mut dyn SceneExporter,
    ) -> Result<ExportStatus> {
        let mut lines = Vec::new();

        match registry.run(GENERATE_SPAWN_POINTS, scene) {
            Ok(status) => {
                log::info!("{}", status);
                lines.push(status);
            }
            Err(e) if e.is_not_found() => {
                // Stale markers must not reach the level file.
                let line = format!("Could not find routine '{}'", GENERATE_SPAWN_POINTS);
                log::warn!("{}", line);
                lines.push(line);
                return Ok(ExportStatus::Skipped { lines });
            }
            Err(e) => return Err(e),
        }

        let mut toggler = VisibilityToggler::new();
        let excluded = toggler.exclude(scene, &self.helper_prefix);
        log::debug!("Excluded {} helper collections", excluded);

        let request = ExportRequest {
            path: self.level_path(scene),
            flags: ExportFlags::visible_level(),
        };
        let result = exporter.export(scene, &request);

        toggler.restore(scene, &self.helper_prefix);

        let artifact = result?;
        let line = format!(
            "Exported clean level ({} objects): {}",
            artifact.object_count,
            artifact.path.display()
        );
        log::info!("{}", line);
        lines.push(line);

        Ok(ExportStatus::Exported {
            path: artifact.path,
            lines,
        })
    }

    /// Top-level boundary: failures are logged and reported, never propagated.
    pub fn run_guarded(
        &self,
        scene: &mut Scene,
        registry: &RoutineRegistry,
        exporter: &mut dyn SceneExporter,
    ) -> ExportStatus {
        match self.run(scene, registry, exporter) {
            Ok(status) => status,
            Err(e) => {
                let line = format!("Failed to export clean level: {}", e);
                log::error!("{}", line);
                ExportStatus::Failed { lines: vec![line] }
            }
        }
    }
}
