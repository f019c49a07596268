use std::fmt;
use std::path::PathBuf;

use glam::Vec3;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::export::{ExportFlags, ExportRequest, ExportedArtifact, SceneExporter, EXPORT_EXTENSION};
use crate::scene_graph::{CollectionId, ObjectId, Scene};

/// Grid cell of the XY plane; Z is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: i32,
    pub y: i32,
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk_{}_{}", self.x, self.y)
    }
}

/// Cell containing `position`. Positions whose cell does not fit the `i32` grid
/// (including non-finite ones) are rejected instead of being clamped onto the edge.
pub fn chunk_key(position: Vec3, size: f32) -> Result<ChunkKey> {
    let cell = |coord: f32| {
        let cell = (coord / size).floor();
        // i32::MIN is exactly representable; i32::MAX rounds up to 2^31.
        if cell >= i32::MIN as f32 && cell < i32::MAX as f32 {
            Some(cell as i32)
        } else {
            None
        }
    };

    match (cell(position.x), cell(position.y)) {
        (Some(x), Some(y)) => Ok(ChunkKey { x, y }),
        _ => Err(PipelineError::OffGrid(position)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub key: ChunkKey,
    pub objects: Vec<ObjectId>,
}

fn validate_chunk_size(size: f32) -> Result<()> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(PipelineError::InvalidChunkSize(size))
    }
}

/// Groups objects by the cell of their world-space position. Chunks come out in
/// the order their key was first seen; every object lands in exactly one chunk.
pub fn partition(scene: &Scene, objects: &[ObjectId], size: f32) -> Result<Vec<Chunk>> {
    validate_chunk_size(size)?;

    let mut groups: IndexMap<ChunkKey, Vec<ObjectId>> = IndexMap::new();
    for &id in objects {
        let position = scene.world_matrix(id)?.w_axis.truncate();
        let key = chunk_key(position, size)?;
        groups.entry(key).or_default().push(id);
    }

    Ok(groups
        .into_iter()
        .map(|(key, objects)| Chunk { key, objects })
        .collect())
}

/// Visible mesh and empty objects.
pub fn exportable_objects(scene: &Scene) -> Result<Vec<ObjectId>> {
    Ok(scene
        .visible_objects()?
        .into_iter()
        .filter(|&id| {
            scene
                .get_object(id)
                .is_some_and(|object| object.kind.is_exportable())
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkFailurePolicy {
    /// Record the failure and export the remaining chunks.
    #[default]
    Continue,
    /// Stop at the first failed chunk and return its error.
    Abort,
}

#[derive(Debug, Default)]
pub struct ChunkExportReport {
    pub exported: Vec<ExportedArtifact>,
    pub failed: Vec<(ChunkKey, PipelineError)>,
}

impl ChunkExportReport {
    pub fn status_line(&self) -> String {
        if self.failed.is_empty() {
            format!("Exported {} chunks", self.exported.len())
        } else {
            format!(
                "Exported {} chunks, {} failed: {}",
                self.exported.len(),
                self.failed.len(),
                self.failed.iter().map(|(key, _)| key).join(", ")
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkExporter {
    pub chunk_size: f32,
    pub out_dir: PathBuf,
    pub policy: ChunkFailurePolicy,
}

impl ChunkExporter {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            out_dir: config.chunk_dir.clone(),
            policy: config.chunk_failure_policy,
        }
    }

    pub fn chunk_path(&self, key: ChunkKey) -> PathBuf {
        self.out_dir.join(format!("{}.{}", key, EXPORT_EXTENSION))
    }

    /// Exports one artifact per chunk. Each chunk's objects are temporarily moved
    /// into a staging collection and selected; their memberships are restored
    /// whether or not the export succeeds.
    pub fn export_all(
        &self,
        scene: &mut Scene,
        exporter: &mut dyn SceneExporter,
    ) -> Result<ChunkExportReport> {
        let objects = exportable_objects(scene)?;
        let chunks = partition(scene, &objects, self.chunk_size)?;
        log::info!(
            "Partitioned {} objects into {} chunks of size {}",
            objects.len(),
            chunks.len(),
            self.chunk_size
        );

        let mut report = ChunkExportReport::default();

        for chunk in chunks {
            let request = ExportRequest {
                path: self.chunk_path(chunk.key),
                flags: ExportFlags::selection(),
            };

            let result = StagingArea::stage(scene, &chunk.key.to_string(), &chunk.objects)
                .and_then(|staging| exporter.export(staging.scene(), &request));

            match result {
                Ok(artifact) => {
                    log::info!("Exported {} to {}", chunk.key, artifact.path.display());
                    report.exported.push(artifact);
                }
                Err(e) => match self.policy {
                    ChunkFailurePolicy::Continue => {
                        log::warn!("Failed to export {}: {}", chunk.key, e);
                        report.failed.push((chunk.key, e));
                    }
                    ChunkFailurePolicy::Abort => {
                        log::error!("Aborting chunk export at {}: {}", chunk.key, e);
                        return Err(e);
                    }
                },
            }
        }

        Ok(report)
    }
}

/// Scoped regrouping of objects into a temporary collection. Dropping it puts
/// every membership, the selection and the active object back as they were.
struct StagingArea<'a> {
    scene: &'a mut Scene,
    collection: CollectionId,
    memberships: Vec<(CollectionId, Vec<ObjectId>)>,
    selection: Vec<ObjectId>,
    active: Option<ObjectId>,
}

impl<'a> StagingArea<'a> {
    fn stage(scene: &'a mut Scene, name: &str, objects: &[ObjectId]) -> Result<Self> {
        let mut owners: Vec<CollectionId> = Vec::new();
        for &id in objects {
            for collection in scene.users_collection(id) {
                if !owners.contains(&collection) {
                    owners.push(collection);
                }
            }
        }
        let memberships = owners
            .iter()
            .map(|&id| Ok((id, scene.collection(id)?.object_ids.clone())))
            .collect::<Result<Vec<_>>>()?;

        let selection = scene.selected_objects();
        let active = scene.active_object();
        let collection = scene.new_collection(name);

        // From here on any early return restores through Drop.
        let area = StagingArea {
            scene,
            collection,
            memberships,
            selection,
            active,
        };

        let root = area.scene.root_collection();
        area.scene.link_collection(root, collection)?;

        for &id in objects {
            area.scene.link_object(collection, id)?;
            for &owner in &owners {
                area.scene.unlink_object(owner, id)?;
            }
        }

        area.scene.select_all(false);
        for &id in objects {
            area.scene.object_mut(id)?.selected = true;
        }
        area.scene.set_active_object(objects.last().copied());

        Ok(area)
    }

    fn scene(&self) -> &Scene {
        &*self.scene
    }
}

impl Drop for StagingArea<'_> {
    fn drop(&mut self) {
        for (collection, objects) in self.memberships.drain(..) {
            if let Some(collection) = self.scene.get_collection_mut(collection) {
                collection.object_ids = objects;
            }
        }

        if let Err(e) = self.scene.remove_collection(self.collection) {
            log::error!("Failed to remove staging collection: {}", e);
        }

        self.scene.select_all(false);
        for &id in &self.selection {
            if let Some(object) = self.scene.get_object_mut(id) {
                object.selected = true;
            }
        }
        self.scene.set_active_object(self.active);
    }
}
