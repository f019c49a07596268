use std::borrow::Cow;
use std::collections::HashMap;

use gltf::json;
use serde_json::value::RawValue;

use crate::error::{PipelineError, Result};
use crate::export::{objects_in_scope, ExportRequest, ExportedArtifact, SceneExporter};
use crate::scene_graph::{ObjectId, Scene, Transform};

const GLB_HEADER_LENGTH: usize = 12;
const GLB_CHUNK_HEADER_LENGTH: usize = 8;

/// Writes exported objects as glTF nodes into a binary `.glb` container.
#[derive(Debug, Default)]
pub struct GlbExporter {
    pub generator: Option<String>,
}

impl GlbExporter {
    pub fn new() -> Self {
        Self {
            generator: Some(format!("levelbake {}", env!("CARGO_PKG_VERSION"))),
        }
    }

    fn build_document(&self, scene: &Scene, request: &ExportRequest) -> Result<json::Root> {
        let objects = objects_in_scope(scene, request.flags.scope)?;
        let node_index: HashMap<ObjectId, u32> = objects
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index as u32))
            .collect();

        let keep_hierarchy = !request.flags.apply_transforms;
        let exported_parent = |id: ObjectId| -> Result<Option<ObjectId>> {
            let parent = scene.object(id)?.parent_id;
            Ok(parent.filter(|parent| keep_hierarchy && node_index.contains_key(parent)))
        };

        let mut root = json::Root::default();
        root.asset.generator = self.generator.clone();

        let mut scene_nodes = Vec::new();

        for &id in &objects {
            let object = scene.object(id)?;

            let transform = if exported_parent(id)?.is_some() {
                object.transform
            } else {
                Transform::from_matrix(scene.world_matrix(id)?)
            };

            let children = if keep_hierarchy {
                object
                    .child_ids
                    .iter()
                    .filter_map(|child| node_index.get(child))
                    .map(|&index| json::Index::new(index))
                    .collect::<Vec<_>>()
            } else {
                Vec::new()
            };

            let has_extras =
                request.flags.extras && object.properties.user_entries().next().is_some();
            let extras = if has_extras {
                let text = object.properties.to_json().to_string();
                Some(RawValue::from_string(text).map_err(|e| {
                    PipelineError::host_failed(format!("encode extras of '{}'", object.name), e)
                })?)
            } else {
                None
            };

            let node = root.push(json::Node {
                name: Some(object.name.clone()),
                translation: Some(transform.translation().to_array()),
                rotation: Some(json::scene::UnitQuaternion(transform.rotation().to_array())),
                scale: Some(transform.scale().to_array()),
                children: (!children.is_empty()).then_some(children),
                extras,
                ..Default::default()
            });

            if exported_parent(id)?.is_none() {
                scene_nodes.push(node);
            }
        }

        let scene_index = root.push(json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(scene.name.clone()),
            nodes: scene_nodes,
        });
        root.scene = Some(scene_index);

        Ok(root)
    }
}

impl SceneExporter for GlbExporter {
    fn export(&mut self, scene: &Scene, request: &ExportRequest) -> Result<ExportedArtifact> {
        let operation = format!("export {}", request.path.display());
        let document = self.build_document(scene, request)?;
        let object_count = document.nodes.len();

        let mut json_bytes = serde_json::to_vec(&document)
            .map_err(|e| PipelineError::host_failed(operation.clone(), e))?;
        // JSON chunk must be padded with spaces to a 4-byte boundary.
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(b' ');
        }

        let length = GLB_HEADER_LENGTH + GLB_CHUNK_HEADER_LENGTH + json_bytes.len();
        let glb = gltf::binary::Glb {
            header: gltf::binary::Header {
                magic: *b"glTF",
                version: 2,
                length: length as u32,
            },
            json: Cow::Owned(json_bytes),
            bin: None,
        };

        let mut bytes = Vec::with_capacity(length);
        glb.to_writer(&mut bytes)
            .map_err(|e| PipelineError::host_failed(operation.clone(), e))?;

        if let Some(parent) = request.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PipelineError::host_failed(operation.clone(), e))?;
            }
        }
        std::fs::write(&request.path, bytes)
            .map_err(|e| PipelineError::host_failed(operation, e))?;

        log::debug!(
            "Wrote {} nodes to {}",
            object_count,
            request.path.display()
        );

        Ok(ExportedArtifact {
            path: request.path.clone(),
            object_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::export::ExportFlags;
    use crate::scene_graph::{Object3D, ObjectKind};

    #[test]
    fn selection_document_keeps_parenting_and_extras() {
        let mut scene = Scene::new("level");
        let root = scene.root_collection();
        let mut house = Object3D::new("house", ObjectKind::Mesh)
            .with_transform(Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        house.properties.insert("door", "north");
        let house = scene.add_object(house);
        let roof = scene.add_object(
            Object3D::new("roof", ObjectKind::Mesh)
                .with_transform(Transform::from_translation(Vec3::Z * 3.0)),
        );
        scene.link_object(root, house).unwrap();
        scene.link_object(root, roof).unwrap();
        scene.set_object_parent(roof, Some(house)).unwrap();
        scene.select_all(true);

        let request = ExportRequest {
            path: "unused.glb".into(),
            flags: ExportFlags {
                extras: true,
                ..ExportFlags::selection()
            },
        };
        let document = GlbExporter::new().build_document(&scene, &request).unwrap();

        assert_eq!(document.nodes.len(), 2);
        assert_eq!(document.scenes[0].nodes.len(), 1);
        assert_eq!(document.nodes[0].children.as_ref().unwrap().len(), 1);
        assert_eq!(document.nodes[1].translation, Some([0.0, 0.0, 3.0]));
        assert_eq!(
            document.nodes[0].extras.as_ref().unwrap().get(),
            r#"{"door":"north"}"#
        );
        assert!(document.nodes[1].extras.is_none());
    }

    #[test]
    fn applied_transforms_flatten_to_world_space() {
        let mut scene = Scene::new("level");
        let root = scene.root_collection();
        let parent = scene.add_object(
            Object3D::empty("parent").with_transform(Transform::from_translation(Vec3::X)),
        );
        let child = scene.add_object(
            Object3D::empty("child").with_transform(Transform::from_translation(Vec3::Y)),
        );
        scene.link_object(root, parent).unwrap();
        scene.link_object(root, child).unwrap();
        scene.set_object_parent(child, Some(parent)).unwrap();

        let request = ExportRequest {
            path: "unused.glb".into(),
            flags: ExportFlags::visible_level(),
        };
        let document = GlbExporter::new().build_document(&scene, &request).unwrap();

        assert_eq!(document.scenes[0].nodes.len(), 2);
        assert!(document.nodes[0].children.is_none());
        let translation = Vec3::from_array(document.nodes[1].translation.unwrap());
        assert!(translation.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
    }
}
