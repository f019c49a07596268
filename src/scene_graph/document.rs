use std::collections::HashMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::scene_graph::collection::CollectionId;
use crate::scene_graph::object3d::{EmptyDisplay, Object3D, ObjectId, ObjectKind};
use crate::scene_graph::properties::Properties;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;

/// JSON description of a level scene, the CLI's stand-in for the authoring file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    pub name: String,
    #[serde(default)]
    pub collections: Vec<CollectionDocument>,
    #[serde(default)]
    pub objects: Vec<ObjectDocument>,
    /// Collections linked directly under the root collection.
    #[serde(default)]
    pub root_collections: Vec<String>,
    /// Objects linked directly into the root collection.
    #[serde(default)]
    pub root_objects: Vec<String>,
    /// Collections excluded from the view layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub name: String,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDocument {
    pub name: String,
    pub kind: ObjectKind,
    #[serde(default)]
    pub location: Vec3,
    /// XYZ euler angles in radians.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_display: Option<EmptyDisplay>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SceneDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn build_scene(&self) -> Result<Scene> {
        let mut scene = Scene::new(self.name.clone());
        let root = scene.root_collection();

        let mut collections: HashMap<&str, CollectionId> = HashMap::new();
        for doc in &self.collections {
            let id = scene.new_collection(&doc.name);
            scene.collection_mut(id)?.properties = doc.properties.clone();
            collections.entry(doc.name.as_str()).or_insert(id);
        }
        let collection_id = |name: &str| {
            collections
                .get(name)
                .copied()
                .ok_or_else(|| PipelineError::not_found("collection", name))
        };

        let mut objects: HashMap<&str, ObjectId> = HashMap::new();
        for doc in &self.objects {
            let mut object = Object3D::new(doc.name.clone(), doc.kind);
            object.transform = Transform::from_euler(doc.location, doc.rotation, doc.scale);
            object.hidden = doc.hidden;
            object.empty_display = doc.empty_display;
            object.properties = doc.properties.clone();
            if let Some(instance_of) = &doc.instance_of {
                object.instance_collection = Some(collection_id(instance_of)?);
            }
            let id = scene.add_object(object);
            objects.entry(doc.name.as_str()).or_insert(id);
        }
        let object_id = |name: &str| {
            objects
                .get(name)
                .copied()
                .ok_or_else(|| PipelineError::not_found("object", name))
        };

        for doc in &self.collections {
            let id = collection_id(&doc.name)?;
            for child in &doc.children {
                scene.link_collection(id, collection_id(child)?)?;
            }
            for object in &doc.objects {
                scene.link_object(id, object_id(object)?)?;
            }
        }

        for name in &self.root_collections {
            scene.link_collection(root, collection_id(name)?)?;
        }
        for name in &self.root_objects {
            scene.link_object(root, object_id(name)?)?;
        }

        for doc in &self.objects {
            if let Some(parent) = &doc.parent {
                scene.set_object_parent(object_id(&doc.name)?, Some(object_id(parent)?))?;
            }
        }

        for name in &self.excluded {
            match scene.view_layer_mut().find_mut(name) {
                Some(node) => node.exclude = true,
                None => log::warn!("Excluded collection '{}' is not in the view layer", name),
            }
        }

        Ok(scene)
    }

    pub fn from_scene(scene: &Scene) -> Result<Self> {
        let collection_name = |id: CollectionId| -> Result<String> {
            Ok(scene.collection(id)?.name.clone())
        };
        let object_name =
            |id: ObjectId| -> Result<String> { Ok(scene.object(id)?.name.clone()) };

        let collections = scene
            .collections()
            .map(|(_, collection)| {
                Ok(CollectionDocument {
                    name: collection.name.clone(),
                    children: collection
                        .child_ids
                        .iter()
                        .map(|&id| collection_name(id))
                        .collect::<Result<_>>()?,
                    objects: collection
                        .object_ids
                        .iter()
                        .map(|&id| object_name(id))
                        .collect::<Result<_>>()?,
                    properties: collection.properties.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let objects = scene
            .all_objects()
            .map(|(_, object)| {
                Ok(ObjectDocument {
                    name: object.name.clone(),
                    kind: object.kind,
                    location: object.transform.translation(),
                    rotation: object.transform.euler(),
                    scale: object.transform.scale(),
                    instance_of: object.instance_collection.map(collection_name).transpose()?,
                    parent: object.parent_id.map(object_name).transpose()?,
                    hidden: object.hidden,
                    empty_display: object.empty_display,
                    properties: object.properties.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let root = scene.collection(scene.root_collection())?;
        let mut excluded = Vec::new();
        let mut stack = vec![&scene.view_layer().root];
        while let Some(node) = stack.pop() {
            if node.exclude && !excluded.contains(&node.name) {
                excluded.push(node.name.clone());
            }
            stack.extend(node.children.iter().rev());
        }

        Ok(SceneDocument {
            name: scene.name.clone(),
            collections,
            objects,
            root_collections: root
                .child_ids
                .iter()
                .map(|&id| collection_name(id))
                .collect::<Result<_>>()?,
            root_objects: root
                .object_ids
                .iter()
                .map(|&id| object_name(id))
                .collect::<Result<_>>()?,
            excluded,
        })
    }
}
