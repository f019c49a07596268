use indexmap::IndexMap;

use crate::config::SpawnConfig;
use crate::error::Result;
use crate::scene_graph::naming::base_name;
use crate::scene_graph::{
    CollectionId, EmptyDisplay, EmptyDisplayType, Object3D, ObjectKind, PropertyValue, Scene,
};

pub const CATEGORY_KEY: &str = "category";
pub const BASE_NAME_KEY: &str = "baseName";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnReport {
    pub cleared: usize,
    pub created: usize,
    pub per_category: IndexMap<String, usize>,
}

impl SpawnReport {
    pub fn status_line(&self, container: &str) -> String {
        format!(
            "Cleared {} and created {} spawn points ({} removed)",
            container, self.created, self.cleared
        )
    }
}

/// Category of a marker collection: its name without the leading prefix, with the
/// remaining characters in their original case.
pub fn category_for(collection_name: &str, prefix_len: usize) -> &str {
    match collection_name.char_indices().nth(prefix_len) {
        Some((index, _)) => &collection_name[index..],
        None => "",
    }
}

fn has_prefix_ignore_case(name: &str, prefix: &str) -> bool {
    name.to_lowercase().starts_with(&prefix.to_lowercase())
}

pub struct SpawnPointDeriver {
    config: SpawnConfig,
}

impl SpawnPointDeriver {
    pub fn new(config: SpawnConfig) -> Self {
        Self { config }
    }

    /// Returns the container collection, creating and linking it under the root if needed.
    fn ensure_container(&self, scene: &mut Scene) -> Result<CollectionId> {
        if let Some(id) = scene.collection_by_name(&self.config.container_name) {
            return Ok(id);
        }

        let id = scene.new_collection(&self.config.container_name);
        let root = scene.root_collection();
        scene.link_collection(root, id)?;
        log::debug!("Created container collection '{}'", self.config.container_name);
        Ok(id)
    }

    fn clear_container(&self, scene: &mut Scene, container: CollectionId) -> Result<usize> {
        let stale = scene.collection(container)?.object_ids.clone();
        for &id in &stale {
            scene.remove_object(id)?;
        }
        Ok(stale.len())
    }

    /// Regenerates every spawn marker from scratch.
    pub fn generate(&self, scene: &mut Scene) -> Result<SpawnReport> {
        let container = self.ensure_container(scene)?;
        let mut report = SpawnReport {
            cleared: self.clear_container(scene, container)?,
            ..Default::default()
        };

        let prefix = &self.config.collection_prefix;
        let sources = scene
            .collections()
            .filter(|&(id, collection)| {
                id != container && has_prefix_ignore_case(&collection.name, prefix)
            })
            .map(|(id, collection)| (id, collection.name.clone()))
            .collect::<Vec<_>>();

        if sources.is_empty() {
            log::warn!("No collections starting with '{}' found", prefix);
            return Ok(report);
        }

        let prefix_len = prefix.chars().count();

        for (collection, collection_name) in sources {
            let category = category_for(&collection_name, prefix_len).to_string();
            let objects = scene.all_objects_in(collection)?;
            log::debug!(
                "Found {} objects in collection '{}' (category '{}')",
                objects.len(),
                collection_name,
                category
            );

            for id in objects {
                let source = scene.object(id)?;
                if !source.is_collection_instance() {
                    continue;
                }

                let mut marker = Object3D::new(
                    format!("{}{}", self.config.marker_name_prefix, source.name),
                    ObjectKind::Empty,
                )
                .with_transform(source.transform);
                marker.empty_display = Some(EmptyDisplay {
                    display_type: EmptyDisplayType::Arrows,
                    size: self.config.marker_display_size,
                });

                for (key, value) in source.properties.user_entries() {
                    marker.properties.insert(key, value.clone());
                }
                marker
                    .properties
                    .insert(CATEGORY_KEY, PropertyValue::from(category.as_str()));
                marker
                    .properties
                    .insert(BASE_NAME_KEY, PropertyValue::from(base_name(&source.name)));

                let marker = scene.add_object(marker);
                scene.link_object(container, marker)?;

                report.created += 1;
                *report.per_category.entry(category.clone()).or_default() += 1;
            }
        }

        log::info!("{}", report.status_line(&self.config.container_name));

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene_graph::{Transform, RESERVED_KEY};

    struct Level {
        scene: Scene,
        shack: CollectionId,
        props: CollectionId,
    }

    fn level() -> Level {
        let mut scene = Scene::new("forest");
        let root = scene.root_collection();

        let shack = scene.new_collection("shack");
        let props = scene.new_collection("visProps");
        let nested = scene.new_collection("props_nested");
        scene.link_collection(root, props).unwrap();
        scene.link_collection(props, nested).unwrap();

        for (name, x, target) in [("shack", 1.0, props), ("shack", 2.0, nested)] {
            let mut instance = Object3D::empty(name)
                .with_transform(Transform::from_translation(Vec3::X * x))
                .with_instance(shack);
            instance.properties.insert("loot", "rare");
            instance.properties.insert(RESERVED_KEY, "ui");
            let id = scene.add_object(instance);
            scene.link_object(target, id).unwrap();
        }

        // A plain empty and a mesh never produce markers.
        let plain = scene.add_object(Object3D::empty("waypoint"));
        scene.link_object(props, plain).unwrap();
        let mesh = scene.add_object(Object3D::new("rock", ObjectKind::Mesh).with_instance(shack));
        scene.link_object(props, mesh).unwrap();

        Level {
            scene,
            shack,
            props,
        }
    }

    fn markers(scene: &Scene) -> Vec<(String, String, String, Vec3)> {
        let container = scene.collection_by_name("SPAWN_POINTS").unwrap();
        scene
            .collection(container)
            .unwrap()
            .object_ids
            .iter()
            .map(|&id| {
                let object = scene.object(id).unwrap();
                let text = |key: &str| object.properties.get(key).unwrap().to_string();
                (
                    object.name.clone(),
                    text(CATEGORY_KEY),
                    text(BASE_NAME_KEY),
                    object.transform.translation(),
                )
            })
            .collect()
    }

    #[test]
    fn category_strips_prefix_by_length() {
        assert_eq!(category_for("visProps", 3), "Props");
        assert_eq!(category_for("VISProps", 3), "Props");
        assert_eq!(category_for("vis", 3), "");
        assert_eq!(category_for("vi", 3), "");
    }

    #[test]
    fn derives_markers_for_instances_only() {
        let Level { mut scene, .. } = level();
        let deriver = SpawnPointDeriver::new(SpawnConfig::default());

        let report = deriver.generate(&mut scene).unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.per_category.get("Props"), Some(&2));
        let markers = markers(&scene);
        assert_eq!(
            markers,
            vec![
                ("s_shack".into(), "\"Props\"".into(), "\"shack\"".into(), Vec3::X),
                ("s_shack.001".into(), "\"Props\"".into(), "\"shack\"".into(), Vec3::X * 2.0),
            ]
        );

        let container = scene.collection_by_name("SPAWN_POINTS").unwrap();
        let first = scene.collection(container).unwrap().object_ids[0];
        let marker = scene.object(first).unwrap();
        assert_eq!(marker.kind, ObjectKind::Empty);
        assert!(marker.instance_collection.is_none());
        assert!(!marker.properties.contains_key(RESERVED_KEY));
        assert_eq!(
            marker.properties.get("loot"),
            Some(&PropertyValue::from("rare"))
        );
        assert_eq!(
            marker.empty_display.map(|display| display.display_type),
            Some(EmptyDisplayType::Arrows)
        );
    }

    #[test]
    fn regeneration_is_idempotent_and_clears_stale_markers() {
        let Level { mut scene, props, .. } = level();
        let deriver = SpawnPointDeriver::new(SpawnConfig::default());

        let first = deriver.generate(&mut scene).unwrap();
        let first_markers = markers(&scene);
        let second = deriver.generate(&mut scene).unwrap();

        assert_eq!(first.created, second.created);
        assert_eq!(second.cleared, 2);
        assert_eq!(markers(&scene), first_markers);

        // Remove one instance: its marker must not survive the next run.
        let instance = scene.collection(props).unwrap().object_ids[0];
        scene.remove_object(instance).unwrap();
        let third = deriver.generate(&mut scene).unwrap();
        assert_eq!(third.created, 1);
        assert_eq!(markers(&scene).len(), 1);
    }

    #[test]
    fn case_insensitive_prefix_and_multi_linkage() {
        let Level {
            mut scene, shack, ..
        } = level();
        let root = scene.root_collection();
        let loud = scene.new_collection("VISEnemies");
        scene.link_collection(root, loud).unwrap();
        let orc = scene.add_object(Object3D::empty("orc.004").with_instance(shack));
        scene.link_object(loud, orc).unwrap();
        // Linked into two matching collections: processed once per linkage.
        let props = scene.collection_by_name("visProps").unwrap();
        scene.link_object(props, orc).unwrap();

        let report = SpawnPointDeriver::new(SpawnConfig::default())
            .generate(&mut scene)
            .unwrap();

        assert_eq!(report.created, 4);
        assert_eq!(report.per_category.get("Enemies"), Some(&1));
        assert_eq!(report.per_category.get("Props"), Some(&3));
        assert!(markers(&scene)
            .iter()
            .any(|(_, category, base, _)| category == "\"Enemies\"" && base == "\"orc\""));
    }

    #[test]
    fn no_matching_collections_creates_nothing() {
        let mut scene = Scene::new("empty");
        let report = SpawnPointDeriver::new(SpawnConfig::default())
            .generate(&mut scene)
            .unwrap();

        assert_eq!(report.created, 0);
        assert!(scene.collection_by_name("SPAWN_POINTS").is_some());
    }
}
