use crate::error::Result;
use crate::scene_graph::Scene;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub instances: usize,
    pub added: usize,
    pub removed: usize,
}

/// Makes every collection instance carry exactly its source collection's custom
/// keys. Missing keys are copied over, stale keys are dropped, and values of keys
/// present on both sides are left as they are.
pub fn sync_instance_properties(scene: &mut Scene) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for id in scene.objects()? {
        let object = scene.object(id)?;
        let Some(source) = object.instance_collection.filter(|_| object.is_collection_instance())
        else {
            continue;
        };
        let Some(source) = scene.get_collection(source) else {
            log::warn!("Instance '{}' points at a removed collection", object.name);
            continue;
        };

        let source_props = source.properties.clone();
        let object = scene.object_mut(id)?;

        let missing = source_props
            .user_entries()
            .filter(|(key, _)| !object.properties.contains_key(key))
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect::<Vec<_>>();
        let stale = object
            .properties
            .user_keys()
            .filter(|key| !source_props.contains_key(key))
            .map(String::from)
            .collect::<Vec<_>>();

        for (key, value) in missing {
            log::debug!("{}: adding '{}'", object.name, key);
            object.properties.insert(key, value);
            report.added += 1;
        }
        for key in stale {
            log::debug!("{}: removing '{}'", object.name, key);
            object.properties.remove(&key);
            report.removed += 1;
        }

        report.instances += 1;
    }

    log::info!(
        "Synced custom properties on {} instances ({} added, {} removed)",
        report.instances,
        report.added,
        report.removed
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::{Object3D, ObjectKind, PropertyValue, RESERVED_KEY};

    fn keys(scene: &Scene, name: &str) -> Vec<String> {
        let id = scene.object_by_name(name).unwrap();
        scene
            .object(id)
            .unwrap()
            .properties
            .user_keys()
            .map(String::from)
            .collect()
    }

    fn scene() -> Scene {
        let mut scene = Scene::new("level");
        let root = scene.root_collection();
        let tree = scene.new_collection("tree");
        {
            let props = &mut scene.collection_mut(tree).unwrap().properties;
            props.insert("species", "oak");
            props.insert("height", 12.5);
            props.insert(RESERVED_KEY, "ui");
        }

        let mut instance = Object3D::empty("tree.001").with_instance(tree);
        instance.properties.insert("species", "birch");
        instance.properties.insert("obsolete", true);
        instance.properties.insert(RESERVED_KEY, "keep me");
        let instance = scene.add_object(instance);
        scene.link_object(root, instance).unwrap();

        let mut plain = Object3D::new("ground", ObjectKind::Mesh);
        plain.properties.insert("friction", 0.8);
        let plain = scene.add_object(plain);
        scene.link_object(root, plain).unwrap();

        scene
    }

    #[test]
    fn adds_missing_removes_stale_and_keeps_drift() {
        let mut scene = scene();
        let report = sync_instance_properties(&mut scene).unwrap();

        assert_eq!(
            report,
            SyncReport {
                instances: 1,
                added: 1,
                removed: 1
            }
        );
        assert_eq!(keys(&scene, "tree.001"), vec!["species", "height"]);

        let id = scene.object_by_name("tree.001").unwrap();
        let props = &scene.object(id).unwrap().properties;
        assert_eq!(props.get("species"), Some(&PropertyValue::from("birch")));
        assert_eq!(props.get("height"), Some(&PropertyValue::Float(12.5)));
        assert_eq!(
            props.get(RESERVED_KEY),
            Some(&PropertyValue::from("keep me"))
        );

        assert_eq!(keys(&scene, "ground"), vec!["friction"]);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut scene = scene();
        sync_instance_properties(&mut scene).unwrap();
        let after_first = keys(&scene, "tree.001");

        let report = sync_instance_properties(&mut scene).unwrap();
        assert_eq!(report.added + report.removed, 0);
        assert_eq!(keys(&scene, "tree.001"), after_first);
    }
}
