use std::collections::HashMap;

use crate::scene_graph::{CollectionId, Scene};

/// Toggles view layer exclusion for collections by name prefix and remembers the
/// flags it overwrote, so `restore` undoes `exclude` exactly.
#[derive(Debug, Default)]
pub struct VisibilityToggler {
    saved: HashMap<CollectionId, bool>,
}

impl VisibilityToggler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes every collection whose name starts with `tag`. Returns the number
    /// of layer nodes touched.
    pub fn exclude(&mut self, scene: &mut Scene, tag: &str) -> usize {
        let mut touched = 0;

        for (id, name) in matching_collections(scene, tag) {
            let Some(node) = scene.view_layer_mut().find_mut(&name) else {
                log::debug!("Collection '{}' has no view layer node", name);
                continue;
            };
            self.saved.entry(id).or_insert(node.exclude);
            node.exclude = true;
            touched += 1;
        }

        touched
    }

    /// Puts back the flags saved by `exclude`; collections never excluded through
    /// this toggler are included.
    pub fn restore(&mut self, scene: &mut Scene, tag: &str) -> usize {
        let mut touched = 0;

        for (id, name) in matching_collections(scene, tag) {
            let previous = self.saved.remove(&id).unwrap_or(false);
            let Some(node) = scene.view_layer_mut().find_mut(&name) else {
                continue;
            };
            node.exclude = previous;
            touched += 1;
        }

        touched
    }
}

fn matching_collections(scene: &Scene, tag: &str) -> Vec<(CollectionId, String)> {
    scene
        .collections()
        .filter(|(_, collection)| collection.name.starts_with(tag))
        .map(|(id, collection)| (id, collection.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        let mut scene = Scene::new("level");
        let root = scene.root_collection();
        for name in ["visProps", "visEnemies", "terrain", "VISloud"] {
            let id = scene.new_collection(name);
            scene.link_collection(root, id).unwrap();
        }
        // Not linked under the root, so it has no layer node.
        scene.new_collection("visOrphan");
        scene
    }

    fn excluded(scene: &Scene) -> Vec<String> {
        ["visProps", "visEnemies", "terrain", "VISloud"]
            .into_iter()
            .filter(|name| scene.view_layer().find(name).unwrap().exclude)
            .map(String::from)
            .collect()
    }

    #[test]
    fn exclude_matches_prefix_case_sensitively() {
        let mut scene = scene();
        let mut toggler = VisibilityToggler::new();

        assert_eq!(toggler.exclude(&mut scene, "vis"), 2);
        assert_eq!(excluded(&scene), vec!["visProps", "visEnemies"]);
    }

    #[test]
    fn restore_is_the_inverse_of_exclude() {
        let mut scene = scene();
        scene.view_layer_mut().find_mut("visEnemies").unwrap().exclude = true;
        let before = excluded(&scene);

        let mut toggler = VisibilityToggler::new();
        toggler.exclude(&mut scene, "vis");
        toggler.restore(&mut scene, "vis");

        assert_eq!(excluded(&scene), before);
    }

    #[test]
    fn restore_without_exclude_includes() {
        let mut scene = scene();
        scene.view_layer_mut().find_mut("visProps").unwrap().exclude = true;

        VisibilityToggler::new().restore(&mut scene, "vis");
        assert!(excluded(&scene).is_empty());
    }
}
