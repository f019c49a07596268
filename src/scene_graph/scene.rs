use std::collections::HashSet;

use glam::Mat4;
use id_arena::Arena;

use crate::error::{PipelineError, Result};
use crate::scene_graph::collection::{Collection, CollectionId};
use crate::scene_graph::naming::unique_name;
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::view_layer::{LayerCollection, ViewLayer};

pub const ROOT_COLLECTION_NAME: &str = "Scene Collection";
const VIEW_LAYER_NAME: &str = "ViewLayer";

/// In-memory level scene: objects and collections live in arenas, removal is
/// tracked separately so ids stay stable for the lifetime of the scene.
pub struct Scene {
    pub name: String,
    objects: Arena<Object3D>,
    collections: Arena<Collection>,
    removed_objects: HashSet<ObjectId>,
    removed_collections: HashSet<CollectionId>,
    root: CollectionId,
    view_layer: ViewLayer,
    active_object: Option<ObjectId>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        let mut collections = Arena::new();
        let root = collections.alloc(Collection::new(ROOT_COLLECTION_NAME));
        let view_layer = ViewLayer {
            name: VIEW_LAYER_NAME.to_string(),
            root: LayerCollection {
                name: ROOT_COLLECTION_NAME.to_string(),
                collection: root,
                exclude: false,
                children: Vec::new(),
            },
        };

        Self {
            name: name.into(),
            objects: Arena::new(),
            collections,
            removed_objects: HashSet::new(),
            removed_collections: HashSet::new(),
            root,
            view_layer,
            active_object: None,
        }
    }

    pub fn root_collection(&self) -> CollectionId {
        self.root
    }

    // ---------- Objects ----------

    /// Adds an unlinked object; a taken name gets a `.NNN` suffix.
    pub fn add_object(&mut self, mut object: Object3D) -> ObjectId {
        object.name = unique_name(&object.name, |name| self.object_by_name(name).is_some());
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        if self.removed_objects.contains(&id) {
            return None;
        }
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        if self.removed_objects.contains(&id) {
            return None;
        }
        self.objects.get_mut(id)
    }

    pub fn object(&self, id: ObjectId) -> Result<&Object3D> {
        self.get_object(id).ok_or(PipelineError::StaleId("object"))
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object3D> {
        self.get_object_mut(id).ok_or(PipelineError::StaleId("object"))
    }

    pub fn object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.all_objects()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    /// Every live object, linked or not, in creation order.
    pub fn all_objects(&self) -> impl Iterator<Item = (ObjectId, &Object3D)> {
        self.objects
            .iter()
            .filter(move |(id, _)| !self.removed_objects.contains(id))
    }

    /// Removes the object from the scene and from every collection it is linked into.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<()> {
        let object = self.object(id)?;
        let parent_id = object.parent_id;
        let child_ids = object.child_ids.clone();

        for (_, collection) in self.collections.iter_mut() {
            collection.object_ids.retain(|&object_id| object_id != id);
        }

        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.objects.get_mut(parent_id) {
                parent.child_ids.retain(|&child| child != id);
            }
        }

        for child_id in child_ids {
            if let Some(child) = self.objects.get_mut(child_id) {
                child.parent_id = None;
            }
        }

        if self.active_object == Some(id) {
            self.active_object = None;
        }

        self.removed_objects.insert(id);
        Ok(())
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(
        &mut self,
        child_id: ObjectId,
        new_parent_id: Option<ObjectId>,
    ) -> Result<()> {
        self.object(child_id)?;

        if let Some(new_parent_id) = new_parent_id {
            self.object(new_parent_id)?;

            let mut cursor = Some(new_parent_id);
            while let Some(id) = cursor {
                if id == child_id {
                    return Err(PipelineError::CorruptHierarchy(format!(
                        "object '{}' would become its own ancestor",
                        self.object(child_id)?.name
                    )));
                }
                cursor = self.object(id)?.parent_id;
            }
        }

        // Remove from old parent's children list
        if let Some(old_parent_id) = self.object(child_id)?.parent_id {
            if let Some(old_parent) = self.get_object_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        // Set new parent and add to new parent's children list
        self.object_mut(child_id)?.parent_id = new_parent_id;
        if let Some(new_parent_id) = new_parent_id {
            self.object_mut(new_parent_id)?.child_ids.push(child_id);
        }

        Ok(())
    }

    /// Local transform composed with every ancestor's local transform.
    pub fn world_matrix(&self, id: ObjectId) -> Result<Mat4> {
        let mut matrix = Mat4::IDENTITY;
        let mut cursor = Some(id);

        while let Some(current) = cursor {
            let object = self.object(current)?;
            matrix = object.transform.local_matrix() * matrix;
            cursor = object.parent_id;
        }

        Ok(matrix)
    }

    // ---------- Collections ----------

    /// Creates an unlinked collection; a taken name gets a `.NNN` suffix.
    pub fn new_collection(&mut self, name: &str) -> CollectionId {
        let name = unique_name(name, |candidate| {
            self.collection_by_name(candidate).is_some()
        });
        self.collections.alloc(Collection::new(name))
    }

    pub fn get_collection(&self, id: CollectionId) -> Option<&Collection> {
        if self.removed_collections.contains(&id) {
            return None;
        }
        self.collections.get(id)
    }

    pub fn get_collection_mut(&mut self, id: CollectionId) -> Option<&mut Collection> {
        if self.removed_collections.contains(&id) {
            return None;
        }
        self.collections.get_mut(id)
    }

    pub fn collection(&self, id: CollectionId) -> Result<&Collection> {
        self.get_collection(id)
            .ok_or(PipelineError::StaleId("collection"))
    }

    pub fn collection_mut(&mut self, id: CollectionId) -> Result<&mut Collection> {
        self.get_collection_mut(id)
            .ok_or(PipelineError::StaleId("collection"))
    }

    pub fn collection_by_name(&self, name: &str) -> Option<CollectionId> {
        self.collections()
            .find(|(_, collection)| collection.name == name)
            .map(|(id, _)| id)
    }

    /// Every live collection except the root, in creation order.
    pub fn collections(&self) -> impl Iterator<Item = (CollectionId, &Collection)> {
        self.collections
            .iter()
            .filter(move |(id, _)| *id != self.root && !self.removed_collections.contains(id))
    }

    pub fn link_collection(&mut self, parent: CollectionId, child: CollectionId) -> Result<()> {
        self.collection(parent)?;
        self.collection(child)?;

        if self.collection_reaches(child, parent) {
            return Err(PipelineError::CorruptHierarchy(format!(
                "linking '{}' into '{}' would form a cycle",
                self.collection(child)?.name,
                self.collection(parent)?.name
            )));
        }

        let parent_collection = self.collection_mut(parent)?;
        if !parent_collection.child_ids.contains(&child) {
            parent_collection.child_ids.push(child);
        }

        self.sync_view_layer()
    }

    /// Unlinks the collection from every parent and drops it. Its objects and
    /// child collections stay alive.
    pub fn remove_collection(&mut self, id: CollectionId) -> Result<()> {
        if id == self.root {
            return Err(PipelineError::host_failed(
                "remove collection",
                "the root collection cannot be removed",
            ));
        }
        self.collection(id)?;

        for (_, collection) in self.collections.iter_mut() {
            collection.child_ids.retain(|&child| child != id);
        }

        self.removed_collections.insert(id);
        self.sync_view_layer()
    }

    fn collection_reaches(&self, from: CollectionId, to: CollectionId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![from];

        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(collection) = self.get_collection(id) {
                stack.extend(collection.child_ids.iter().copied());
            }
        }

        false
    }

    pub fn link_object(&mut self, collection: CollectionId, object: ObjectId) -> Result<()> {
        self.object(object)?;
        let collection = self.collection_mut(collection)?;
        if !collection.contains_object(object) {
            collection.object_ids.push(object);
        }
        Ok(())
    }

    pub fn unlink_object(&mut self, collection: CollectionId, object: ObjectId) -> Result<()> {
        self.collection_mut(collection)?
            .object_ids
            .retain(|&id| id != object);
        Ok(())
    }

    /// Collections (root included) that directly contain the object.
    pub fn users_collection(&self, object: ObjectId) -> Vec<CollectionId> {
        self.collections
            .iter()
            .filter(|(id, collection)| {
                !self.removed_collections.contains(id) && collection.contains_object(object)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Objects of the collection and of all its descendants, flattened without
    /// de-duplication. A collection is not re-entered while it is on the current path.
    pub fn all_objects_in(&self, collection: CollectionId) -> Result<Vec<ObjectId>> {
        let mut objects = Vec::new();
        let mut stack: Vec<(CollectionId, Vec<CollectionId>)> = vec![(collection, Vec::new())];

        while let Some((id, mut path)) = stack.pop() {
            if path.contains(&id) {
                log::warn!(
                    "Collection '{}' is its own ancestor; skipping",
                    self.collection(id)?.name
                );
                continue;
            }

            let current = self.collection(id)?;
            objects.extend(
                current
                    .object_ids
                    .iter()
                    .copied()
                    .filter(|&object| self.get_object(object).is_some()),
            );

            path.push(id);
            for &child in current.child_ids.iter().rev() {
                stack.push((child, path.clone()));
            }
        }

        Ok(objects)
    }

    /// Objects linked anywhere below the root, each once, in depth-first order.
    pub fn objects(&self) -> Result<Vec<ObjectId>> {
        let mut seen = HashSet::new();
        Ok(self
            .all_objects_in(self.root)?
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect())
    }

    // ---------- View layer & selection ----------

    pub fn view_layer(&self) -> &ViewLayer {
        &self.view_layer
    }

    pub fn view_layer_mut(&mut self) -> &mut ViewLayer {
        &mut self.view_layer
    }

    fn sync_view_layer(&mut self) -> Result<()> {
        self.view_layer = ViewLayer::build(
            self.view_layer.name.clone(),
            &self.collections,
            self.root,
            Some(&self.view_layer),
        )?;
        Ok(())
    }

    /// Linked objects that are not hidden and sit in at least one included collection.
    pub fn visible_objects(&self) -> Result<Vec<ObjectId>> {
        let included = self.view_layer.included_collections();

        Ok(self
            .objects()?
            .into_iter()
            .filter(|&id| {
                let Some(object) = self.get_object(id) else {
                    return false;
                };
                !object.hidden
                    && included.iter().any(|&collection| {
                        self.get_collection(collection)
                            .is_some_and(|c| c.contains_object(id))
                    })
            })
            .collect())
    }

    pub fn select_all(&mut self, selected: bool) {
        for (_, object) in self.objects.iter_mut() {
            object.selected = selected;
        }
    }

    pub fn selected_objects(&self) -> Vec<ObjectId> {
        self.all_objects()
            .filter(|(_, object)| object.selected)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn active_object(&self) -> Option<ObjectId> {
        self.active_object
    }

    pub fn set_active_object(&mut self, id: Option<ObjectId>) {
        self.active_object = id;
    }
}
