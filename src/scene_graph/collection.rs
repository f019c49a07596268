use id_arena::Id;

use crate::scene_graph::object3d::ObjectId;
use crate::scene_graph::properties::Properties;

pub type CollectionId = Id<Collection>;

#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub name: String,
    pub object_ids: Vec<ObjectId>,
    pub child_ids: Vec<CollectionId>,
    pub properties: Properties,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.object_ids.contains(&id)
    }
}
