use id_arena::Id;
use serde::{Deserialize, Serialize};

use crate::scene_graph::collection::CollectionId;
use crate::scene_graph::properties::Properties;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Mesh,
    Empty,
    Light,
    Camera,
    Other,
}

impl ObjectKind {
    /// Mesh and empty objects are the ones that end up in exported chunks.
    pub fn is_exportable(self) -> bool {
        matches!(self, ObjectKind::Mesh | ObjectKind::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDisplayType {
    PlainAxes,
    Arrows,
    Cube,
    Sphere,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmptyDisplay {
    pub display_type: EmptyDisplayType,
    pub size: f32,
}

#[derive(Debug, Clone)]
pub struct Object3D {
    pub name: String,
    pub kind: ObjectKind,
    pub transform: Transform,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
    pub instance_collection: Option<CollectionId>,
    pub properties: Properties,
    pub hidden: bool,
    pub selected: bool,
    pub empty_display: Option<EmptyDisplay>,
}

impl Object3D {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, ObjectKind::Empty)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_instance(mut self, collection: CollectionId) -> Self {
        self.instance_collection = Some(collection);
        self
    }

    /// An empty that stamps out a collection.
    pub fn is_collection_instance(&self) -> bool {
        self.kind == ObjectKind::Empty && self.instance_collection.is_some()
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ObjectKind::Empty,
            transform: Transform::IDENTITY,
            parent_id: None,
            child_ids: Vec::new(),
            instance_collection: None,
            properties: Properties::new(),
            hidden: false,
            selected: false,
            empty_display: None,
        }
    }
}
