pub mod collection;
pub mod document;
pub mod naming;
pub mod object3d;
pub mod properties;
pub mod scene;
pub mod transform;
pub mod view_layer;

// Re-export main types for convenience
pub use collection::{Collection, CollectionId};
pub use document::SceneDocument;
pub use object3d::{EmptyDisplay, EmptyDisplayType, Object3D, ObjectId, ObjectKind};
pub use properties::{Properties, PropertyValue, RESERVED_KEY};
pub use scene::Scene;
pub use transform::Transform;
pub use view_layer::{LayerCollection, ViewLayer};
