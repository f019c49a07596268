use std::collections::{HashMap, HashSet};

use id_arena::Arena;

use crate::error::{PipelineError, Result};
use crate::scene_graph::collection::{Collection, CollectionId};

/// Per-view state for one collection, independent of the collection itself.
#[derive(Debug, Clone)]
pub struct LayerCollection {
    pub name: String,
    pub collection: CollectionId,
    pub exclude: bool,
    pub children: Vec<LayerCollection>,
}

impl LayerCollection {
    fn build(
        collections: &Arena<Collection>,
        id: CollectionId,
        previous: &HashMap<CollectionId, bool>,
        path: &mut Vec<CollectionId>,
    ) -> Result<LayerCollection> {
        let collection = collections.get(id).ok_or(PipelineError::StaleId("collection"))?;

        if path.contains(&id) {
            return Err(PipelineError::CorruptHierarchy(format!(
                "collection '{}' is its own ancestor",
                collection.name
            )));
        }

        path.push(id);
        let children = collection
            .child_ids
            .iter()
            .map(|&child| LayerCollection::build(collections, child, previous, path))
            .collect::<Result<Vec<_>>>()?;
        path.pop();

        Ok(LayerCollection {
            name: collection.name.clone(),
            collection: id,
            exclude: previous.get(&id).copied().unwrap_or(false),
            children,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ViewLayer {
    pub name: String,
    pub root: LayerCollection,
}

impl ViewLayer {
    /// Mirrors the collection tree below `root`, keeping exclude flags of collections
    /// that were already present in `previous`.
    pub fn build(
        name: impl Into<String>,
        collections: &Arena<Collection>,
        root: CollectionId,
        previous: Option<&ViewLayer>,
    ) -> Result<ViewLayer> {
        let flags = previous.map(ViewLayer::exclude_flags).unwrap_or_default();
        let root = LayerCollection::build(collections, root, &flags, &mut Vec::new())?;

        Ok(ViewLayer {
            name: name.into(),
            root,
        })
    }

    fn exclude_flags(&self) -> HashMap<CollectionId, bool> {
        let mut flags = HashMap::new();
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            // A collection linked twice keeps the flag of its first node.
            flags.entry(node.collection).or_insert(node.exclude);
            stack.extend(node.children.iter().rev());
        }

        flags
    }

    /// Collections reachable from the root without passing an excluded node.
    pub fn included_collections(&self) -> HashSet<CollectionId> {
        let mut included = HashSet::new();
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            if node.exclude {
                continue;
            }
            included.insert(node.collection);
            stack.extend(node.children.iter());
        }

        included
    }

    pub fn find(&self, name: &str) -> Option<&LayerCollection> {
        find_layer_collection(&self.root, name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut LayerCollection> {
        find_layer_collection_mut(&mut self.root, name)
    }
}

/// Depth-first, pre-order search; the first node whose name matches wins.
pub fn find_layer_collection<'a>(
    root: &'a LayerCollection,
    name: &str,
) -> Option<&'a LayerCollection> {
    let path = find_path(root, name)?;
    let mut node = root;
    for index in path {
        node = &node.children[index];
    }
    Some(node)
}

pub fn find_layer_collection_mut<'a>(
    root: &'a mut LayerCollection,
    name: &str,
) -> Option<&'a mut LayerCollection> {
    let path = find_path(root, name)?;
    let mut node = root;
    for index in path {
        node = &mut node.children[index];
    }
    Some(node)
}

/// Child indices leading from `root` to the first match.
fn find_path(root: &LayerCollection, name: &str) -> Option<Vec<usize>> {
    let mut stack: Vec<(&LayerCollection, Vec<usize>)> = vec![(root, Vec::new())];

    while let Some((node, path)) = stack.pop() {
        if node.name == name {
            return Some(path);
        }

        for (index, child) in node.children.iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(index);
            stack.push((child, child_path));
        }
    }

    None
}
