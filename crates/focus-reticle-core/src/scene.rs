//! Scene-graph seam and an in-memory scene tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Material, MeshResource, ReticlePose};

/// Opaque handle to a host scene node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene node {0:?} does not exist")]
    UnknownNode(NodeId),
}

/// Host scene graph, as seen by the reticle.
///
/// The reticle only ever touches nodes it spawned itself. Writes to
/// unknown nodes are ignored by implementations.
pub trait SceneGraph {
    /// Create a child of `parent`.
    fn spawn(&mut self, parent: NodeId, name: &str) -> Result<NodeId, SceneError>;
    /// Remove `node` and its whole subtree.
    fn despawn(&mut self, node: NodeId);
    fn set_transform(&mut self, node: NodeId, transform: &ReticlePose);
    fn set_mesh(&mut self, node: NodeId, mesh: &MeshResource);
    /// Replace the node's material in a single assignment.
    fn set_material(&mut self, node: NodeId, material: Material);
}

/// Number of writes each node property received.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteCounters {
    pub transforms: u64,
    pub meshes: u64,
    pub materials: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: ReticlePose,
    /// Name of the mesh currently assigned.
    pub mesh: Option<String>,
    pub material: Option<Material>,
}

impl SceneNode {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            transform: ReticlePose::default(),
            mesh: None,
            material: None,
        }
    }
}

/// Arena-backed scene graph with a single root.
///
/// Used as the reference host in tests, benches and the replay tool.
#[derive(Clone, Debug)]
pub struct SceneTree {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u64,
    writes: WriteCounters,
}

impl SceneTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(Self::ROOT, SceneNode::new("root", None));
        Self {
            nodes,
            next_id: 1,
            writes: WriteCounters::default(),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Node count including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn writes(&self) -> WriteCounters {
        self.writes
    }

    /// Ids of every node whose name equals `name`.
    pub fn find_by_name(&self, name: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.name == name)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph for SceneTree {
    fn spawn(&mut self, parent: NodeId, name: &str) -> Result<NodeId, SceneError> {
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(SceneError::UnknownNode(parent))?;
        let id = NodeId(self.next_id);
        self.next_id += 1;
        parent_node.children.push(id);
        self.nodes.insert(id, SceneNode::new(name, Some(parent)));
        Ok(id)
    }

    fn despawn(&mut self, node: NodeId) {
        if node == Self::ROOT {
            return;
        }
        let Some(removed) = self.nodes.remove(&node) else {
            return;
        };
        if let Some(parent) = removed.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != node);
        }
        let mut stack = removed.children;
        while let Some(child) = stack.pop() {
            if let Some(n) = self.nodes.remove(&child) {
                stack.extend(n.children);
            }
        }
    }

    fn set_transform(&mut self, node: NodeId, transform: &ReticlePose) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.transform = *transform;
            self.writes.transforms += 1;
        }
    }

    fn set_mesh(&mut self, node: NodeId, mesh: &MeshResource) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.mesh = Some(mesh.name.clone());
            self.writes.meshes += 1;
        }
    }

    fn set_material(&mut self, node: NodeId, material: Material) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.material = Some(material);
            self.writes.materials += 1;
        }
    }
}
