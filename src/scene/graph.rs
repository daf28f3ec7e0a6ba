//! Node graph construction
//!
//! The imported tree is flattened into a single arena. Nodes are created in
//! pre-order, so the arena itself is already a parents-first ordering; the
//! explicit `order` list keeps that contract visible to consumers, and the
//! name map resolves animation channels and bones to nodes in O(1).

use glam::Affine3A;
use rustc_hash::FxHashMap;

use crate::assets::source::SourceNode;
use crate::errors::{LoadReport, SkinningError};
use crate::scene::node::Node;
use crate::scene::skeleton::Skeleton;
use crate::scene::NodeId;

#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    name_map: FxHashMap<String, NodeId>,
    /// Pre-order traversal: every node appears after its parent.
    order: Vec<NodeId>,
}

impl NodeGraph {
    /// Flattens `root` and its descendants into a new graph.
    ///
    /// Uses an explicit stack instead of recursion so deep rigs cannot
    /// overflow the call stack.
    #[must_use]
    pub fn build_from_source(root: &SourceNode) -> Self {
        let mut graph = Self::default();

        // (source node, parent id)
        let mut stack: Vec<(&SourceNode, Option<NodeId>)> = Vec::with_capacity(64);
        stack.push((root, None));

        while let Some((source, parent)) = stack.pop() {
            let id = NodeId(graph.nodes.len() as u32);

            let mut node = Node::new(source.name.clone(), Affine3A::from_mat4(source.transform));
            node.parent = parent;
            node.meshes.clone_from(&source.meshes);
            graph.nodes.push(node);
            graph.order.push(id);

            if let Some(parent) = parent {
                graph.nodes[parent.index()].children.push(id);
            }

            if graph.name_map.contains_key(&source.name) {
                log::warn!(
                    "Duplicate node name '{}', lookups resolve to the first occurrence",
                    source.name
                );
            } else {
                graph.name_map.insert(source.name.clone(), id);
            }

            // reversed so the first child is popped (and numbered) first
            for child in source.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        log::debug!("Built node graph with {} nodes", graph.nodes.len());
        graph
    }

    /// Binds every bone of `skeleton` to the node with the same name and
    /// derives each bone's parent bone from the node hierarchy.
    ///
    /// A bone without a node is reported and stays unbound: its pose matrix
    /// remains identity.
    pub fn attach_bones(&mut self, skeleton: &mut Skeleton, report: &mut LoadReport) {
        for bone in skeleton.bones_mut() {
            match self.name_map.get(&bone.name) {
                Some(&id) => {
                    self.nodes[id.index()].bone = Some(bone.index);
                    bone.node = Some(id);
                }
                None => {
                    report.warn(SkinningError::UnresolvedBone {
                        bone: bone.name.clone(),
                    });
                }
            }
        }

        for bone in skeleton.bones_mut() {
            bone.parent = bone.node.and_then(|id| {
                self.ancestors(id).find_map(|ancestor| self.nodes[ancestor.index()].bone)
            });
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The root node. Panics on an empty graph, which `build_from_source`
    /// never produces.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.order[0]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Resolves a node name.
    #[inline]
    #[must_use]
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_map.get(name).copied()
    }

    #[inline]
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.node_by_name(name).and_then(|id| self.get(id))
    }

    #[inline]
    #[must_use]
    pub fn name_map(&self) -> &FxHashMap<String, NodeId> {
        &self.name_map
    }

    /// Node ids in pre-order (parents before children).
    #[inline]
    #[must_use]
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Iterates nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.order.iter().map(move |&id| (id, &self.nodes[id.index()]))
    }

    /// Iterates the strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).and_then(Node::parent), move |&current| {
            self.get(current).and_then(Node::parent)
        })
    }
}
