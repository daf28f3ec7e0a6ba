use glam::Affine3A;

use crate::scene::NodeId;

/// A node of the loaded model's hierarchy.
///
/// Nodes live in the [`NodeGraph`](crate::scene::NodeGraph) arena and refer
/// to each other, to meshes and to bones by index only.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: String,
    /// Bind-pose transform relative to the parent.
    pub(crate) local_transform: Affine3A,

    // === Hierarchy ===
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,

    // === Attachments ===
    /// Indices into the model's mesh list.
    pub(crate) meshes: Vec<usize>,
    /// Index into the model's bone array.
    pub(crate) bone: Option<usize>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>, local_transform: Affine3A) -> Self {
        Self {
            name: name.into(),
            local_transform,
            parent: None,
            children: Vec::new(),
            meshes: Vec::new(),
            bone: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn local_transform(&self) -> &Affine3A {
        &self.local_transform
    }

    /// Returns the parent node, `None` for the root.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn meshes(&self) -> &[usize] {
        &self.meshes
    }

    #[inline]
    #[must_use]
    pub fn bone(&self) -> Option<usize> {
        self.bone
    }
}
