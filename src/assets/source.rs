//! Importer-facing scene description.
//!
//! These types are what an asset importer hands over to
//! [`AnimatedModel::from_source`](crate::assets::AnimatedModel::from_source):
//! a tree of named nodes, meshes with their bone references and per-vertex
//! influences, and animations as per-node keyframe lists. They carry no GPU
//! state and no resolved indices; resolution happens while the model is built.

use glam::{Mat4, Quat, Vec3};
use smallvec::SmallVec;

use crate::animation::tracks::ExtrapolationPolicy;

/// A node of the imported scene graph.
#[derive(Debug, Clone)]
pub struct SourceNode {
    pub name: String,
    /// Bind-pose transform relative to the parent.
    pub transform: Mat4,
    /// Indices into [`SourceScene::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    #[must_use]
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: SourceNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.meshes.push(mesh);
        self
    }
}

/// A bone as declared by one mesh.
#[derive(Debug, Clone)]
pub struct SourceBone {
    pub name: String,
    /// Inverse bind matrix: mesh space to bone space at bind time.
    pub offset: Mat4,
}

/// One bone influence on a vertex. `bone` indexes [`SourceMesh::bones`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceInfluence {
    pub bone: usize,
    pub weight: f32,
}

/// Influences of a single vertex. Importers may report more than the
/// shader supports; the mesh loader keeps the strongest ones.
pub type SourceVertexInfluences = SmallVec<[SourceInfluence; 4]>;

#[derive(Debug, Clone, Default)]
pub struct SourceMesh {
    pub name: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub bones: Vec<SourceBone>,
    /// Either empty (static mesh) or one entry per vertex.
    pub influences: Vec<SourceVertexInfluences>,
}

/// A single keyframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceKey<T> {
    pub time: f32,
    pub value: T,
}

impl<T> SourceKey<T> {
    #[must_use]
    pub const fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Keyframes targeting one node.
#[derive(Debug, Clone)]
pub struct SourceChannel {
    pub node_name: String,
    pub translation_keys: Vec<SourceKey<Vec3>>,
    pub rotation_keys: Vec<SourceKey<Quat>>,
    pub scaling_keys: Vec<SourceKey<Vec3>>,
    /// Raw behaviour code before the first key (0 = hold, 1 = constant).
    pub pre_state: u32,
    /// Raw behaviour code after the last key.
    pub post_state: u32,
}

impl SourceChannel {
    #[must_use]
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            translation_keys: Vec::new(),
            rotation_keys: Vec::new(),
            scaling_keys: Vec::new(),
            pre_state: ExtrapolationPolicy::HOLD_CODE,
            post_state: ExtrapolationPolicy::HOLD_CODE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceAnimation {
    pub name: String,
    /// Playback rate hint; 0 means unknown.
    pub ticks_per_second: f32,
    pub channels: Vec<SourceChannel>,
}

/// Everything an importer produces for one asset.
#[derive(Debug, Clone, Default)]
pub struct SourceScene {
    pub root: Option<SourceNode>,
    pub meshes: Vec<SourceMesh>,
    pub animations: Vec<SourceAnimation>,
}
