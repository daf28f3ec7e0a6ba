//! Animated model
//!
//! Load order:
//! 1. meshes: register every referenced bone in the shared [`Skeleton`];
//! 2. node graph: flatten the source tree, attach meshes, bind bones to nodes;
//! 3. clips: build channels and resolve them against nodes and bones.
//!
//! Structural problems found on the way are collected in a [`LoadReport`]
//! and the model degrades instead of failing: meshes that reference an
//! unbound bone are drawn statically, channels without a node are dropped.

use glam::Affine3A;

use crate::animation::clip::AnimationClip;
use crate::assets::mesh::SkinnedMesh;
use crate::assets::source::SourceScene;
use crate::errors::{LoadReport, Result, SkinningError};
use crate::renderer::skinning::BoneBufferSink;
use crate::scene::graph::NodeGraph;
use crate::scene::node::Node;
use crate::scene::pose::{Pose, PoseEvaluator};
use crate::scene::skeleton::{Bone, Skeleton};
use crate::scene::NodeId;
use crate::settings::ModelSettings;

/// Binding slots the skinning shader reads bone data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinningSlots {
    pub bone_matrices: u32,
    pub bone_parents: u32,
}

impl Default for SkinningSlots {
    fn default() -> Self {
        Self {
            bone_matrices: 1,
            bone_parents: 2,
        }
    }
}

/// A loaded model: hierarchy, bones, skinned meshes and animation clips.
///
/// Everything except the evaluators it hands out is immutable after
/// loading, so several instances can evaluate poses from one model.
#[derive(Debug, Clone)]
pub struct AnimatedModel {
    name: String,
    graph: NodeGraph,
    skeleton: Skeleton,
    bone_parents: Vec<i32>,
    meshes: Vec<SkinnedMesh>,
    clips: Vec<AnimationClip>,
    settings: ModelSettings,
}

impl AnimatedModel {
    /// Builds a model from an importer's scene description.
    ///
    /// Fails only when the scene has no root node; everything else is
    /// recoverable and ends up in the returned report.
    pub fn from_source(
        name: impl Into<String>,
        source: &SourceScene,
        settings: ModelSettings,
    ) -> Result<(Self, LoadReport)> {
        let name = name.into();
        let root = source.root.as_ref().ok_or(SkinningError::InvalidRootNode)?;
        let mut report = LoadReport::new();

        // 1. Meshes & bones
        let mut skeleton = Skeleton::new();
        let mut meshes: Vec<SkinnedMesh> = source
            .meshes
            .iter()
            .map(|mesh| SkinnedMesh::process(mesh, &mut skeleton, &settings, &mut report))
            .collect();

        // 2. Node graph
        let mut graph = NodeGraph::build_from_source(root);
        graph.attach_bones(&mut skeleton, &mut report);

        for (_, node) in graph.iter() {
            if let Some(&mesh) = node.meshes().iter().find(|&&mesh| mesh >= meshes.len()) {
                log::warn!("Node '{}' references missing mesh {mesh}", node.name());
            }
        }

        let unbound: Vec<usize> = skeleton.unbound().map(Bone::index).collect();
        if !unbound.is_empty() {
            for mesh in &mut meshes {
                if mesh.bone_indices().iter().any(|bone| unbound.contains(bone)) {
                    log::warn!("Mesh '{}' falls back to static rendering", mesh.name());
                    mesh.disable_skinning();
                }
            }
        }

        let bone_parents = skeleton.parent_indices();

        // 3. Animation clips
        let clips: Vec<AnimationClip> = source
            .animations
            .iter()
            .map(|animation| AnimationClip::build(animation, &graph, &skeleton, &mut report))
            .collect();

        let model = Self {
            name,
            graph,
            skeleton,
            bone_parents,
            meshes,
            clips,
            settings,
        };

        log::info!(
            "Loaded model '{}': {} nodes, {} meshes, {} bones, {} clips, {} triangles \
             ({} warnings)",
            model.name,
            model.graph.len(),
            model.meshes.len(),
            model.skeleton.len(),
            model.clips.len(),
            model.triangle_count(),
            report.len(),
        );

        Ok((model, report))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn node_graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// Nodes in pre-order (parents first).
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.graph.iter()
    }

    #[inline]
    #[must_use]
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.graph.find(name)
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        self.skeleton.bones()
    }

    /// Parent bone per slot, `-1` for roots.
    #[inline]
    #[must_use]
    pub fn bone_parent_indices(&self) -> &[i32] {
        &self.bone_parents
    }

    #[inline]
    #[must_use]
    pub fn meshes(&self) -> &[SkinnedMesh] {
        &self.meshes
    }

    #[inline]
    #[must_use]
    pub fn animation_clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    #[inline]
    #[must_use]
    pub fn has_animations(&self) -> bool {
        !self.clips.is_empty()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(SkinnedMesh::triangle_count).sum()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(SkinnedMesh::vertex_count).sum()
    }

    /// Bind-pose transform of the scene root.
    #[inline]
    #[must_use]
    pub fn root_transform(&self) -> Affine3A {
        self.graph
            .get(self.graph.root())
            .map_or(Affine3A::IDENTITY, |root| *root.local_transform())
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    /// A fresh evaluator; keep one per model instance to reuse its scratch.
    #[must_use]
    pub fn pose_evaluator(&self) -> PoseEvaluator<'_> {
        PoseEvaluator::new(&self.graph, &self.skeleton)
    }

    /// Pose of clip `clip_index` at `time` ticks, `None` for a bad index.
    #[must_use]
    pub fn evaluate_pose(&self, clip_index: usize, time: f32) -> Option<Pose> {
        let clip = self.clips.get(clip_index)?;
        Some(self.pose_evaluator().evaluate(clip, time))
    }

    #[must_use]
    pub fn bind_pose(&self) -> Pose {
        self.pose_evaluator().bind_pose()
    }

    /// Hands `pose` and the bone parent table to the GPU side.
    ///
    /// A pose evaluated for another model (wrong bone count) is not uploaded.
    pub fn upload_pose(&self, sink: &mut impl BoneBufferSink, pose: &Pose, slots: SkinningSlots) {
        if pose.len() != self.skeleton.len() {
            log::error!(
                "Pose has {} matrices but model '{}' has {} bones, skipping upload",
                pose.len(),
                self.name,
                self.skeleton.len()
            );
            return;
        }

        sink.upload_bone_matrices(pose.matrices(), slots.bone_matrices);
        sink.upload_bone_parent_indices(&self.bone_parents, slots.bone_parents);
    }
}
