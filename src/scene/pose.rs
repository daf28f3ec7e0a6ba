//! Pose evaluation
//!
//! Turns an [`AnimationClip`] and a time into the flat bone-matrix array the
//! skinning shader consumes. The node graph and skeleton are only read, so
//! any number of evaluators (one per model instance) can share them; the
//! scratch world matrices belong to the evaluator.
//!
//! Per frame:
//! 1. wrap the time into `[0, duration)`;
//! 2. walk the nodes parents-first, taking the local transform from the
//!    node's channel if the clip animates it, else from the bind pose;
//! 3. `world = parent_world * local`;
//! 4. for bone nodes, `pose[bone] = world * offset`.

use glam::{Affine3A, Mat4};

use crate::animation::clip::AnimationClip;
use crate::scene::graph::NodeGraph;
use crate::scene::skeleton::Skeleton;
use crate::scene::NodeId;

/// Final bone matrices of one frame, indexed by bone slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    matrices: Vec<Mat4>,
}

impl Pose {
    /// An identity pose for `bone_count` bones.
    #[must_use]
    pub fn identity(bone_count: usize) -> Self {
        Self {
            matrices: vec![Mat4::IDENTITY; bone_count],
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, bone: usize) -> Option<&Mat4> {
        self.matrices.get(bone)
    }

    #[inline]
    #[must_use]
    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    /// Raw bytes for a storage buffer upload.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }

    /// Resets every matrix to identity, resizing to `bone_count`.
    fn reset(&mut self, bone_count: usize) {
        self.matrices.clear();
        self.matrices.resize(bone_count, Mat4::IDENTITY);
    }
}

/// Wraps `time` into `[0, duration)` for looping playback.
///
/// Returns 0 for a zero (or invalid) duration and for non-finite times.
#[must_use]
pub fn wrap_time(time: f32, duration: f32) -> f32 {
    if duration <= 0.0 || !duration.is_finite() || !time.is_finite() {
        return 0.0;
    }

    let wrapped = time.rem_euclid(duration);
    // rem_euclid can round up to `duration` for tiny negative inputs
    if wrapped >= duration { 0.0 } else { wrapped }
}

/// Computes poses for one model.
#[derive(Debug)]
pub struct PoseEvaluator<'a> {
    graph: &'a NodeGraph,
    skeleton: &'a Skeleton,
    /// World transform per node arena slot, from the last evaluation.
    world: Vec<Affine3A>,
}

impl<'a> PoseEvaluator<'a> {
    #[must_use]
    pub fn new(graph: &'a NodeGraph, skeleton: &'a Skeleton) -> Self {
        Self {
            graph,
            skeleton,
            world: vec![Affine3A::IDENTITY; graph.len()],
        }
    }

    /// Evaluates `clip` at `time` (in clip ticks).
    #[must_use]
    pub fn evaluate(&mut self, clip: &AnimationClip, time: f32) -> Pose {
        let mut pose = Pose::identity(self.skeleton.len());
        self.evaluate_into(Some(clip), time, &mut pose);
        pose
    }

    /// The pose with every node at its bind transform.
    #[must_use]
    pub fn bind_pose(&mut self) -> Pose {
        let mut pose = Pose::identity(self.skeleton.len());
        self.evaluate_into(None, 0.0, &mut pose);
        pose
    }

    /// Same as [`evaluate`](Self::evaluate), reusing `pose`'s allocation.
    /// `None` evaluates the bind pose.
    ///
    /// `clip` must have been built against this evaluator's graph, since its
    /// channels are keyed by node id. A clip bound to a graph of a different
    /// size is logged and ignored, leaving the bind pose.
    pub fn evaluate_into(&mut self, clip: Option<&AnimationClip>, time: f32, pose: &mut Pose) {
        pose.reset(self.skeleton.len());
        self.world.resize(self.graph.len(), Affine3A::IDENTITY);

        let clip = clip.filter(|clip| {
            let bound = clip.node_count() == self.graph.len();
            if !bound {
                log::error!(
                    "Clip '{}' was built for a graph of {} nodes, not {}; using the bind pose",
                    clip.name(),
                    clip.node_count(),
                    self.graph.len()
                );
            }
            bound
        });

        let time = clip.map_or(0.0, |clip| wrap_time(time, clip.duration()));

        for (id, node) in self.graph.iter() {
            let local = clip
                .and_then(|clip| clip.channel_for_node(id))
                .map_or(node.local_transform, |channel| channel.local_transform(time));

            // parents come first in the order, so their slot is already current
            let world = match node.parent {
                Some(parent) => self.world[parent.index()] * local,
                None => local,
            };
            self.world[id.index()] = world;

            if let Some(bone) = node.bone.and_then(|index| self.skeleton.get(index)) {
                pose.matrices[bone.index] = Mat4::from(world * bone.offset);
            }
        }
    }

    /// World transform of `node` from the most recent evaluation.
    #[inline]
    #[must_use]
    pub fn world_transform(&self, node: NodeId) -> Option<Affine3A> {
        self.world.get(node.index()).copied()
    }

    #[inline]
    #[must_use]
    pub fn world_transforms(&self) -> &[Affine3A] {
        &self.world
    }
}
