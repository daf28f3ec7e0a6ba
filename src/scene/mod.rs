//! Skeleton & node graph
//!
//! - Node: scene node arena element (bind transform, hierarchy, attachments)
//! - NodeGraph: arena tree with name lookup and a parents-first flat order
//! - Skeleton: contiguous bone arena shared by every mesh of a model
//! - PoseEvaluator: per-frame bone matrices for GPU skinning

pub mod node;
pub mod graph;
pub mod skeleton;
pub mod pose;

pub use node::Node;
pub use graph::NodeGraph;
pub use skeleton::{Bone, Skeleton, NO_PARENT_BONE};
pub use pose::{Pose, PoseEvaluator, wrap_time};

/// Index of a node in its [`NodeGraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
