use glam::{Affine3A, Mat4};
use rustc_hash::FxHashMap;

use crate::scene::NodeId;

/// Parent index written to the GPU for bones without a parent bone.
pub const NO_PARENT_BONE: i32 = -1;

/// A skinning bone.
///
/// `index` is the bone's slot in the model's bone array and in the GPU
/// skinning buffers; it never changes once the model is loaded.
#[derive(Debug, Clone)]
pub struct Bone {
    pub(crate) name: String,
    pub(crate) index: usize,
    /// Inverse bind matrix: mesh space to bone space at bind time.
    pub(crate) offset: Affine3A,
    /// Nearest ancestor node that is itself a bone.
    pub(crate) parent: Option<usize>,
    /// Node driving this bone, `None` if the skeleton is malformed.
    pub(crate) node: Option<NodeId>,
}

impl Bone {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> &Affine3A {
        &self.offset
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

/// The bone arena of a model.
///
/// Meshes share bones by name: a bone referenced by several meshes gets one
/// slot, assigned at its first appearance.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    name_map: FxHashMap<String, usize>,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot of `name`, creating the bone if it is new.
    pub fn register(&mut self, name: &str, offset: Mat4) -> usize {
        if let Some(&index) = self.name_map.get(name) {
            let existing = &self.bones[index];
            if !existing.offset.abs_diff_eq(Affine3A::from_mat4(offset), 1e-4) {
                log::debug!(
                    "Bone '{name}' redeclared with a different offset, keeping the first one"
                );
            }
            return index;
        }

        let index = self.bones.len();
        self.bones.push(Bone {
            name: name.to_string(),
            index,
            offset: Affine3A::from_mat4(offset),
            parent: None,
            node: None,
        });
        self.name_map.insert(name.to_string(), index);
        index
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    pub(crate) fn bones_mut(&mut self) -> &mut [Bone] {
        &mut self.bones
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    #[inline]
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_map.get(name).copied()
    }

    #[inline]
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Bone> {
        self.index_of(name).map(|index| &self.bones[index])
    }

    /// Bones that could not be bound to a node.
    pub fn unbound(&self) -> impl Iterator<Item = &Bone> + '_ {
        self.bones.iter().filter(|bone| bone.node.is_none())
    }

    /// Parent bone of every slot, [`NO_PARENT_BONE`] for roots.
    ///
    /// Uploaded next to the bone matrices so the vertex stage can walk the
    /// parent chain.
    #[must_use]
    pub fn parent_indices(&self) -> Vec<i32> {
        self.bones
            .iter()
            .map(|bone| bone.parent.map_or(NO_PARENT_BONE, |parent| parent as i32))
            .collect()
    }
}
