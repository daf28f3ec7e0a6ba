use bytemuck::{Pod, Zeroable};

use crate::assets::source::{SourceInfluence, SourceMesh};
use crate::errors::{LoadReport, SkinningError};
use crate::scene::skeleton::Skeleton;
use crate::settings::{MAX_BONE_INFLUENCES, ModelSettings};

/// Skinning attributes of one vertex, laid out for a vertex buffer
/// (`Uint32x4` joints followed by `Float32x4` weights).
///
/// Joints are model-wide bone slots. Unused entries have weight 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexInfluences {
    pub joints: [u32; MAX_BONE_INFLUENCES],
    pub weights: [f32; MAX_BONE_INFLUENCES],
}

impl VertexInfluences {
    #[inline]
    #[must_use]
    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// A mesh of an animated model, reduced to what skinning needs.
#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    name: String,
    vertex_count: usize,
    triangle_count: usize,
    /// Model-wide bone slot for each of the mesh's own bones.
    bone_indices: Vec<usize>,
    /// Empty for static meshes, otherwise one entry per vertex.
    influences: Vec<VertexInfluences>,
    skinning_enabled: bool,
}

impl SkinnedMesh {
    /// Registers the mesh's bones in `skeleton` and converts the per-vertex
    /// influences to model-wide bone slots.
    pub fn process(
        source: &SourceMesh,
        skeleton: &mut Skeleton,
        settings: &ModelSettings,
        report: &mut LoadReport,
    ) -> Self {
        let bone_indices: Vec<usize> = source
            .bones
            .iter()
            .map(|bone| skeleton.register(&bone.name, bone.offset))
            .collect();

        let limit = settings.influence_limit();
        let mut out_of_range = None;

        let influences = source
            .influences
            .iter()
            .map(|vertex| {
                let mut kept: Vec<SourceInfluence> = vertex
                    .iter()
                    .filter(|influence| {
                        if influence.bone >= bone_indices.len() {
                            out_of_range.get_or_insert(influence.bone);
                            return false;
                        }
                        influence.weight > 0.0
                    })
                    .copied()
                    .collect();

                kept.sort_by(|a, b| b.weight.total_cmp(&a.weight));
                kept.truncate(limit);

                let mut packed = VertexInfluences::default();
                for (slot, influence) in kept.iter().enumerate() {
                    packed.joints[slot] = bone_indices[influence.bone] as u32;
                    packed.weights[slot] = influence.weight;
                }

                if settings.normalize_bone_weights {
                    let sum = packed.weight_sum();
                    if sum > 0.0 {
                        packed.weights.iter_mut().for_each(|w| *w /= sum);
                    }
                }

                packed
            })
            .collect();

        if let Some(slot) = out_of_range {
            report.warn(SkinningError::BoneSlotOutOfRange {
                mesh: source.name.clone(),
                slot,
                count: bone_indices.len(),
            });
        }

        log::debug!(
            "Processed mesh '{}': {} vertices, {} triangles, {} bones",
            source.name,
            source.vertex_count,
            source.triangle_count,
            bone_indices.len(),
        );

        Self {
            name: source.name.clone(),
            vertex_count: source.vertex_count,
            triangle_count: source.triangle_count,
            skinning_enabled: !bone_indices.is_empty(),
            bone_indices,
            influences,
        }
    }

    /// Falls back to static rendering, e.g. after a bone failed to bind.
    pub(crate) fn disable_skinning(&mut self) {
        self.skinning_enabled = false;
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    #[inline]
    #[must_use]
    pub fn bone_indices(&self) -> &[usize] {
        &self.bone_indices
    }

    #[inline]
    #[must_use]
    pub fn influences(&self) -> &[VertexInfluences] {
        &self.influences
    }

    /// Whether the mesh should be drawn with the skinning pipeline.
    #[inline]
    #[must_use]
    pub fn is_skinned(&self) -> bool {
        self.skinning_enabled
    }

    /// Raw influence bytes for a vertex buffer upload.
    #[inline]
    #[must_use]
    pub fn influence_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.influences)
    }
}
