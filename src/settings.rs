//! Model & Skinning Buffer Settings
//!
//! Plain configuration structs consumed at load time and by the GPU
//! skinning buffers. Both implement [`Default`]; override fields with
//! struct update syntax:
//!
//! ```rust,ignore
//! use myth_skinning::settings::ModelSettings;
//!
//! let settings = ModelSettings {
//!     max_bone_influences: 2,
//!     ..Default::default()
//! };
//! ```

/// Maximum number of bone influences a skinned vertex can carry.
///
/// This is the width of the `joints`/`weights` vertex attributes.
pub const MAX_BONE_INFLUENCES: usize = 4;

// ---------------------------------------------------------------------------
// ModelSettings
// ---------------------------------------------------------------------------

/// Options applied while building an [`AnimatedModel`](crate::assets::AnimatedModel).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Bone influences kept per vertex (strongest first).
    /// Clamped to [`MAX_BONE_INFLUENCES`].
    pub max_bone_influences: usize,

    /// Playback rate used when an animation reports zero ticks per second.
    pub default_ticks_per_second: f32,

    /// Rescale the kept weights of every vertex so they sum to 1.
    pub normalize_bone_weights: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            max_bone_influences: MAX_BONE_INFLUENCES,
            default_ticks_per_second: 25.0,
            normalize_bone_weights: true,
        }
    }
}

impl ModelSettings {
    /// Effective influence count, never above [`MAX_BONE_INFLUENCES`].
    #[inline]
    #[must_use]
    pub fn influence_limit(&self) -> usize {
        self.max_bone_influences.min(MAX_BONE_INFLUENCES)
    }
}

// ---------------------------------------------------------------------------
// SkinningBufferSettings
// ---------------------------------------------------------------------------

/// Options for the storage buffers that carry bone data to the vertex stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinningBufferSettings {
    /// Bytes allocated for a buffer before its first upload.
    pub initial_capacity_bytes: u64,

    /// Debug label prefix for the wgpu buffers.
    pub label: String,
}

impl Default for SkinningBufferSettings {
    fn default() -> Self {
        Self {
            // 64 bone matrices
            initial_capacity_bytes: 64 * std::mem::size_of::<glam::Mat4>() as u64,
            label: "SkinningBuffer".to_string(),
        }
    }
}
