//! Error Types
//!
//! This module defines the error types used by the animated-model pipeline.
//!
//! # Overview
//!
//! The main error type [`SkinningError`] covers:
//! - Keyframe data that cannot be evaluated (unsorted, mismatched or non-finite keys)
//! - Extrapolation codes the evaluator does not implement
//! - Structural problems in a loaded skeleton (bones or channels without a node)
//! - Import failures (I/O, glTF parsing)
//!
//! Most of these are *recoverable*: the model loader records them in a
//! [`LoadReport`], logs them, and keeps going with a degraded model. Only
//! failures that leave nothing to build (no scene root, unreadable file)
//! are returned as `Err`.
//!
//! ```rust,ignore
//! use myth_skinning::errors::{SkinningError, Result};
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for animated-model loading and evaluation.
#[derive(Error, Debug)]
pub enum SkinningError {
    // ========================================================================
    // Keyframe & Channel Errors
    // ========================================================================
    /// An extrapolation code other than `Hold` (0) or `Constant` (1).
    #[error("Extrapolation code {code} is not supported")]
    UnsupportedExtrapolation {
        /// The raw behaviour code reported by the importer
        code: u32,
    },

    /// Key times of a track are not strictly increasing (or not finite).
    #[error("Key times are not strictly increasing at key {index}")]
    UnsortedKeyframes {
        /// First key whose time does not follow its predecessor
        index: usize,
    },

    /// A key value is NaN or infinite (including rotation keys that
    /// cannot be normalized).
    #[error("Key value {index} is not finite")]
    NonFiniteKeyframe {
        /// First offending key
        index: usize,
    },

    /// A track has a different number of times and values.
    #[error("Keyframe count mismatch: {times} times, {values} values")]
    KeyframeCountMismatch {
        /// Number of key times
        times: usize,
        /// Number of key values
        values: usize,
    },

    /// An animation channel targets a node that does not exist in the graph.
    #[error("Animation channel targets unknown node '{node}'")]
    UnresolvedChannel {
        /// Target node name
        node: String,
    },

    // ========================================================================
    // Skeleton Errors
    // ========================================================================
    /// A bone referenced by a mesh has no node with the same name.
    #[error("Bone '{bone}' has no matching node in the scene graph")]
    UnresolvedBone {
        /// Bone name
        bone: String,
    },

    /// A mesh vertex references a bone slot outside the mesh's bone list.
    #[error("Mesh '{mesh}' references bone slot {slot}, but only has {count} bones")]
    BoneSlotOutOfRange {
        /// Mesh name
        mesh: String,
        /// The invalid slot
        slot: usize,
        /// Number of bones declared by the mesh
        count: usize,
    },

    /// The source scene has no root node.
    #[error("Source scene has no root node")]
    InvalidRootNode,

    // ========================================================================
    // Import Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// glTF parsing or loading error.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    GltfError(String),
}

#[cfg(feature = "gltf")]
impl From<gltf::Error> for SkinningError {
    fn from(err: gltf::Error) -> Self {
        SkinningError::GltfError(err.to_string())
    }
}

/// Alias for `Result<T, SkinningError>`.
pub type Result<T> = std::result::Result<T, SkinningError>;

/// Recoverable diagnostics gathered while building a model.
///
/// Every entry has already been logged by the time the report is returned.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub warnings: Vec<SkinningError>,
}

impl LoadReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `err` as a warning and keeps it.
    pub fn warn(&mut self, err: SkinningError) {
        log::warn!("{err}");
        self.warnings.push(err);
    }

    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Counts warnings matching `pred`.
    pub fn count(&self, pred: impl Fn(&SkinningError) -> bool) -> usize {
        self.warnings.iter().filter(|w| pred(w)).count()
    }
}
