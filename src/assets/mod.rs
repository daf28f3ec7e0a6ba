pub mod source;
pub mod mesh;
pub mod model;
pub mod loaders;

pub use source::{
    SourceAnimation, SourceBone, SourceChannel, SourceInfluence, SourceKey, SourceMesh,
    SourceNode, SourceScene,
};
pub use mesh::{SkinnedMesh, VertexInfluences};
pub use model::{AnimatedModel, SkinningSlots};

#[cfg(feature = "gltf")]
use std::path::Path;

#[cfg(feature = "gltf")]
use crate::errors::{LoadReport, Result};
#[cfg(feature = "gltf")]
use crate::settings::ModelSettings;

/// Imports a glTF file and builds an [`AnimatedModel`] from it.
///
/// The model is named after the file stem.
#[cfg(feature = "gltf")]
pub fn load_gltf_model(
    path: impl AsRef<Path>,
    settings: ModelSettings,
) -> Result<(AnimatedModel, LoadReport)> {
    let path = path.as_ref();
    let source = loaders::load_source_scene(path)?;
    let name = path
        .file_stem()
        .map_or_else(|| "model".to_string(), |stem| stem.to_string_lossy().into_owned());
    AnimatedModel::from_source(name, &source, settings)
}
