#[cfg(feature = "gltf")]
pub mod gltf;

#[cfg(feature = "gltf")]
pub use self::gltf::{import_document, load_source_scene, load_source_scene_from_slice};
