//! glTF 2.0 import
//!
//! Converts a glTF document into a [`SourceScene`]:
//! - every scene root hangs under a synthetic `gltf_root` node;
//! - each primitive of a node's mesh becomes one [`SourceMesh`], with the
//!   node's skin joints as bones (inverse bind matrices as offsets);
//! - channels of one animation that target the same node are merged.
//!
//! glTF keyframes are in seconds and clamp outside their range, so clips are
//! imported at 1 tick per second with `Constant` extrapolation on both ends.

use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use gltf::animation::Interpolation;
use gltf::animation::util::ReadOutputs;
use rustc_hash::FxHashMap;

use crate::animation::tracks::ExtrapolationPolicy;
use crate::assets::source::{
    SourceAnimation, SourceBone, SourceChannel, SourceInfluence, SourceKey, SourceMesh,
    SourceNode, SourceScene, SourceVertexInfluences,
};
use crate::errors::{Result, SkinningError};

const ROOT_NODE_NAME: &str = "gltf_root";

/// Reads a `.gltf`/`.glb` file (and its external buffers).
pub fn load_source_scene(path: &Path) -> Result<SourceScene> {
    let (document, buffers, _images) = gltf::import(path)?;
    log::info!("Importing glTF '{}'", path.display());
    Ok(import_document(&document, &buffers))
}

/// Reads a self-contained glTF/GLB held in memory.
pub fn load_source_scene_from_slice(bytes: &[u8]) -> Result<SourceScene> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    Ok(import_document(&document, &buffers))
}

/// Converts an already imported document.
#[must_use]
pub fn import_document(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> SourceScene {
    let node_names: Vec<String> = document.nodes().map(|node| node_name(&node)).collect();

    // 1. Meshes (one per primitive), remembered per owning node
    let mut meshes = Vec::new();
    let mut node_meshes: Vec<Vec<usize>> = vec![Vec::new(); node_names.len()];

    for node in document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };

        let bones = node
            .skin()
            .map(|skin| read_skin_bones(&skin, buffers, &node_names))
            .unwrap_or_default();

        let mesh_name = mesh
            .name()
            .map_or_else(|| format!("Mesh_{}", mesh.index()), str::to_string);
        let primitive_count = mesh.primitives().count();

        for primitive in mesh.primitives() {
            let name = if primitive_count > 1 {
                format!("{mesh_name}_{}", primitive.index())
            } else {
                mesh_name.clone()
            };

            node_meshes[node.index()].push(meshes.len());
            meshes.push(read_primitive(&primitive, name, &bones, buffers));
        }
    }

    // 2. Hierarchy
    let scene = document.default_scene().or_else(|| document.scenes().next());
    let scene_roots: Vec<gltf::Node> = match scene {
        Some(scene) => scene.nodes().collect(),
        None => {
            // no scene: every node nobody lists as a child is a root
            let mut has_parent = vec![false; node_names.len()];
            for node in document.nodes() {
                for child in node.children() {
                    has_parent[child.index()] = true;
                }
            }
            document.nodes().filter(|node| !has_parent[node.index()]).collect()
        }
    };

    let mut root = SourceNode::new(ROOT_NODE_NAME, Mat4::IDENTITY);
    root.children = scene_roots
        .iter()
        .map(|node| build_node(node, &node_names, &node_meshes))
        .collect();

    // 3. Animations
    let animations = document
        .animations()
        .map(|animation| read_animation(&animation, buffers, &node_names))
        .collect();

    SourceScene {
        root: Some(root),
        meshes,
        animations,
    }
}

fn buffer_data<'s>(
    buffers: &'s [gltf::buffer::Data],
    buffer: gltf::Buffer<'_>,
) -> Option<&'s [u8]> {
    buffers.get(buffer.index()).map(|data| data.0.as_slice())
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map_or_else(|| format!("Node_{}", node.index()), str::to_string)
}

fn build_node(node: &gltf::Node, names: &[String], node_meshes: &[Vec<usize>]) -> SourceNode {
    SourceNode {
        name: names[node.index()].clone(),
        transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
        meshes: node_meshes[node.index()].clone(),
        children: node
            .children()
            .map(|child| build_node(&child, names, node_meshes))
            .collect(),
    }
}

fn read_skin_bones(
    skin: &gltf::Skin,
    buffers: &[gltf::buffer::Data],
    names: &[String],
) -> Vec<SourceBone> {
    let reader = skin.reader(|buffer| buffer_data(buffers, buffer));
    let inverse_bind_matrices: Vec<Mat4> = reader
        .read_inverse_bind_matrices()
        .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
        .unwrap_or_default();

    skin.joints()
        .enumerate()
        .map(|(i, joint)| SourceBone {
            name: names[joint.index()].clone(),
            offset: inverse_bind_matrices.get(i).copied().unwrap_or(Mat4::IDENTITY),
        })
        .collect()
}

fn read_primitive(
    primitive: &gltf::Primitive,
    name: String,
    bones: &[SourceBone],
    buffers: &[gltf::buffer::Data],
) -> SourceMesh {
    let reader = primitive.reader(|buffer| buffer_data(buffers, buffer));

    let vertex_count = reader.read_positions().map_or(0, Iterator::count);
    let triangle_count = match primitive.mode() {
        gltf::mesh::Mode::Triangles => {
            reader.read_indices().map_or(vertex_count, |indices| indices.into_u32().count()) / 3
        }
        _ => 0,
    };

    let skin_attributes = (reader.read_joints(0), reader.read_weights(0));
    let influences: Vec<SourceVertexInfluences> = match skin_attributes {
        (Some(joints), Some(weights)) if !bones.is_empty() => joints
            .into_u16()
            .zip(weights.into_f32())
            .map(|(joints, weights)| {
                joints
                    .iter()
                    .zip(weights)
                    .filter(|(_, weight)| *weight > 0.0)
                    .map(|(&bone, weight)| SourceInfluence {
                        bone: usize::from(bone),
                        weight,
                    })
                    .collect()
            })
            .collect(),
        _ => Vec::new(),
    };

    SourceMesh {
        name,
        vertex_count,
        triangle_count,
        bones: bones.to_vec(),
        influences,
    }
}

fn read_animation(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    names: &[String],
) -> SourceAnimation {
    let name = animation
        .name()
        .map_or_else(|| format!("Animation_{}", animation.index()), str::to_string);

    let mut channels: Vec<SourceChannel> = Vec::new();
    let mut channel_by_node: FxHashMap<usize, usize> = FxHashMap::default();

    for channel in animation.channels() {
        let node = channel.target().node();
        let reader = channel.reader(|buffer| buffer_data(buffers, buffer));

        let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs()) else {
            log::warn!("Animation '{name}' has a channel without sampler data, skipping");
            continue;
        };
        let times: Vec<f32> = inputs.collect();

        let interpolation = channel.sampler().interpolation();
        if interpolation == Interpolation::Step {
            log::debug!("Step keys of '{}' are interpolated linearly", names[node.index()]);
        }

        let slot = *channel_by_node.entry(node.index()).or_insert_with(|| {
            let mut merged = SourceChannel::new(names[node.index()].clone());
            merged.pre_state = ExtrapolationPolicy::CONSTANT_CODE;
            merged.post_state = ExtrapolationPolicy::CONSTANT_CODE;
            channels.push(merged);
            channels.len() - 1
        });
        let target = &mut channels[slot];

        let node_name = target.node_name.as_str();
        match outputs {
            ReadOutputs::Translations(iter) => {
                let values = iter.map(Vec3::from_array).collect();
                target.translation_keys =
                    keyframes_or_empty(node_name, "translation", &times, values, interpolation);
            }
            ReadOutputs::Rotations(iter) => {
                let values = iter.into_f32().map(Quat::from_array).collect();
                target.rotation_keys =
                    keyframes_or_empty(node_name, "rotation", &times, values, interpolation);
            }
            ReadOutputs::Scales(iter) => {
                let values = iter.map(Vec3::from_array).collect();
                target.scaling_keys =
                    keyframes_or_empty(node_name, "scaling", &times, values, interpolation);
            }
            ReadOutputs::MorphTargetWeights(_) => {
                log::debug!("Skipping morph target weights of '{node_name}'");
            }
        }
    }

    SourceAnimation {
        name,
        ticks_per_second: 1.0,
        channels,
    }
}

fn keyframes_or_empty<T: Copy>(
    node_name: &str,
    component: &str,
    times: &[f32],
    values: Vec<T>,
    interpolation: Interpolation,
) -> Vec<SourceKey<T>> {
    keyframes(times, values, interpolation).unwrap_or_else(|err| {
        log::warn!("Dropping {component} keys of '{node_name}': {err}");
        Vec::new()
    })
}

/// Pairs key times with values. Cubic spline samplers store
/// `(in tangent, value, out tangent)` per key; only the value is kept.
///
/// A sampler whose output count does not match its input count is rejected
/// rather than truncated.
fn keyframes<T: Copy>(
    times: &[f32],
    values: Vec<T>,
    interpolation: Interpolation,
) -> Result<Vec<SourceKey<T>>> {
    let values: Vec<T> = if interpolation == Interpolation::CubicSpline {
        if values.len() % 3 != 0 {
            return Err(SkinningError::KeyframeCountMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        values.chunks_exact(3).map(|triple| triple[1]).collect()
    } else {
        values
    };

    if values.len() != times.len() {
        return Err(SkinningError::KeyframeCountMismatch {
            times: times.len(),
            values: values.len(),
        });
    }

    Ok(times
        .iter()
        .zip(values)
        .map(|(&time, value)| SourceKey::new(time, value))
        .collect())
}
