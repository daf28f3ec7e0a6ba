//! Scene graph, skeleton and pose tests
//!
//! Tests for:
//! - NodeGraph pre-order flattening and name lookup
//! - Bone binding and parent bone derivation
//! - PoseEvaluator hierarchy composition, offsets and looping
//! - Clips bound to a different graph
//! - wrap_time edge cases

use glam::{Affine3A, Mat4, Quat, Vec3};
use myth_skinning::animation::{AnimationChannel, AnimationClip, Extrapolation, KeyframeTrack};
use myth_skinning::assets::SourceNode;
use myth_skinning::errors::{LoadReport, SkinningError};
use myth_skinning::scene::{NO_PARENT_BONE, NodeGraph, Pose, PoseEvaluator, Skeleton, wrap_time};
use std::f32::consts::FRAC_PI_2;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn node(name: &str, transform: Mat4) -> SourceNode {
    SourceNode::new(name, transform)
}

/// root -> hips -> (mid -> spine), tail
fn biped() -> SourceNode {
    node("root", Mat4::IDENTITY).with_child(
        node("hips", Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .with_child(
                node("mid", Mat4::from_translation(Vec3::Y))
                    .with_child(node("spine", Mat4::from_rotation_z(0.3))),
            )
            .with_child(node("tail", Mat4::from_translation(Vec3::NEG_Z))),
    )
}

fn bound_skeleton(graph: &mut NodeGraph, bones: &[&str]) -> (Skeleton, LoadReport) {
    let mut skeleton = Skeleton::new();
    for name in bones {
        skeleton.register(name, Mat4::IDENTITY);
    }
    let mut report = LoadReport::new();
    graph.attach_bones(&mut skeleton, &mut report);
    (skeleton, report)
}

fn translation_channel(node: &str, keys: &[(f32, Vec3)]) -> AnimationChannel {
    AnimationChannel::from_tracks(
        node,
        KeyframeTrack::try_new(
            keys.iter().map(|(t, _)| *t).collect(),
            keys.iter().map(|(_, v)| *v).collect(),
            Vec3::ZERO,
        )
        .unwrap(),
        KeyframeTrack::empty(Quat::IDENTITY),
        KeyframeTrack::empty(Vec3::ONE),
        Extrapolation::CLAMP,
    )
}

fn assert_pose_finite(pose: &Pose) {
    for (bone, matrix) in pose.matrices().iter().enumerate() {
        assert!(matrix.is_finite(), "bone {bone} is not finite: {matrix}");
    }
}

// ============================================================================
// NodeGraph
// ============================================================================

#[test]
fn every_node_follows_its_parent() {
    // wide and deep tree
    let mut root = node("root", Mat4::IDENTITY);
    for i in 0..4 {
        let mut branch = node(&format!("b{i}"), Mat4::IDENTITY);
        let mut chain = node(&format!("b{i}_leaf"), Mat4::IDENTITY);
        for depth in (0..i * 3).rev() {
            chain = node(&format!("b{i}_{depth}"), Mat4::IDENTITY).with_child(chain);
        }
        branch = branch.with_child(chain).with_child(node(&format!("b{i}_side"), Mat4::IDENTITY));
        root = root.with_child(branch);
    }

    let graph = NodeGraph::build_from_source(&root);
    let position: Vec<usize> = {
        let mut position = vec![usize::MAX; graph.len()];
        for (i, id) in graph.order().iter().enumerate() {
            position[id.index()] = i;
        }
        position
    };

    assert_eq!(graph.order().len(), graph.len());
    for (id, n) in graph.iter() {
        if let Some(parent) = n.parent() {
            assert!(
                position[parent.index()] < position[id.index()],
                "'{}' precedes its parent",
                n.name()
            );
        }
    }
}

#[test]
fn graph_links_parents_and_children() {
    let graph = NodeGraph::build_from_source(&biped());
    let hips = graph.node_by_name("hips").unwrap();
    let spine = graph.node_by_name("spine").unwrap();
    let mid = graph.node_by_name("mid").unwrap();

    assert_eq!(graph.root(), graph.node_by_name("root").unwrap());
    assert_eq!(graph.get(hips).unwrap().children().len(), 2);
    assert_eq!(graph.get(spine).unwrap().parent(), Some(mid));

    let ancestors: Vec<_> = graph
        .ancestors(spine)
        .map(|id| graph.get(id).unwrap().name())
        .collect();
    assert_eq!(ancestors, ["mid", "hips", "root"]);
    assert_eq!(graph.ancestors(graph.root()).count(), 0);
}

#[test]
fn graph_name_lookup_prefers_first_duplicate() {
    init_logger();
    let root = node("root", Mat4::IDENTITY)
        .with_child(node("arm", Mat4::from_translation(Vec3::X)))
        .with_child(node("arm", Mat4::from_translation(Vec3::Y)));
    let graph = NodeGraph::build_from_source(&root);

    assert_eq!(graph.len(), 3);
    assert_eq!(graph.name_map().len(), 2);
    let arm = graph.find("arm").unwrap();
    assert_eq!(Vec3::from(arm.local_transform().translation), Vec3::X);
    assert!(graph.find("leg").is_none());
}

#[test]
fn graph_keeps_mesh_attachments() {
    let root = node("root", Mat4::IDENTITY)
        .with_child(node("body", Mat4::IDENTITY).with_mesh(0).with_mesh(2));
    let graph = NodeGraph::build_from_source(&root);
    assert_eq!(graph.find("body").unwrap().meshes(), [0, 2]);
    assert!(graph.find("root").unwrap().meshes().is_empty());
}

// ============================================================================
// Skeleton
// ============================================================================

#[test]
fn bones_bind_to_nodes_and_inherit_nearest_bone_parent() {
    let mut graph = NodeGraph::build_from_source(&biped());
    let (skeleton, report) = bound_skeleton(&mut graph, &["spine", "hips", "tail"]);

    assert!(report.is_clean());
    // "mid" is not a bone, so spine's parent bone is hips
    assert_eq!(skeleton.find("spine").unwrap().parent(), Some(1));
    assert_eq!(skeleton.find("hips").unwrap().parent(), None);
    assert_eq!(skeleton.find("tail").unwrap().parent(), Some(1));
    assert_eq!(skeleton.parent_indices(), [1, NO_PARENT_BONE, 1]);

    let hips = graph.node_by_name("hips").unwrap();
    assert_eq!(graph.get(hips).unwrap().bone(), Some(1));
    assert_eq!(skeleton.bones()[1].node(), Some(hips));
}

#[test]
fn skeleton_register_deduplicates_by_name() {
    init_logger();
    let mut skeleton = Skeleton::new();
    let a = skeleton.register("hips", Mat4::IDENTITY);
    let b = skeleton.register("spine", Mat4::IDENTITY);
    let again = skeleton.register("hips", Mat4::from_translation(Vec3::X));

    assert_eq!((a, b, again), (0, 1, 0));
    assert_eq!(skeleton.len(), 2);
    // first declaration wins
    assert_eq!(*skeleton.bones()[0].offset(), Affine3A::IDENTITY);
}

#[test]
fn unresolved_bone_is_reported_and_left_unbound() {
    init_logger();
    let mut graph = NodeGraph::build_from_source(&biped());
    let (skeleton, report) = bound_skeleton(&mut graph, &["hips", "ghost"]);

    assert_eq!(report.len(), 1);
    assert!(matches!(
        &report.warnings[0],
        SkinningError::UnresolvedBone { bone } if bone == "ghost"
    ));
    let unbound: Vec<_> = skeleton.unbound().map(|bone| bone.name()).collect();
    assert_eq!(unbound, ["ghost"]);
    assert_eq!(skeleton.parent_indices(), [NO_PARENT_BONE, NO_PARENT_BONE]);
}

// ============================================================================
// PoseEvaluator
// ============================================================================

#[test]
fn child_world_transform_composes_parent() {
    let root = node("root", Mat4::IDENTITY)
        .with_child(node("child", Mat4::from_translation(Vec3::X)));
    let graph = NodeGraph::build_from_source(&root);
    let skeleton = Skeleton::new();
    let clip = AnimationClip::from_channels("still", 0.0, Vec::new(), &graph);
    let child = graph.node_by_name("child").unwrap();

    let mut evaluator = PoseEvaluator::new(&graph, &skeleton);
    for time in [0.0, 0.5, 3.7, -12.0] {
        let pose = evaluator.evaluate(&clip, time);
        assert!(pose.is_empty());
        let world = evaluator.world_transform(child).unwrap();
        assert!(vec3_approx(world.translation.into(), Vec3::X), "t={time}");
    }
}

#[test]
fn world_applies_parent_rotation_to_child_offset() {
    let root = node("root", Mat4::from_rotation_z(FRAC_PI_2))
        .with_child(node("child", Mat4::from_translation(Vec3::X)));
    let graph = NodeGraph::build_from_source(&root);
    let skeleton = Skeleton::new();

    let mut evaluator = PoseEvaluator::new(&graph, &skeleton);
    let _ = evaluator.bind_pose();
    let world = evaluator.world_transform(graph.node_by_name("child").unwrap()).unwrap();
    assert!(vec3_approx(world.translation.into(), Vec3::Y));
}

#[test]
fn bind_pose_with_inverse_bind_offset_is_identity() {
    let root_local = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let arm_local = Mat4::from_scale_rotation_translation(
        Vec3::splat(1.5),
        Quat::from_rotation_z(0.7),
        Vec3::new(1.0, 0.0, -0.5),
    );
    let bind_world = root_local * arm_local;

    let source = node("root", root_local).with_child(node("arm", arm_local));
    let mut graph = NodeGraph::build_from_source(&source);
    let mut skeleton = Skeleton::new();
    skeleton.register("arm", bind_world.inverse());
    let mut report = LoadReport::new();
    graph.attach_bones(&mut skeleton, &mut report);

    let pose = PoseEvaluator::new(&graph, &skeleton).bind_pose();
    assert_eq!(pose.len(), 1);
    assert!(
        pose.matrices()[0].abs_diff_eq(Mat4::IDENTITY, 1e-4),
        "got {}",
        pose.matrices()[0]
    );
}

#[test]
fn animated_parent_moves_child_bone() {
    let mut graph = NodeGraph::build_from_source(&biped());
    let (skeleton, _) = bound_skeleton(&mut graph, &["hips", "tail"]);
    let clip = AnimationClip::from_channels(
        "slide",
        0.0,
        vec![translation_channel("hips", &[(0.0, Vec3::ZERO), (2.0, Vec3::new(4.0, 0.0, 0.0))])],
        &graph,
    );

    let pose = PoseEvaluator::new(&graph, &skeleton).evaluate(&clip, 1.0);
    // the channel replaces the hips bind translation
    let hips = pose.matrices()[0].transform_point3(Vec3::ZERO);
    let tail = pose.matrices()[1].transform_point3(Vec3::ZERO);
    assert!(vec3_approx(hips, Vec3::new(2.0, 0.0, 0.0)), "hips at {hips}");
    assert!(vec3_approx(tail, Vec3::new(2.0, 0.0, -1.0)), "tail at {tail}");
}

#[test]
fn pose_covers_every_bone_with_finite_matrices() {
    let mut graph = NodeGraph::build_from_source(&biped());
    let (skeleton, _) = bound_skeleton(&mut graph, &["spine", "hips", "tail"]);
    let clip = AnimationClip::from_channels(
        "wiggle",
        24.0,
        vec![
            translation_channel("hips", &[(0.0, Vec3::ZERO), (1.0, Vec3::Y), (3.0, Vec3::X)]),
            translation_channel("spine", &[(0.5, Vec3::Z), (2.0, Vec3::NEG_Z)]),
        ],
        &graph,
    );

    let mut evaluator = PoseEvaluator::new(&graph, &skeleton);
    for i in 0..=30 {
        let pose = evaluator.evaluate(&clip, i as f32 * 0.1);
        assert_eq!(pose.len(), skeleton.len());
        assert_pose_finite(&pose);
    }
}

#[test]
fn unbound_bones_stay_identity() {
    init_logger();
    let mut graph = NodeGraph::build_from_source(&biped());
    let (skeleton, _) = bound_skeleton(&mut graph, &["ghost", "hips"]);

    let pose = PoseEvaluator::new(&graph, &skeleton).bind_pose();
    assert_eq!(pose.matrices()[0], Mat4::IDENTITY);
    assert!(pose.matrices()[1].abs_diff_eq(Mat4::from_translation(Vec3::Y), EPSILON));
}

#[test]
fn evaluation_loops_by_whole_durations() {
    let mut graph = NodeGraph::build_from_source(&biped());
    let (skeleton, _) = bound_skeleton(&mut graph, &["hips", "spine"]);
    let clip = AnimationClip::from_channels(
        "loop",
        0.0,
        vec![translation_channel("hips", &[(0.0, Vec3::ZERO), (2.0, Vec3::new(8.0, 2.0, 0.0))])],
        &graph,
    );
    assert_eq!(clip.duration(), 2.0);

    let mut evaluator = PoseEvaluator::new(&graph, &skeleton);
    let base = evaluator.evaluate(&clip, 0.25);
    for k in [1.0, 3.0, -1.0, -4.0] {
        let looped = evaluator.evaluate(&clip, 0.25 + k * 2.0);
        assert_eq!(looped, base, "k={k}");
    }
}

#[test]
fn evaluate_into_reuses_and_resizes_output() {
    let mut graph = NodeGraph::build_from_source(&biped());
    let (skeleton, _) = bound_skeleton(&mut graph, &["hips", "spine", "tail"]);
    let clip = AnimationClip::from_channels("empty", 0.0, Vec::new(), &graph);

    let mut pose = Pose::identity(1);
    let mut evaluator = PoseEvaluator::new(&graph, &skeleton);
    evaluator.evaluate_into(Some(&clip), 0.0, &mut pose);

    assert_eq!(pose.len(), 3);
    assert_eq!(pose.as_bytes().len(), 3 * 64);
    assert_eq!(evaluator.world_transforms().len(), graph.len());
}

#[test]
fn clip_bound_to_another_graph_leaves_bind_pose() {
    init_logger();
    let mut graph = NodeGraph::build_from_source(&biped());
    let (skeleton, _) = bound_skeleton(&mut graph, &["hips", "tail"]);

    // node 1 is "tail" here but "hips" in the biped
    let prop = NodeGraph::build_from_source(
        &node("root", Mat4::IDENTITY).with_child(node("tail", Mat4::IDENTITY)),
    );
    let clip = AnimationClip::from_channels(
        "wag",
        0.0,
        vec![translation_channel("tail", &[(0.0, Vec3::X * 5.0), (1.0, Vec3::X * 5.0)])],
        &prop,
    );
    assert_eq!(clip.node_count(), prop.len());
    assert_ne!(clip.node_count(), graph.len());

    let mut evaluator = PoseEvaluator::new(&graph, &skeleton);
    let bind = evaluator.bind_pose();
    let pose = evaluator.evaluate(&clip, 0.5);
    assert_eq!(pose, bind);
}

// ============================================================================
// wrap_time
// ============================================================================

#[test]
fn wrap_time_stays_in_range() {
    assert_eq!(wrap_time(5.0, 2.0), 1.0);
    assert_eq!(wrap_time(-0.5, 2.0), 1.5);
    assert_eq!(wrap_time(4.0, 2.0), 0.0);
    assert_eq!(wrap_time(1.5, 2.0), 1.5);
}

#[test]
fn wrap_time_handles_degenerate_inputs() {
    assert_eq!(wrap_time(3.0, 0.0), 0.0);
    assert_eq!(wrap_time(3.0, -1.0), 0.0);
    assert_eq!(wrap_time(f32::NAN, 2.0), 0.0);
    assert_eq!(wrap_time(f32::INFINITY, 2.0), 0.0);
    assert_eq!(wrap_time(1.0, f32::INFINITY), 0.0);
}
