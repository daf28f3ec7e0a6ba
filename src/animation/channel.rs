use glam::{Affine3A, Quat, Vec3, Vec4};

use crate::animation::tracks::{Extrapolation, ExtrapolationPolicy, KeyframeTrack};
use crate::animation::values::Interpolatable;
use crate::assets::source::{SourceChannel, SourceKey};
use crate::errors::LoadReport;
use crate::scene::skeleton::Skeleton;

/// Translation, rotation and scale tracks driving one named node.
#[derive(Debug, Clone)]
pub struct AnimationChannel {
    node_name: String,
    translation: KeyframeTrack<Vec3>,
    rotation: KeyframeTrack<Quat>,
    scaling: KeyframeTrack<Vec3>,
    extrapolation: Extrapolation,
    /// Set when the target node is also a skinning bone. Informational only:
    /// pose evaluation writes bone matrices through the node's own binding.
    bone: Option<usize>,
}

impl AnimationChannel {
    /// Builds a channel from imported keyframes.
    ///
    /// Unsupported extrapolation codes and malformed tracks are reported and
    /// replaced (by `Hold` and by an empty track respectively); the channel
    /// itself is always produced. Rotation keys are normalized first; a key
    /// with zero or non-finite length rejects the whole rotation track.
    pub fn load_from_source(
        source: &SourceChannel,
        skeleton: &Skeleton,
        report: &mut LoadReport,
    ) -> Self {
        log::debug!(
            "Loading animation channel for node '{}': {} translation, {} rotation, \
             {} scaling keys (pre {}, post {})",
            source.node_name,
            source.translation_keys.len(),
            source.rotation_keys.len(),
            source.scaling_keys.len(),
            source.pre_state,
            source.post_state,
        );

        let extrapolation = Extrapolation {
            pre: policy_or_hold(source.pre_state, report),
            post: policy_or_hold(source.post_state, report),
        };

        let node_name = source.node_name.as_str();
        let translation = load_track(
            node_name,
            "translation",
            &source.translation_keys,
            Vec3::ZERO,
            report,
        );
        let scaling = load_track(
            node_name,
            "scaling",
            &source.scaling_keys,
            Vec3::ONE,
            report,
        );
        let rotation = {
            let keys: Vec<_> = source
                .rotation_keys
                .iter()
                .map(|key| SourceKey::new(key.time, normalized_or_nan(key.value)))
                .collect();
            load_track(node_name, "rotation", &keys, Quat::IDENTITY, report)
        };

        let bone = skeleton.index_of(node_name);
        if bone.is_none() {
            log::debug!("Channel '{node_name}' animates a plain node (no bone)");
        }

        Self {
            node_name: source.node_name.clone(),
            translation,
            rotation,
            scaling,
            extrapolation,
            bone,
        }
    }

    /// Builds a channel from already validated tracks.
    #[must_use]
    pub fn from_tracks(
        node_name: impl Into<String>,
        translation: KeyframeTrack<Vec3>,
        rotation: KeyframeTrack<Quat>,
        scaling: KeyframeTrack<Vec3>,
        extrapolation: Extrapolation,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            translation,
            rotation,
            scaling,
            extrapolation,
            bone: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn target_node_name(&self) -> &str {
        &self.node_name
    }

    /// Bone slot of the target node, if it is a bone.
    ///
    /// Kept for inspection; [`PoseEvaluator`](crate::scene::PoseEvaluator)
    /// reads the binding from the node graph instead.
    #[inline]
    #[must_use]
    pub fn bone_index(&self) -> Option<usize> {
        self.bone
    }

    #[inline]
    #[must_use]
    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    #[inline]
    #[must_use]
    pub fn translation_track(&self) -> &KeyframeTrack<Vec3> {
        &self.translation
    }

    #[inline]
    #[must_use]
    pub fn rotation_track(&self) -> &KeyframeTrack<Quat> {
        &self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scaling_track(&self) -> &KeyframeTrack<Vec3> {
        &self.scaling
    }

    /// Latest key time over all three tracks.
    ///
    /// Empty tracks are skipped; a channel without any key returns
    /// `f32::NEG_INFINITY`.
    #[must_use]
    pub fn max_time(&self) -> f32 {
        [
            self.translation.last_time(),
            self.rotation.last_time(),
            self.scaling.last_time(),
        ]
        .into_iter()
        .flatten()
        .fold(f32::NEG_INFINITY, f32::max)
    }

    #[inline]
    #[must_use]
    pub fn evaluate_translation(&self, time: f32) -> Vec3 {
        self.translation.sample(time, self.extrapolation)
    }

    #[inline]
    #[must_use]
    pub fn evaluate_rotation(&self, time: f32) -> Quat {
        self.rotation.sample(time, self.extrapolation)
    }

    #[inline]
    #[must_use]
    pub fn evaluate_scaling(&self, time: f32) -> Vec3 {
        self.scaling.sample(time, self.extrapolation)
    }

    /// `T * R * S` at `time`.
    #[must_use]
    pub fn local_transform(&self, time: f32) -> Affine3A {
        Affine3A::from_scale_rotation_translation(
            self.evaluate_scaling(time),
            self.evaluate_rotation(time),
            self.evaluate_translation(time),
        )
    }
}

fn policy_or_hold(code: u32, report: &mut LoadReport) -> ExtrapolationPolicy {
    ExtrapolationPolicy::from_code(code).unwrap_or_else(|err| {
        report.warn(err);
        ExtrapolationPolicy::Hold
    })
}

/// Degenerate rotations map to `Quat::NAN` so track validation rejects them.
fn normalized_or_nan(rotation: Quat) -> Quat {
    Vec4::from(rotation)
        .try_normalize()
        .map_or(Quat::NAN, Quat::from_vec4)
}

fn load_track<T: Interpolatable>(
    node_name: &str,
    component: &str,
    keys: &[SourceKey<T>],
    rest: T,
    report: &mut LoadReport,
) -> KeyframeTrack<T> {
    let times = keys.iter().map(|key| key.time).collect();
    let values = keys.iter().map(|key| key.value).collect();

    KeyframeTrack::try_new(times, values, rest).unwrap_or_else(|err| {
        log::warn!("Dropping {component} keys of channel '{node_name}'");
        report.warn(err);
        KeyframeTrack::empty(rest)
    })
}
