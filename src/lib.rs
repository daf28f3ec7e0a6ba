#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Animated model pipeline for the Myth engine.
//!
//! Loads skinned, animated models into an immutable node graph, bone array
//! and clip list, evaluates per-frame bone matrices and uploads them to GPU
//! storage buffers for hardware skinning.
//!
//! ```rust,ignore
//! use myth_skinning::{AnimatedModel, AnimationPlayer, ModelSettings, SkinningSlots};
//!
//! let (model, report) =
//!     myth_skinning::assets::load_gltf_model("fox.glb", ModelSettings::default())?;
//! let mut player = AnimationPlayer::new(0, model.settings().default_ticks_per_second);
//! let mut evaluator = model.pose_evaluator();
//!
//! // every frame
//! let clip = &model.animation_clips()[player.clip_index];
//! player.advance(dt, clip);
//! let pose = evaluator.evaluate(clip, player.ticks(clip));
//! model.upload_pose(&mut skinning_buffers, &pose, SkinningSlots::default());
//! ```

pub mod errors;
pub mod settings;
pub mod animation;
pub mod scene;
pub mod assets;
pub mod renderer;

pub use errors::{LoadReport, Result, SkinningError};
pub use settings::{ModelSettings, SkinningBufferSettings, MAX_BONE_INFLUENCES};
pub use animation::{
    AnimationChannel, AnimationClip, AnimationPlayer, Extrapolation, ExtrapolationPolicy,
    KeyframeTrack,
};
pub use scene::{Bone, NodeGraph, NodeId, Pose, PoseEvaluator, Skeleton};
pub use assets::{AnimatedModel, SkinnedMesh, SkinningSlots, SourceScene};
pub use renderer::{BoneBufferSink, SkinningBuffers};
