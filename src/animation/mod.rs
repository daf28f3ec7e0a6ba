mod values;
pub mod tracks;
pub mod channel;
pub mod clip;
pub mod player;

pub use values::Interpolatable;
pub use tracks::{KeyframeTrack, Extrapolation, ExtrapolationPolicy};
pub use channel::AnimationChannel;
pub use clip::AnimationClip;
pub use player::AnimationPlayer;
