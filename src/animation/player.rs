use crate::animation::clip::AnimationClip;

/// Playback state for one model instance.
///
/// Time is kept in seconds and converted to clip ticks on demand; the pose
/// evaluator takes care of wrapping ticks into the clip range.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPlayer {
    /// Index into the model's clip list.
    pub clip_index: usize,
    pub time: f32,
    pub speed: f32,
    pub paused: bool,
    /// Used for clips that report 0 ticks per second.
    pub default_ticks_per_second: f32,
}

impl AnimationPlayer {
    #[must_use]
    pub fn new(clip_index: usize, default_ticks_per_second: f32) -> Self {
        Self {
            clip_index,
            time: 0.0,
            speed: 1.0,
            paused: false,
            default_ticks_per_second,
        }
    }

    /// Effective playback rate of `clip`.
    #[must_use]
    pub fn ticks_per_second(&self, clip: &AnimationClip) -> f32 {
        if clip.ticks_per_second() > 0.0 {
            clip.ticks_per_second()
        } else {
            self.default_ticks_per_second
        }
    }

    /// Advances playback by `dt` seconds, looping over `clip`.
    pub fn advance(&mut self, dt: f32, clip: &AnimationClip) {
        if self.paused {
            return;
        }

        self.time += dt * self.speed;

        // keep seconds small so long sessions do not lose precision
        let tps = self.ticks_per_second(clip);
        if tps > 0.0 && clip.duration() > 0.0 {
            let length = clip.duration() / tps;
            self.time = self.time.rem_euclid(length);
        }
    }

    /// Current time in clip ticks.
    #[inline]
    #[must_use]
    pub fn ticks(&self, clip: &AnimationClip) -> f32 {
        self.time * self.ticks_per_second(clip)
    }

    /// Jumps to `seconds` on the current clip.
    pub fn seek(&mut self, seconds: f32) {
        self.time = seconds;
    }

    /// Switches clips and restarts from the beginning.
    pub fn play(&mut self, clip_index: usize) {
        self.clip_index = clip_index;
        self.time = 0.0;
        self.paused = false;
    }
}
