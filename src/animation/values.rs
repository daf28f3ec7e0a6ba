use glam::{Quat, Vec3};

/// A keyframe value that can be blended between two samples.
pub trait Interpolatable: Copy + Clone + Sized {
    /// Blends `start` towards `end` by `t` in `[0, 1]`.
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;

    /// `false` if any component is NaN or infinite.
    fn is_finite_value(self) -> bool;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn is_finite_value(self) -> bool {
        self.is_finite()
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }

    fn is_finite_value(self) -> bool {
        self.is_finite()
    }
}

impl Interpolatable for Quat {
    /// Spherical interpolation along the shortest arc.
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        // slerp drifts off the unit sphere over long chains of keys
        start.slerp(end, t).normalize()
    }

    fn is_finite_value(self) -> bool {
        self.is_finite()
    }
}
