use crate::animation::values::Interpolatable;
use crate::errors::{Result, SkinningError};

/// How a track is evaluated outside its keyed time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ExtrapolationPolicy {
    /// Fall back to the track's rest value (zero translation, unit scale,
    /// identity rotation).
    #[default]
    Hold,
    /// Keep the value of the nearest key.
    Constant,
}

impl ExtrapolationPolicy {
    pub const HOLD_CODE: u32 = 0;
    pub const CONSTANT_CODE: u32 = 1;

    /// Maps an importer behaviour code onto a policy.
    ///
    /// Only codes 0 and 1 are implemented; anything else (linear or
    /// repeating extrapolation) is rejected so the caller can report it
    /// and substitute [`Hold`](Self::Hold).
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            Self::HOLD_CODE => Ok(Self::Hold),
            Self::CONSTANT_CODE => Ok(Self::Constant),
            _ => Err(SkinningError::UnsupportedExtrapolation { code }),
        }
    }

    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Hold => Self::HOLD_CODE,
            Self::Constant => Self::CONSTANT_CODE,
        }
    }
}

/// Pre/post extrapolation pair shared by all tracks of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Extrapolation {
    pub pre: ExtrapolationPolicy,
    pub post: ExtrapolationPolicy,
}

impl Extrapolation {
    #[must_use]
    pub const fn new(pre: ExtrapolationPolicy, post: ExtrapolationPolicy) -> Self {
        Self { pre, post }
    }

    /// Both ends hold the nearest key.
    pub const CLAMP: Self = Self::new(ExtrapolationPolicy::Constant, ExtrapolationPolicy::Constant);
}

/// Time-ordered samples of one transform component.
///
/// The reciprocal of every key interval is computed once at construction so
/// sampling never divides.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
    /// `inverse_deltas[i] == 1.0 / (times[i + 1] - times[i])`
    inverse_deltas: Vec<f32>,
    /// Returned for empty tracks and by [`ExtrapolationPolicy::Hold`].
    rest: T,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track, validating that `times` and `values` pair up, that
    /// the key times are finite and strictly increasing, and that every
    /// value is finite.
    pub fn try_new(times: Vec<f32>, values: Vec<T>, rest: T) -> Result<Self> {
        if times.len() != values.len() {
            return Err(SkinningError::KeyframeCountMismatch {
                times: times.len(),
                values: values.len(),
            });
        }

        if let Some(index) = times.iter().position(|t| !t.is_finite()) {
            return Err(SkinningError::UnsortedKeyframes { index });
        }

        if let Some(index) = times.windows(2).position(|w| w[0] >= w[1]) {
            return Err(SkinningError::UnsortedKeyframes { index: index + 1 });
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite_value()) {
            return Err(SkinningError::NonFiniteKeyframe { index });
        }

        let inverse_deltas = times.windows(2).map(|w| 1.0 / (w[1] - w[0])).collect();

        Ok(Self {
            times,
            values,
            inverse_deltas,
            rest,
        })
    }

    /// A track without keys; always samples to `rest`.
    #[must_use]
    pub fn empty(rest: T) -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
            inverse_deltas: Vec::new(),
            rest,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    #[must_use]
    pub fn inverse_deltas(&self) -> &[f32] {
        &self.inverse_deltas
    }

    #[inline]
    #[must_use]
    pub fn rest_value(&self) -> T {
        self.rest
    }

    #[inline]
    #[must_use]
    pub fn first_time(&self) -> Option<f32> {
        self.times.first().copied()
    }

    #[inline]
    #[must_use]
    pub fn last_time(&self) -> Option<f32> {
        self.times.last().copied()
    }

    /// Samples the track at `time`.
    ///
    /// - No keys: the rest value.
    /// - Before the first key: `extrapolation.pre`.
    /// - After the last key: `extrapolation.post`.
    /// - Exactly on a key: that key's value.
    /// - Otherwise: interpolation between the bracketing keys.
    #[must_use]
    pub fn sample(&self, time: f32, extrapolation: Extrapolation) -> T {
        let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) else {
            return self.rest;
        };

        if time.is_nan() {
            return self.rest;
        }

        if time < first {
            return match extrapolation.pre {
                ExtrapolationPolicy::Hold => self.rest,
                ExtrapolationPolicy::Constant => self.values[0],
            };
        }

        let last_index = self.times.len() - 1;

        if time > last {
            return match extrapolation.post {
                ExtrapolationPolicy::Hold => self.rest,
                ExtrapolationPolicy::Constant => self.values[last_index],
            };
        }

        // Covers single-key tracks as well: first <= time <= last == first.
        if time >= last {
            return self.values[last_index];
        }

        let index = self.interval_index(time);
        let t = ((time - self.times[index]) * self.inverse_deltas[index]).clamp(0.0, 1.0);

        T::interpolate_linear(self.values[index], self.values[index + 1], t)
    }

    /// Left bracket of the interval holding `time`, for `first <= time < last`.
    ///
    /// A time equal to a key resolves to that key, so the fraction is 0.
    fn interval_index(&self, time: f32) -> usize {
        // first index whose time is strictly after `time`
        let next = self.times.partition_point(|&t| t <= time);
        next.saturating_sub(1).min(self.times.len() - 2)
    }
}
