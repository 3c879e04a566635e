#![forbid(unsafe_code)]

//! Breakpoints: boundaries in input space.
//!
//! A breakpoint carries the spring that animates the discontinuity entered
//! at it and an optional guarantee that tightens the spring as the gesture
//! makes progress past it. Every spec is bounded by two sentinels at ±∞ so
//! that segment lookup and validity checks never branch on "am I at the
//! edge of the table".
//!
//! # Invariants
//!
//! 1. Sentinel breakpoints sit at exactly `-∞` / `+∞`, carry no guarantee,
//!    and use the dedicated key variants — user keys can never collide with
//!    them.
//! 2. Guarantee thresholds are finite and positive (validated constructors).

use std::fmt;
use std::sync::Arc;

use crate::error::SpecError;
use crate::spring::SpringParameters;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Stable identity of a breakpoint.
///
/// Identity is by value: two `Named` keys with the same string are the same
/// breakpoint as far as segment comparison is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BreakpointKey {
    /// The lower sentinel at `-∞`.
    MinLimit,
    /// The upper sentinel at `+∞`.
    MaxLimit,
    /// A user-defined breakpoint.
    Named(Arc<str>),
}

impl BreakpointKey {
    /// A named key.
    #[must_use]
    pub fn named(name: impl AsRef<str>) -> Self {
        Self::Named(Arc::from(name.as_ref()))
    }

    /// Whether this is one of the sentinel keys.
    #[inline]
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::MinLimit | Self::MaxLimit)
    }
}

impl fmt::Display for BreakpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLimit => f.write_str("<min>"),
            Self::MaxLimit => f.write_str("<max>"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Guarantees
// ---------------------------------------------------------------------------

/// Completion policy for the discontinuity entered at a breakpoint.
///
/// A guarantee promises that once the gesture has made the stated amount of
/// progress past the breakpoint, the spring has fully caught up: the engine
/// tightens the spring toward [`SpringParameters::SNAP`] in proportion to
/// the progress, reaching it exactly when the threshold is met.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Guarantee {
    /// Never tighten; the spring settles on its own schedule.
    None,
    /// Complete within this much input travel past the breakpoint.
    InputDelta(f32),
    /// Complete within this much accumulated gesture distance.
    GestureDistance(f32),
}

impl Guarantee {
    /// An input-travel guarantee; `delta` must be finite and positive.
    pub fn input_delta(delta: f32) -> Result<Self, SpecError> {
        if !(delta.is_finite() && delta > 0.0) {
            return Err(SpecError::InvalidGuaranteeThreshold { value: delta });
        }
        Ok(Self::InputDelta(delta))
    }

    /// A gesture-distance guarantee; `distance` must be finite and positive.
    pub fn gesture_distance(distance: f32) -> Result<Self, SpecError> {
        if !(distance.is_finite() && distance > 0.0) {
            return Err(SpecError::InvalidGuaranteeThreshold { value: distance });
        }
        Ok(Self::GestureDistance(distance))
    }

    /// The progress denominator, if any.
    #[inline]
    #[must_use]
    pub fn denominator(&self) -> Option<f32> {
        match self {
            Self::None => None,
            Self::InputDelta(d) | Self::GestureDistance(d) => Some(*d),
        }
    }

    /// Whether this guarantee never tightens.
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

// ---------------------------------------------------------------------------
// Breakpoint
// ---------------------------------------------------------------------------

/// A boundary in input space with its spring and guarantee.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    key: BreakpointKey,
    position: f32,
    spring: SpringParameters,
    guarantee: Guarantee,
}

impl Breakpoint {
    /// An interior breakpoint.
    #[must_use]
    pub fn new(
        key: BreakpointKey,
        position: f32,
        spring: SpringParameters,
        guarantee: Guarantee,
    ) -> Self {
        Self {
            key,
            position,
            spring,
            guarantee,
        }
    }

    /// The lower sentinel at `-∞`.
    ///
    /// The spring still matters: a sentinel can be the entry breakpoint of
    /// an unbounded segment, and direction changes animate at the entry
    /// breakpoint's spring.
    #[must_use]
    pub fn min_limit(spring: SpringParameters) -> Self {
        Self {
            key: BreakpointKey::MinLimit,
            position: f32::NEG_INFINITY,
            spring,
            guarantee: Guarantee::None,
        }
    }

    /// The upper sentinel at `+∞`.
    #[must_use]
    pub fn max_limit(spring: SpringParameters) -> Self {
        Self {
            key: BreakpointKey::MaxLimit,
            position: f32::INFINITY,
            spring,
            guarantee: Guarantee::None,
        }
    }

    /// Identity of this breakpoint.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &BreakpointKey {
        &self.key
    }

    /// Position in input space; `±∞` for the sentinels.
    #[inline]
    #[must_use]
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Spring used to animate the discontinuity entered here.
    #[inline]
    #[must_use]
    pub fn spring(&self) -> SpringParameters {
        self.spring
    }

    /// Completion guarantee for that discontinuity.
    #[inline]
    #[must_use]
    pub fn guarantee(&self) -> Guarantee {
        self.guarantee
    }

    /// Whether this is one of the two sentinels.
    #[inline]
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.key.is_sentinel()
    }

    pub(crate) fn set_spring(&mut self, spring: SpringParameters) {
        self.spring = spring;
    }

    pub(crate) fn set_guarantee(&mut self, guarantee: Guarantee) {
        self.guarantee = guarantee;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spring::presets;

    #[test]
    fn named_keys_compare_by_value() {
        assert_eq!(BreakpointKey::named("open"), BreakpointKey::named("open"));
        assert_ne!(BreakpointKey::named("open"), BreakpointKey::named("shut"));
        assert_ne!(BreakpointKey::named("min"), BreakpointKey::MinLimit);
    }

    #[test]
    fn sentinels_sit_at_infinity() {
        let min = Breakpoint::min_limit(presets::standard());
        let max = Breakpoint::max_limit(presets::standard());
        assert_eq!(min.position(), f32::NEG_INFINITY);
        assert_eq!(max.position(), f32::INFINITY);
        assert!(min.is_sentinel() && max.is_sentinel());
        assert!(min.guarantee().is_none());
        assert!(max.guarantee().is_none());
    }

    #[test]
    fn guarantee_thresholds_validated() {
        assert!(Guarantee::input_delta(3.0).is_ok());
        assert!(matches!(
            Guarantee::input_delta(0.0),
            Err(SpecError::InvalidGuaranteeThreshold { .. })
        ));
        assert!(matches!(
            Guarantee::gesture_distance(-1.0),
            Err(SpecError::InvalidGuaranteeThreshold { .. })
        ));
        assert!(matches!(
            Guarantee::gesture_distance(f32::INFINITY),
            Err(SpecError::InvalidGuaranteeThreshold { .. })
        ));
    }

    #[test]
    fn denominator_reads_through() {
        assert_eq!(Guarantee::None.denominator(), None);
        assert_eq!(
            Guarantee::input_delta(3.0).unwrap().denominator(),
            Some(3.0)
        );
        assert_eq!(
            Guarantee::gesture_distance(40.0).unwrap().denominator(),
            Some(40.0)
        );
    }
}
