#![forbid(unsafe_code)]

//! Motion specs: ordered breakpoint tables with per-segment mappings.
//!
//! A [`DirectionalMotionSpec`] is the piecewise mapping for one travel
//! direction: `n` breakpoints (sentinel-bounded, strictly increasing) and
//! `n - 1` mappings, where mapping `i` governs the interval between
//! breakpoints `i` and `i + 1`. A [`MotionSpec`] pairs two directional
//! specs — possibly the same one — with the spring used for segment resets
//! and an optional segment-change hook.
//!
//! # Invariants
//!
//! 1. `breakpoints[0]` is the `-∞` sentinel, `breakpoints[n-1]` the `+∞`
//!    sentinel, and no interior breakpoint is a sentinel.
//! 2. Positions are strictly increasing, so every finite input belongs to
//!    exactly one interval.
//! 3. Keys are unique, so key lookup and segment identity are well defined.
//! 4. An input exactly on `breakpoints[i].position` belongs to interval `i`
//!    (the one starting there); `next_down` of that position belongs to
//!    interval `i - 1`. This tie-break is direction-agnostic at lookup
//!    time; only segment *materialization* flips the entered side for
//!    [`InputDirection::Min`].
//!
//! # Failure Modes
//!
//! - Non-finite lookup input fails with [`InputError::NonFinite`]; it is
//!   never clamped.
//! - A hook returning a segment the input is not valid for is discarded in
//!   favor of the default resolution.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::breakpoint::{Breakpoint, BreakpointKey};
use crate::direction::InputDirection;
use crate::error::{InputError, SpecError};
use crate::mapping::Mapping;
use crate::segment::{SegmentData, SegmentKey};
use crate::spring::SpringParameters;

// ---------------------------------------------------------------------------
// DirectionalMotionSpec
// ---------------------------------------------------------------------------

/// The piecewise mapping for one travel direction.
#[derive(Debug, Clone)]
pub struct DirectionalMotionSpec {
    breakpoints: Arc<[Breakpoint]>,
    mappings: Arc<[Mapping]>,
    key_index: Arc<AHashMap<BreakpointKey, usize>>,
}

impl DirectionalMotionSpec {
    /// Validate and build a spec from its parts.
    ///
    /// Prefer the fluent [`builder`](Self::builder) in application code;
    /// this constructor is the single validation point both go through.
    pub fn new(breakpoints: Vec<Breakpoint>, mappings: Vec<Mapping>) -> Result<Self, SpecError> {
        let n = breakpoints.len();
        if n < 2 {
            return Err(SpecError::TooFewBreakpoints { count: n });
        }
        let first = &breakpoints[0];
        if first.key() != &BreakpointKey::MinLimit || first.position() != f32::NEG_INFINITY {
            return Err(SpecError::MissingSentinel {
                expected: BreakpointKey::MinLimit,
            });
        }
        let last = &breakpoints[n - 1];
        if last.key() != &BreakpointKey::MaxLimit || last.position() != f32::INFINITY {
            return Err(SpecError::MissingSentinel {
                expected: BreakpointKey::MaxLimit,
            });
        }
        for (i, bp) in breakpoints.iter().enumerate().take(n - 1).skip(1) {
            if bp.is_sentinel() || !bp.position().is_finite() {
                return Err(SpecError::InteriorSentinel { index: i });
            }
        }
        for i in 1..n {
            if !(breakpoints[i - 1].position() < breakpoints[i].position()) {
                return Err(SpecError::UnsortedPositions { index: i });
            }
        }
        if mappings.len() != n - 1 {
            return Err(SpecError::MappingCount {
                breakpoints: n,
                mappings: mappings.len(),
            });
        }
        let mut key_index = AHashMap::with_capacity(n);
        for (i, bp) in breakpoints.iter().enumerate() {
            if key_index.insert(bp.key().clone(), i).is_some() {
                return Err(SpecError::DuplicateKey {
                    key: bp.key().clone(),
                });
            }
        }
        Ok(Self {
            breakpoints: breakpoints.into(),
            mappings: mappings.into(),
            key_index: Arc::new(key_index),
        })
    }

    /// Number of breakpoints, sentinels included.
    #[inline]
    #[must_use]
    pub fn breakpoint_count(&self) -> usize {
        self.breakpoints.len()
    }

    /// Number of segments (`breakpoint_count() - 1`).
    #[inline]
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.breakpoints.len() - 1
    }

    /// The breakpoint at `index`.
    #[inline]
    #[must_use]
    pub fn breakpoint(&self, index: usize) -> &Breakpoint {
        &self.breakpoints[index]
    }

    /// The mapping governing the interval between breakpoints `index` and
    /// `index + 1`.
    #[inline]
    #[must_use]
    pub fn mapping(&self, index: usize) -> &Mapping {
        &self.mappings[index]
    }

    /// Highest index `i` with `breakpoints[i].position <= x`.
    ///
    /// Binary search over the sentinel-bounded table; for any finite `x`
    /// the result is in `0..breakpoint_count() - 1`. Non-finite input is
    /// rejected.
    pub fn find_breakpoint_index(&self, x: f32) -> Result<usize, InputError> {
        if !x.is_finite() {
            return Err(InputError::NonFinite { value: x });
        }
        let after = self.breakpoints.partition_point(|bp| bp.position() <= x);
        Ok(after - 1)
    }

    /// Index of the breakpoint with `key`, if present.
    #[must_use]
    pub fn breakpoint_index_of(&self, key: &BreakpointKey) -> Option<usize> {
        self.key_index.get(key).copied()
    }

    /// Index of the segment bounded by `key.min` / `key.max`, ignoring the
    /// key's direction. `None` unless the two keys are adjacent breakpoints
    /// of this spec, in order.
    #[must_use]
    pub fn segment_index_of(&self, key: &SegmentKey) -> Option<usize> {
        let min = self.breakpoint_index_of(&key.min)?;
        let max = self.breakpoint_index_of(&key.max)?;
        (max == min + 1).then_some(min)
    }

    /// Index of the segment containing `x` when travelling in `direction`.
    ///
    /// An input exactly on an interior breakpoint belongs to the interval
    /// *starting* there for [`InputDirection::Max`] and to the interval
    /// *ending* there for [`InputDirection::Min`] — the entered side is
    /// inclusive either way.
    pub fn segment_index_at_input(
        &self,
        x: f32,
        direction: InputDirection,
    ) -> Result<usize, InputError> {
        let mut index = self.find_breakpoint_index(x)?;
        if direction == InputDirection::Min && index > 0 && x == self.breakpoints[index].position()
        {
            index -= 1;
        }
        Ok(index)
    }

    /// Materialize the segment at `index` for `direction`.
    #[must_use]
    pub fn segment(&self, index: usize, direction: InputDirection) -> SegmentData {
        let lower = self.breakpoints[index].clone();
        let upper = self.breakpoints[index + 1].clone();
        let mapping = self.mappings[index].clone();
        match direction {
            InputDirection::Max => SegmentData::new(lower, upper, direction, mapping),
            InputDirection::Min => SegmentData::new(upper, lower, direction, mapping),
        }
    }

    /// Materialize the segment containing `x` when travelling in
    /// `direction`.
    pub fn segment_at_input(
        &self,
        x: f32,
        direction: InputDirection,
    ) -> Result<SegmentData, InputError> {
        Ok(self.segment(self.segment_index_at_input(x, direction)?, direction))
    }
}

// ---------------------------------------------------------------------------
// MotionSpec
// ---------------------------------------------------------------------------

/// Hook consulted when the engine leaves a segment.
///
/// Receives the segment being left, the current input, and the new travel
/// direction. Returning `None` (or a segment the input is not valid for)
/// falls back to the default position lookup.
pub type SegmentChangeHook =
    Arc<dyn Fn(&SegmentData, f32, InputDirection) -> Option<SegmentData> + Send + Sync>;

/// A bidirectional motion spec.
///
/// Immutable; replacing the spec on a running engine is a pointer swap.
#[derive(Clone)]
pub struct MotionSpec {
    max_direction: Arc<DirectionalMotionSpec>,
    min_direction: Arc<DirectionalMotionSpec>,
    reset_spring: SpringParameters,
    segment_change_hook: Option<SegmentChangeHook>,
}

impl MotionSpec {
    /// A spec using `spec` for both travel directions.
    #[must_use]
    pub fn unidirectional(spec: DirectionalMotionSpec, reset_spring: SpringParameters) -> Self {
        let spec = Arc::new(spec);
        Self {
            max_direction: Arc::clone(&spec),
            min_direction: spec,
            reset_spring,
            segment_change_hook: None,
        }
    }

    /// A spec with distinct per-direction mappings.
    #[must_use]
    pub fn bidirectional(
        max_direction: DirectionalMotionSpec,
        min_direction: DirectionalMotionSpec,
        reset_spring: SpringParameters,
    ) -> Self {
        Self {
            max_direction: Arc::new(max_direction),
            min_direction: Arc::new(min_direction),
            reset_spring,
            segment_change_hook: None,
        }
    }

    /// Install a segment-change hook.
    #[must_use]
    pub fn with_segment_change_hook(mut self, hook: SegmentChangeHook) -> Self {
        self.segment_change_hook = Some(hook);
        self
    }

    /// The directional spec for `direction`.
    #[inline]
    #[must_use]
    pub fn direction_spec(&self, direction: InputDirection) -> &Arc<DirectionalMotionSpec> {
        match direction {
            InputDirection::Max => &self.max_direction,
            InputDirection::Min => &self.min_direction,
        }
    }

    /// Whether both directions share one directional spec.
    #[must_use]
    pub fn is_unidirectional(&self) -> bool {
        Arc::ptr_eq(&self.max_direction, &self.min_direction)
    }

    /// Spring used when a segment change is a reset rather than a crossing
    /// (direction flip in place, spec replacement).
    #[inline]
    #[must_use]
    pub fn reset_spring(&self) -> SpringParameters {
        self.reset_spring
    }

    /// Resolve the segment for `input` after leaving `last`.
    ///
    /// Consults the hook first; a hook result must satisfy
    /// [`SegmentData::is_valid_for_input`] or it is discarded.
    pub fn on_change_segment(
        &self,
        last: &SegmentData,
        input: f32,
        direction: InputDirection,
    ) -> Result<SegmentData, InputError> {
        if let Some(hook) = &self.segment_change_hook {
            if let Some(segment) = hook(last, input, direction) {
                if segment.is_valid_for_input(input, direction) {
                    return Ok(segment);
                }
            }
        }
        self.direction_spec(direction).segment_at_input(input, direction)
    }
}

impl fmt::Debug for MotionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionSpec")
            .field("max_direction", &self.max_direction)
            .field("min_direction", &self.min_direction)
            .field("reset_spring", &self.reset_spring)
            .field("has_hook", &self.segment_change_hook.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
