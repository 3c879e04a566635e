#![forbid(unsafe_code)]

//! Fluent spec builders.
//!
//! A spec is written the way it reads: start in the unbounded segment
//! coming from one sentinel, walk breakpoint by breakpoint, and describe
//! each segment either by continuing with a mapping or by jumping to a new
//! output value first. The builder is a typestate machine — each state only
//! offers the transitions that are legal there, so a chain that compiles is
//! structurally well formed:
//!
//! ```text
//! builder ──to_breakpoint──▶ at-breakpoint ──continue_with──▶ builder
//!    │                           │ jump_to / jump_by
//!    │                           ▼
//!    │                        in-jump ──continue_with_constant_value──▶ builder
//!    │                           │     ──continue_with_fractional_input─▶ builder
//!    │                           │ continue_with_target_value
//!    │                           ▼
//!    │                     pending-target ──to_breakpoint──▶ at-breakpoint
//!    └──complete──▶ spec         (at-breakpoint also offers complete_with)
//! ```
//!
//! Positions must be strictly increasing (forward builder) or strictly
//! decreasing (reverse builder). Violations are remembered and reported
//! when the chain completes, keeping the fluent form intact; the resulting
//! spec always passes [`DirectionalMotionSpec::new`] validation or the
//! completion returns the error.
//!
//! A `continue_with_target_value` cannot emit its mapping until the next
//! breakpoint is known — the jump value is buffered in the pending-target
//! state and resolved by the following `to_breakpoint`.

use crate::breakpoint::{Breakpoint, BreakpointKey, Guarantee};
use crate::error::SpecError;
use crate::mapping::Mapping;
use crate::spec::{DirectionalMotionSpec, MotionSpec};
use crate::spring::SpringParameters;

// ---------------------------------------------------------------------------
// Finish targets
// ---------------------------------------------------------------------------

mod sealed {
    pub trait Sealed {}
}

/// What a completed builder chain produces.
///
/// Sealed; the two implementations build a bare [`DirectionalMotionSpec`]
/// or wrap it into a unidirectional [`MotionSpec`].
pub trait BuildTarget: sealed::Sealed + Sized {
    /// The finished spec type.
    type Output;

    #[doc(hidden)]
    fn finish(self, spec: DirectionalMotionSpec) -> Self::Output;
}

/// Finish target producing a [`DirectionalMotionSpec`].
pub struct DirectionalTarget(());

impl sealed::Sealed for DirectionalTarget {}

impl BuildTarget for DirectionalTarget {
    type Output = DirectionalMotionSpec;

    fn finish(self, spec: DirectionalMotionSpec) -> Self::Output {
        spec
    }
}

/// Finish target producing a unidirectional [`MotionSpec`].
pub struct MotionTarget {
    reset_spring: SpringParameters,
}

impl sealed::Sealed for MotionTarget {}

impl BuildTarget for MotionTarget {
    type Output = MotionSpec;

    fn finish(self, spec: DirectionalMotionSpec) -> Self::Output {
        MotionSpec::unidirectional(spec, self.reset_spring)
    }
}

// ---------------------------------------------------------------------------
// Shared chain state
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Orientation {
    /// From the `-∞` sentinel upward; positions strictly increase.
    Forward,
    /// From the `+∞` sentinel downward; positions strictly decrease.
    Reverse,
}

struct ChainState<T: BuildTarget> {
    target: T,
    orientation: Orientation,
    default_spring: SpringParameters,
    /// Breakpoints in *build* order; reversed at completion for
    /// [`Orientation::Reverse`].
    breakpoints: Vec<Breakpoint>,
    mappings: Vec<Mapping>,
    /// First ordering violation, reported at completion.
    error: Option<SpecError>,
}

impl<T: BuildTarget> ChainState<T> {
    fn new(target: T, orientation: Orientation, default_spring: SpringParameters) -> Self {
        let origin = match orientation {
            Orientation::Forward => Breakpoint::min_limit(default_spring),
            Orientation::Reverse => Breakpoint::max_limit(default_spring),
        };
        Self {
            target,
            orientation,
            default_spring,
            breakpoints: vec![origin],
            mappings: Vec::new(),
            error: None,
        }
    }

    fn last_position(&self) -> f32 {
        self.breakpoints
            .last()
            .expect("chain always holds the origin sentinel")
            .position()
    }

    /// Close the open segment with `mapping` and append a breakpoint.
    fn push(&mut self, mapping: Mapping, position: f32, key: BreakpointKey) {
        let prev = self.last_position();
        let ordered = match self.orientation {
            Orientation::Forward => position.is_finite() && prev < position,
            Orientation::Reverse => position.is_finite() && position < prev,
        };
        if !ordered && self.error.is_none() {
            self.error = Some(SpecError::UnsortedPositions {
                index: self.breakpoints.len(),
            });
        }
        self.mappings.push(mapping);
        self.breakpoints.push(Breakpoint::new(
            key,
            position,
            self.default_spring,
            Guarantee::None,
        ));
    }

    fn last_breakpoint_mut(&mut self) -> &mut Breakpoint {
        self.breakpoints
            .last_mut()
            .expect("chain always holds the origin sentinel")
    }

    /// Close the final segment with `mapping` and validate.
    fn complete(mut self, mapping: Mapping) -> Result<T::Output, SpecError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.mappings.push(mapping);
        let closing = match self.orientation {
            Orientation::Forward => Breakpoint::max_limit(self.default_spring),
            Orientation::Reverse => Breakpoint::min_limit(self.default_spring),
        };
        self.breakpoints.push(closing);
        if self.orientation == Orientation::Reverse {
            self.breakpoints.reverse();
            self.mappings.reverse();
        }
        let spec = DirectionalMotionSpec::new(self.breakpoints, self.mappings)?;
        Ok(self.target.finish(spec))
    }
}

// ---------------------------------------------------------------------------
// Builder states
// ---------------------------------------------------------------------------

/// In-segment state: a mapping is active and runs until the next
/// breakpoint (or the closing sentinel).
#[must_use]
pub struct SpecBuilder<T: BuildTarget> {
    chain: ChainState<T>,
    segment_mapping: Mapping,
}

impl<T: BuildTarget> SpecBuilder<T> {
    /// End the current segment at a breakpoint.
    pub fn to_breakpoint(mut self, position: f32, key: BreakpointKey) -> BreakpointBuilder<T> {
        let mapping = self.segment_mapping.clone();
        self.chain.push(mapping.clone(), position, key);
        BreakpointBuilder {
            chain: self.chain,
            prev_mapping: mapping,
        }
    }

    /// Run the current mapping out to the closing sentinel and build.
    pub fn complete(self) -> Result<T::Output, SpecError> {
        self.chain.complete(self.segment_mapping)
    }
}

/// At-breakpoint state: configure the breakpoint just placed, then describe
/// how the output continues past it.
#[must_use]
pub struct BreakpointBuilder<T: BuildTarget> {
    chain: ChainState<T>,
    /// Mapping of the segment that ends at this breakpoint; `jump_by`
    /// measures its offset from this mapping's value here.
    prev_mapping: Mapping,
}

impl<T: BuildTarget> BreakpointBuilder<T> {
    /// Spring animating the discontinuity entered at this breakpoint.
    pub fn with_spring(mut self, spring: SpringParameters) -> Self {
        self.chain.last_breakpoint_mut().set_spring(spring);
        self
    }

    /// Completion guarantee for this breakpoint's discontinuity.
    pub fn with_guarantee(mut self, guarantee: Guarantee) -> Self {
        self.chain.last_breakpoint_mut().set_guarantee(guarantee);
        self
    }

    /// Continue with `mapping` (no jump; any discontinuity comes from the
    /// mapping values themselves).
    pub fn continue_with(self, mapping: Mapping) -> SpecBuilder<T> {
        SpecBuilder {
            chain: self.chain,
            segment_mapping: mapping,
        }
    }

    /// Jump the output to an absolute `value` at this breakpoint.
    pub fn jump_to(self, value: f32) -> JumpBuilder<T> {
        JumpBuilder {
            chain: self.chain,
            jump_value: value,
        }
    }

    /// Jump the output by `delta` relative to the previous segment's value
    /// at this breakpoint.
    pub fn jump_by(self, delta: f32) -> JumpBuilder<T> {
        let here = self.chain.last_position();
        let value = self.prev_mapping.map(here) + delta;
        self.jump_to(value)
    }

    /// Continue with `mapping` out to the closing sentinel and build.
    pub fn complete_with(self, mapping: Mapping) -> Result<T::Output, SpecError> {
        self.continue_with(mapping).complete()
    }
}

/// In-jump state: the output value right after the jump is fixed; choose
/// how it evolves from here.
#[must_use]
pub struct JumpBuilder<T: BuildTarget> {
    chain: ChainState<T>,
    jump_value: f32,
}

impl<T: BuildTarget> JumpBuilder<T> {
    /// Hold the jumped-to value constant through the next segment.
    pub fn continue_with_constant_value(self) -> SpecBuilder<T> {
        SpecBuilder {
            chain: self.chain,
            segment_mapping: Mapping::Fixed(self.jump_value),
        }
    }

    /// Follow the input at `fraction` of its rate, anchored so the segment
    /// starts exactly at the jumped-to value.
    pub fn continue_with_fractional_input(self, fraction: f32) -> SpecBuilder<T> {
        let here = self.chain.last_position();
        SpecBuilder {
            chain: self.chain,
            segment_mapping: Mapping::Linear {
                factor: fraction,
                offset: self.jump_value - fraction * here,
            },
        }
    }

    /// Interpolate linearly from the jumped-to value here to `target` at
    /// the next breakpoint.
    ///
    /// The mapping cannot be emitted yet — its slope depends on where the
    /// next breakpoint lands — so the jump value is buffered until the
    /// following [`to_breakpoint`](TargetValueBuilder::to_breakpoint).
    pub fn continue_with_target_value(self, target: f32) -> TargetValueBuilder<T> {
        TargetValueBuilder {
            chain: self.chain,
            start_value: self.jump_value,
            target_value: target,
        }
    }
}

/// Pending-target state: holds a buffered jump value until the next
/// breakpoint fixes the interpolation endpoint.
#[must_use]
pub struct TargetValueBuilder<T: BuildTarget> {
    chain: ChainState<T>,
    start_value: f32,
    target_value: f32,
}

impl<T: BuildTarget> TargetValueBuilder<T> {
    /// Place the next breakpoint and emit the buffered interpolation.
    pub fn to_breakpoint(mut self, position: f32, key: BreakpointKey) -> BreakpointBuilder<T> {
        let start = self.chain.last_position();
        // A zero-width segment is an ordering violation that `push` records;
        // the placeholder keeps the chain usable until completion reports it.
        let mapping = if position == start || !position.is_finite() {
            Mapping::Fixed(self.start_value)
        } else {
            Mapping::line_through(start, self.start_value, position, self.target_value)
        };
        self.chain.push(mapping.clone(), position, key);
        BreakpointBuilder {
            chain: self.chain,
            prev_mapping: mapping,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

impl DirectionalMotionSpec {
    /// Start a forward chain from the `-∞` sentinel.
    ///
    /// `initial_mapping` governs the unbounded segment up to the first
    /// breakpoint; `default_spring` is used wherever a breakpoint does not
    /// override it.
    #[must_use]
    pub fn builder(
        default_spring: SpringParameters,
        initial_mapping: Mapping,
    ) -> SpecBuilder<DirectionalTarget> {
        SpecBuilder {
            chain: ChainState::new(DirectionalTarget(()), Orientation::Forward, default_spring),
            segment_mapping: initial_mapping,
        }
    }

    /// Start a reverse chain from the `+∞` sentinel; positions are given
    /// strictly decreasing. The finished spec stores the same ascending
    /// breakpoint table a forward chain would.
    #[must_use]
    pub fn reverse_builder(
        default_spring: SpringParameters,
        initial_mapping: Mapping,
    ) -> SpecBuilder<DirectionalTarget> {
        SpecBuilder {
            chain: ChainState::new(DirectionalTarget(()), Orientation::Reverse, default_spring),
            segment_mapping: initial_mapping,
        }
    }
}

impl MotionSpec {
    /// Start a forward chain that completes into a unidirectional
    /// [`MotionSpec`] with `reset_spring`.
    #[must_use]
    pub fn builder(
        default_spring: SpringParameters,
        reset_spring: SpringParameters,
        initial_mapping: Mapping,
    ) -> SpecBuilder<MotionTarget> {
        SpecBuilder {
            chain: ChainState::new(
                MotionTarget { reset_spring },
                Orientation::Forward,
                default_spring,
            ),
            segment_mapping: initial_mapping,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::InputDirection;
    use crate::spring::presets;

    fn key(name: &str) -> BreakpointKey {
        BreakpointKey::named(name)
    }

    #[test]
    fn sentinel_only_spec() {
        let spec = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .complete()
            .unwrap();
        assert_eq!(spec.breakpoint_count(), 2);
        assert_eq!(spec.mapping(0), &Mapping::Identity);
    }

    #[test]
    fn forward_chain_layout() {
        let spec = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(1.0, key("a"))
            .continue_with(Mapping::Fixed(1.0))
            .to_breakpoint(2.0, key("b"))
            .complete_with(Mapping::Fixed(2.0))
            .unwrap();
        assert_eq!(spec.breakpoint_count(), 4);
        assert_eq!(spec.breakpoint(1).key(), &key("a"));
        assert_eq!(spec.breakpoint(1).position(), 1.0);
        assert_eq!(spec.breakpoint(2).key(), &key("b"));
        assert_eq!(spec.mapping(0), &Mapping::Identity);
        assert_eq!(spec.mapping(1), &Mapping::Fixed(1.0));
        assert_eq!(spec.mapping(2), &Mapping::Fixed(2.0));
    }

    #[test]
    fn breakpoint_overrides_spring_and_guarantee() {
        let tight = SpringParameters::new(900.0, 1.0).unwrap();
        let spec = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(1.0, key("a"))
            .with_spring(tight)
            .with_guarantee(Guarantee::input_delta(3.0).unwrap())
            .complete_with(Mapping::Fixed(1.0))
            .unwrap();
        assert_eq!(spec.breakpoint(1).spring(), tight);
        assert_eq!(
            spec.breakpoint(1).guarantee(),
            Guarantee::input_delta(3.0).unwrap()
        );
        // The sentinel and default-spring breakpoints are untouched.
        assert_eq!(spec.breakpoint(0).spring(), presets::standard());
    }

    #[test]
    fn jump_to_constant_value() {
        let spec = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(1.0, key("a"))
            .jump_to(5.0)
            .continue_with_constant_value()
            .complete()
            .unwrap();
        assert_eq!(spec.mapping(1), &Mapping::Fixed(5.0));
    }

    #[test]
    fn jump_by_measures_from_previous_mapping() {
        let spec = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(2.0, key("a"))
            .jump_by(0.5)
            .continue_with_constant_value()
            .complete()
            .unwrap();
        // Identity maps the breakpoint to 2.0; jumping by 0.5 lands at 2.5.
        assert_eq!(spec.mapping(1), &Mapping::Fixed(2.5));
    }

    #[test]
    fn fractional_input_is_continuous_at_the_jump() {
        let spec = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(2.0, key("a"))
            .jump_to(5.0)
            .continue_with_fractional_input(0.25)
            .complete()
            .unwrap();
        let mapping = spec.mapping(1);
        assert!((mapping.map(2.0) - 5.0).abs() < 1e-6);
        assert!((mapping.map(6.0) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn target_value_buffers_until_next_breakpoint() {
        let spec = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(1.0, key("a"))
            .jump_to(10.0)
            .continue_with_target_value(20.0)
            .to_breakpoint(3.0, key("b"))
            .complete_with(Mapping::Fixed(20.0))
            .unwrap();
        let mapping = spec.mapping(1);
        assert!((mapping.map(1.0) - 10.0).abs() < 1e-6);
        assert!((mapping.map(3.0) - 20.0).abs() < 1e-6);
        assert!((mapping.map(2.0) - 15.0).abs() < 1e-6);
    }

    #[test]
    fn reverse_chain_matches_forward_layout() {
        let forward = DirectionalMotionSpec::builder(presets::standard(), Mapping::Fixed(0.0))
            .to_breakpoint(1.0, key("a"))
            .continue_with(Mapping::Fixed(1.0))
            .to_breakpoint(2.0, key("b"))
            .complete_with(Mapping::Fixed(2.0))
            .unwrap();
        // Walked from the high end: the first segment is the one beyond the
        // last breakpoint, so mappings arrive in the opposite order.
        let reverse = DirectionalMotionSpec::reverse_builder(presets::standard(), Mapping::Fixed(2.0))
            .to_breakpoint(2.0, key("b"))
            .continue_with(Mapping::Fixed(1.0))
            .to_breakpoint(1.0, key("a"))
            .complete_with(Mapping::Fixed(0.0))
            .unwrap();
        assert_eq!(reverse.breakpoint_count(), forward.breakpoint_count());
        for i in 0..forward.breakpoint_count() {
            assert_eq!(reverse.breakpoint(i).key(), forward.breakpoint(i).key());
            assert_eq!(
                reverse.breakpoint(i).position(),
                forward.breakpoint(i).position()
            );
        }
        for i in 0..forward.segment_count() {
            assert_eq!(reverse.mapping(i), forward.mapping(i));
        }
    }

    #[test]
    fn reverse_fractional_jump_is_continuous() {
        let spec = DirectionalMotionSpec::reverse_builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(4.0, key("a"))
            .jump_to(1.0)
            .continue_with_fractional_input(0.5)
            .complete()
            .unwrap();
        // Segment below "a": anchored so the value at 4.0 is the jump value.
        let mapping = spec.mapping(0);
        assert!((mapping.map(4.0) - 1.0).abs() < 1e-6);
        assert!((mapping.map(2.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn misordered_positions_reported_at_completion() {
        let result = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(2.0, key("a"))
            .continue_with(Mapping::Identity)
            .to_breakpoint(1.0, key("b"))
            .complete_with(Mapping::Identity);
        assert!(matches!(result, Err(SpecError::UnsortedPositions { .. })));

        let result = DirectionalMotionSpec::reverse_builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(1.0, key("a"))
            .continue_with(Mapping::Identity)
            .to_breakpoint(2.0, key("b"))
            .complete_with(Mapping::Identity);
        assert!(matches!(result, Err(SpecError::UnsortedPositions { .. })));
    }

    #[test]
    fn zero_width_target_segment_is_an_error() {
        let result = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(1.0, key("a"))
            .jump_to(10.0)
            .continue_with_target_value(20.0)
            .to_breakpoint(1.0, key("b"))
            .complete_with(Mapping::Identity);
        assert!(matches!(result, Err(SpecError::UnsortedPositions { .. })));
    }

    #[test]
    fn motion_spec_chain_completes_unidirectional() {
        let reset = presets::smooth();
        let spec = MotionSpec::builder(presets::standard(), reset, Mapping::Identity)
            .to_breakpoint(1.0, key("a"))
            .complete_with(Mapping::Fixed(1.0))
            .unwrap();
        assert!(spec.is_unidirectional());
        assert_eq!(spec.reset_spring(), reset);
        assert_eq!(
            spec.direction_spec(InputDirection::Max).breakpoint_count(),
            3
        );
    }

    #[test]
    fn duplicate_keys_surface_from_validation() {
        let result = DirectionalMotionSpec::builder(presets::standard(), Mapping::Identity)
            .to_breakpoint(1.0, key("a"))
            .continue_with(Mapping::Identity)
            .to_breakpoint(2.0, key("a"))
            .complete_with(Mapping::Identity);
        assert!(matches!(result, Err(SpecError::DuplicateKey { .. })));
    }
}
