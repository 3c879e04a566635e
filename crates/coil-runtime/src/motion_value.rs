#![forbid(unsafe_code)]

//! The frame-driven motion value engine.
//!
//! A [`MotionValue`] maps a scalar input (usually a gesture position) to a
//! scalar output through a [`MotionSpec`], smoothing every output
//! discontinuity with a spring and honoring the spec's guarantees. The
//! engine is declarative per frame: each tick derives a fresh *current*
//! record strictly top-down from the committed *last* record plus the
//! frame's inputs — segment, then guarantee, then animation, then spring —
//! and the next tick commits it. No state is observable half-updated, and
//! the same input trace always produces the same outputs.
//!
//! The output decomposes as
//!
//! ```text
//! direct_mapped  = mapping(input) - target_value
//! animated_delta = target_value + displacement
//! output         = direct_mapped + animated_delta = mapping(input) + displacement
//! ```
//!
//! `target_value` accumulates the output delta of every crossed
//! discontinuity and survives the spring settling; the spring only carries
//! the part of it that is not yet allowed to show.
//!
//! # Invariants
//!
//! 1. `output() == mapping(input) + displacement` for the current frame.
//! 2. Commits are atomic: readers see the previous frame until `update`
//!    returns, then the new one.
//! 3. A fulfilled guarantee collapses the spring to exactly
//!    [`SpringState::AT_REST`] on the frame the threshold is met.
//! 4. Spring parameters never loosen while the input stays in one segment.
//! 5. A failed frame (non-finite input) leaves every piece of state
//!    untouched.
//!
//! # Failure Modes
//!
//! - Classifying a spec replacement is best effort: it compares what the
//!   old and new specs materialize for the same input. A hook that maps
//!   equal inputs to different segments on a whim can defeat it; animation
//!   correctness does not depend on the label.
//! - Gesture distance at a mid-frame crossing is linearly interpolated
//!   between the frame endpoints. That is an approximation; hosts with
//!   wildly non-uniform within-frame gestures get a proportionally
//!   approximate guarantee origin.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use arc_swap::ArcSwap;
use tracing::{debug, trace};

use coil_core::{
    Guarantee, InputDirection, InputError, MotionSpec, SegmentData, SpringParameters, SpringState,
};

use crate::animation::{DiscontinuityAnimation, GuaranteeState, tightened_spring};
use crate::error::EngineError;
use crate::frame_clock::FrameClock;
use crate::gesture::GestureContext;
use crate::inspector::{DebugInspector, FrameSnapshot, InspectorShared};
use crate::wakeup::WakeupSignal;

/// Default threshold below which remaining spring motion is collapsed.
const DEFAULT_STABLE_THRESHOLD: f32 = 0.01;

// ---------------------------------------------------------------------------
// Frame records
// ---------------------------------------------------------------------------

/// Everything one frame derives; two generations of this are kept.
#[derive(Clone, Debug)]
struct FrameRecord {
    input: f32,
    direction: InputDirection,
    gesture_distance: f32,
    frame_time_ns: i64,
    spec: Arc<MotionSpec>,
    segment: SegmentData,
    guarantee: GuaranteeState,
    animation: DiscontinuityAnimation,
    spring_state: SpringState,
    output: f32,
    output_target: f32,
}

struct EngineState {
    last: FrameRecord,
    current: FrameRecord,
    /// `current` was computed but not yet folded into `last`.
    pending: bool,
    /// The first `update` adopts its frame time as the baseline instead of
    /// measuring an interval from the constructor.
    primed: bool,
    stable_threshold: f32,
}

impl EngineState {
    /// Fold the current record into the last one.
    ///
    /// The animation is re-anchored at the frame boundary so the next
    /// frame advances from exactly the state the host saw — including a
    /// collapsed [`SpringState::AT_REST`], which must stay collapsed.
    fn commit(&mut self) {
        let mut committed = self.current.clone();
        committed.animation = DiscontinuityAnimation {
            target_value: committed.animation.target_value,
            spring_start_state: committed.spring_state,
            spring_parameters: committed.animation.spring_parameters,
            spring_start_time_ns: committed.frame_time_ns,
        };
        self.last = committed;
        self.pending = false;
    }
}

/// How the segment resolved this frame relates to the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentChange {
    /// Same segment; carry the guarantee, possibly tighten.
    Same,
    /// Same bounds, opposite direction: reset-spring animation, guarantee
    /// cleared.
    OppositeDirection,
    /// The spec was replaced under the same input: reset-spring animation,
    /// guarantee cleared.
    SpecReplaced,
    /// Direction flipped into a different segment: entry-spring animation,
    /// guarantee restarts from the current position.
    DirectionChanged,
    /// One or more breakpoints crossed in this direction.
    Traversed,
}

// ---------------------------------------------------------------------------
// MotionValue
// ---------------------------------------------------------------------------

struct Inner {
    input: Box<dyn Fn() -> f32 + Send + Sync>,
    gesture: Arc<dyn GestureContext>,
    spec: ArcSwap<MotionSpec>,
    state: Mutex<EngineState>,
    running: AtomicBool,
    wakeup: WakeupSignal,
    inspector: Mutex<Weak<InspectorShared>>,
}

/// A frame-driven animated mapping from one scalar input to one scalar
/// output.
///
/// Cheap to clone; all clones share the same engine. Reads
/// ([`output`](Self::output), [`is_stable`](Self::is_stable)) are valid
/// from any thread at any time; [`update`](Self::update) is the only state
/// transition and is internally serialized.
#[derive(Clone)]
pub struct MotionValue {
    inner: Arc<Inner>,
}

impl MotionValue {
    /// Create an engine over `input`, `gesture`, and `spec`.
    ///
    /// The input source is sampled once to seed the initial segment; a
    /// non-finite sample fails construction the same way it would fail a
    /// frame.
    pub fn new(
        input: impl Fn() -> f32 + Send + Sync + 'static,
        gesture: Arc<dyn GestureContext>,
        spec: MotionSpec,
    ) -> Result<Self, EngineError> {
        let input: Box<dyn Fn() -> f32 + Send + Sync> = Box::new(input);
        let x = input();
        if !x.is_finite() {
            return Err(InputError::NonFinite { value: x }.into());
        }
        let direction = gesture.direction();
        let distance = gesture.distance();
        let spec = Arc::new(spec);
        let segment = spec
            .direction_spec(direction)
            .segment_at_input(x, direction)?;
        let entry = segment.entry();
        let guarantee = GuaranteeState::restart(entry.guarantee(), entry.position(), distance);
        let animation = DiscontinuityAnimation::settled(0.0, entry.spring(), 0);
        let output = segment.map(x);
        let record = FrameRecord {
            input: x,
            direction,
            gesture_distance: distance,
            frame_time_ns: 0,
            spec: Arc::clone(&spec),
            segment,
            guarantee,
            animation,
            spring_state: SpringState::AT_REST,
            output,
            output_target: output,
        };
        Ok(Self {
            inner: Arc::new(Inner {
                input,
                gesture,
                spec: ArcSwap::new(spec),
                state: Mutex::new(EngineState {
                    last: record.clone(),
                    current: record,
                    pending: false,
                    primed: false,
                    stable_threshold: DEFAULT_STABLE_THRESHOLD,
                }),
                running: AtomicBool::new(false),
                wakeup: WakeupSignal::new(),
                inspector: Mutex::new(Weak::new()),
            }),
        })
    }

    /// Set the stability threshold (builder form of
    /// [`set_stable_threshold`](Self::set_stable_threshold)).
    #[must_use]
    pub fn with_stable_threshold(self, threshold: f32) -> Self {
        self.set_stable_threshold(threshold);
        self
    }

    /// Change the threshold below which remaining spring motion collapses
    /// to rest. Default: `0.01` output units.
    pub fn set_stable_threshold(&self, threshold: f32) {
        self.lock_state().stable_threshold = threshold.abs();
    }

    /// Replace the spec. Takes effect on the next frame, classified as a
    /// spec replacement where the materialized segment differs.
    pub fn set_spec(&self, spec: MotionSpec) {
        self.inner.spec.store(Arc::new(spec));
        self.inner.wakeup.notify();
    }

    /// Signal that the input or gesture changed; wakes a parked
    /// [`keep_running`](Self::keep_running) loop.
    pub fn request_update(&self) {
        self.inner.wakeup.notify();
    }

    /// The animated output for the current frame.
    #[must_use]
    pub fn output(&self) -> f32 {
        self.lock_state().current.output
    }

    /// The output with in-flight spring displacement ignored — where the
    /// animation will settle if the input holds still.
    #[must_use]
    pub fn output_target(&self) -> f32 {
        self.lock_state().current.output_target
    }

    /// Whether the spring has settled.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.lock_state().current.spring_state.is_at_rest()
    }

    /// Advance one frame.
    ///
    /// Folds the previous frame's result into the committed state, then
    /// derives the new frame from fresh inputs. Fails without touching any
    /// state if the input source produces a non-finite value.
    pub fn update(&self, frame_time_ns: i64) -> Result<(), EngineError> {
        let input = (self.inner.input)();
        if !input.is_finite() {
            return Err(InputError::NonFinite { value: input }.into());
        }
        let direction = self.inner.gesture.direction();
        let distance = self.inner.gesture.distance();
        let spec = self.inner.spec.load_full();

        let snapshot = {
            let mut st = self.lock_state();
            if st.pending {
                st.commit();
            }
            if !st.primed {
                st.last.frame_time_ns = frame_time_ns;
                st.last.animation.spring_start_time_ns = frame_time_ns;
                st.primed = true;
            }
            let current = compute_frame(
                &st.last,
                &spec,
                input,
                direction,
                distance,
                frame_time_ns,
                st.stable_threshold,
            )?;
            trace!(
                frame_time_ns,
                input,
                output = current.output,
                displacement = current.spring_state.displacement,
                "frame"
            );
            st.current = current;
            st.pending = true;
            self.snapshot_if_inspected(&st.current)
        };
        if let Some((shared, snapshot)) = snapshot {
            shared.publish(snapshot);
        }
        Ok(())
    }

    /// Drive the engine until the clock shuts down.
    ///
    /// While the spring is settled the loop parks on the wakeup signal
    /// (raised by [`request_update`](Self::request_update) and
    /// [`set_spec`](Self::set_spec)); while animating it paces itself on
    /// the clock alone. Only one loop may run at a time — a concurrent
    /// entry fails with [`EngineError::AlreadyRunning`] — but the state
    /// survives shutdown and a later re-entry continues where it left off.
    pub fn keep_running(&self, clock: &mut dyn FrameClock) -> Result<(), EngineError> {
        if self.inner.running.swap(true, Ordering::AcqRel) {
            return Err(EngineError::AlreadyRunning);
        }
        let _guard = RunningGuard {
            running: &self.inner.running,
        };
        loop {
            if self.is_stable() && !self.inner.wakeup.take() {
                self.inner.wakeup.wait();
            }
            let Some(frame_time_ns) = clock.next_frame_nanos() else {
                return Ok(());
            };
            self.update(frame_time_ns)?;
        }
    }

    /// Obtain the debug inspector.
    ///
    /// While any handle from a previous call is still alive, the same
    /// shared instance is returned; once all handles are dropped the
    /// engine stops publishing snapshots until asked again.
    #[must_use]
    pub fn debug_inspector(&self) -> DebugInspector {
        // Snapshot first: `update` locks state before the inspector slot,
        // and this method must not hold them in the opposite order.
        let snapshot = self.make_snapshot(&self.lock_state().current);
        let mut slot = self
            .inner
            .inspector
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(shared) = slot.upgrade() {
            return DebugInspector::from_shared(shared);
        }
        let shared = Arc::new(InspectorShared::new(snapshot));
        *slot = Arc::downgrade(&shared);
        DebugInspector::from_shared(shared)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, EngineState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot_if_inspected(
        &self,
        record: &FrameRecord,
    ) -> Option<(Arc<InspectorShared>, FrameSnapshot)> {
        let shared = self
            .inner
            .inspector
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .upgrade()?;
        let snapshot = self.make_snapshot(record);
        Some((shared, snapshot))
    }

    fn make_snapshot(&self, record: &FrameRecord) -> FrameSnapshot {
        FrameSnapshot {
            input: record.input,
            direction: record.direction,
            gesture_distance: record.gesture_distance,
            frame_time_ns: record.frame_time_ns,
            spring_state: record.spring_state,
            segment: record.segment.clone(),
            animation: record.animation.clone(),
            is_active: self.inner.running.load(Ordering::Acquire),
            is_animating: !record.spring_state.is_at_rest(),
        }
    }
}

struct RunningGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Per-frame derivation
// ---------------------------------------------------------------------------

fn compute_frame(
    last: &FrameRecord,
    spec: &Arc<MotionSpec>,
    input: f32,
    direction: InputDirection,
    distance: f32,
    frame_time_ns: i64,
    stable_threshold: f32,
) -> Result<FrameRecord, EngineError> {
    let spec_swapped = !Arc::ptr_eq(spec, &last.spec);
    let segment = if spec_swapped || !last.segment.is_valid_for_input(input, direction) {
        spec.on_change_segment(&last.segment, input, direction)?
    } else {
        last.segment.clone()
    };

    let change = classify(last, &segment, spec_swapped, input, direction)?;
    if change != SegmentChange::Same {
        debug!(?change, input, "segment change");
    }

    let (guarantee, animation) = match change {
        SegmentChange::Same => same_segment(last, &segment, input, distance, direction),
        SegmentChange::OppositeDirection | SegmentChange::SpecReplaced => {
            reset_segment(last, &segment, input, spec.reset_spring(), frame_time_ns)
        }
        SegmentChange::DirectionChanged => {
            direction_change(last, &segment, input, distance, frame_time_ns)
        }
        SegmentChange::Traversed => {
            traverse(last, spec, input, direction, distance, frame_time_ns)?
        }
    };

    let mut spring_state = animation.state_at(frame_time_ns);
    if spring_state.is_stable(animation.spring_parameters, stable_threshold) {
        spring_state = SpringState::AT_REST;
    }

    let output_target = segment.map(input);
    Ok(FrameRecord {
        input,
        direction,
        gesture_distance: distance,
        frame_time_ns,
        spec: Arc::clone(spec),
        segment,
        guarantee,
        animation,
        spring_state,
        output: output_target + spring_state.displacement,
        output_target,
    })
}

fn classify(
    last: &FrameRecord,
    segment: &SegmentData,
    spec_swapped: bool,
    input: f32,
    direction: InputDirection,
) -> Result<SegmentChange, EngineError> {
    if !spec_swapped && *segment == last.segment {
        return Ok(SegmentChange::Same);
    }
    if spec_swapped {
        // Best effort: would the previous spec have resolved this input to
        // the same segment? If not, the replacement is the real change.
        let previous = last
            .spec
            .direction_spec(direction)
            .segment_at_input(input, direction)?;
        if previous != *segment {
            return Ok(SegmentChange::SpecReplaced);
        }
        if *segment == last.segment {
            return Ok(SegmentChange::Same);
        }
    }
    let key = segment.key();
    let last_key = last.segment.key();
    if key == last_key {
        Ok(SegmentChange::Same)
    } else if key.same_bounds(&last_key) {
        Ok(SegmentChange::OppositeDirection)
    } else if key.direction != last_key.direction {
        Ok(SegmentChange::DirectionChanged)
    } else {
        Ok(SegmentChange::Traversed)
    }
}

/// The guarantee's source value for this frame: input position or gesture
/// distance, depending on the guarantee's kind.
fn guarantee_source(guarantee: Guarantee, input: f32, distance: f32) -> Option<f32> {
    match guarantee {
        Guarantee::None => None,
        Guarantee::InputDelta(_) => Some(input),
        Guarantee::GestureDistance(_) => Some(distance),
    }
}

fn advance_guarantee(
    state: GuaranteeState,
    guarantee: Guarantee,
    input: f32,
    distance: f32,
    direction: InputDirection,
) -> GuaranteeState {
    match guarantee_source(guarantee, input, distance) {
        None => GuaranteeState::Inactive,
        Some(value) => state.advanced(value, direction.sign()),
    }
}

/// Same segment: carry the animation, fold guarantee progress, and tighten
/// the spring if the progress grew.
///
/// Only an actively tracked guarantee re-parameterizes the spring; with the
/// guarantee inactive (no guarantee, or cleared by an earlier reset) the
/// running animation keeps whatever parameters started it.
fn same_segment(
    last: &FrameRecord,
    segment: &SegmentData,
    input: f32,
    distance: f32,
    direction: InputDirection,
) -> (GuaranteeState, DiscontinuityAnimation) {
    let entry = segment.entry();
    let guarantee = advance_guarantee(last.guarantee, entry.guarantee(), input, distance, direction);
    let animation = if guarantee == GuaranteeState::Inactive {
        last.animation.clone()
    } else {
        let params = tightened_spring(entry.spring(), guarantee, entry.guarantee());
        if params == last.animation.spring_parameters {
            last.animation.clone()
        } else {
            // Progress tightened the spring: the old parameters stop at the
            // last frame boundary, the tightened ones take over from there.
            last.animation.rebased(last.frame_time_ns, params)
        }
    };
    (guarantee, animation)
}

/// Shared tail of the non-traversal change cases: absorb the mapping delta
/// at the current input into the spring so the output stays continuous.
fn absorb_mapping_delta(
    last: &FrameRecord,
    segment: &SegmentData,
    input: f32,
    params: SpringParameters,
    frame_time_ns: i64,
) -> DiscontinuityAnimation {
    let carried = last.animation.state_at(frame_time_ns);
    let delta = segment.map(input) - last.segment.map(input);
    DiscontinuityAnimation {
        target_value: last.animation.target_value + delta,
        spring_start_state: SpringState {
            displacement: carried.displacement - delta,
            velocity: carried.velocity,
        },
        spring_parameters: params,
        spring_start_time_ns: frame_time_ns,
    }
}

fn reset_segment(
    last: &FrameRecord,
    segment: &SegmentData,
    input: f32,
    reset_spring: SpringParameters,
    frame_time_ns: i64,
) -> (GuaranteeState, DiscontinuityAnimation) {
    (
        GuaranteeState::Inactive,
        absorb_mapping_delta(last, segment, input, reset_spring, frame_time_ns),
    )
}

fn direction_change(
    last: &FrameRecord,
    segment: &SegmentData,
    input: f32,
    distance: f32,
    frame_time_ns: i64,
) -> (GuaranteeState, DiscontinuityAnimation) {
    let entry = segment.entry();
    // The guarantee restarts from where the gesture actually is, not from
    // the breakpoint: the reversal never crossed it.
    let guarantee = GuaranteeState::restart(entry.guarantee(), input, distance);
    (
        guarantee,
        absorb_mapping_delta(last, segment, input, entry.spring(), frame_time_ns),
    )
}

/// One or more breakpoints crossed within a single frame.
///
/// Crossings are processed in travel order. Each gets a sub-frame fraction
/// `α` from linear interpolation of the input, which in turn dates the
/// crossing (virtual frame time) and locates it on the gesture (virtual
/// distance). The outgoing segment's guarantee is settled at the crossing,
/// the spring advanced to it, and the mapping delta folded into
/// `target_value` while its negation lands in the spring displacement — so
/// the visible output is continuous across the crossing and the spring
/// carries the discontinuity from the exact moment it happened.
fn traverse(
    last: &FrameRecord,
    spec: &Arc<MotionSpec>,
    input: f32,
    direction: InputDirection,
    distance: f32,
    frame_time_ns: i64,
) -> Result<(GuaranteeState, DiscontinuityAnimation), EngineError> {
    let table = spec.direction_spec(direction);
    let from = table.segment_index_at_input(last.input, direction)?;
    let to = table.segment_index_at_input(input, direction)?;

    let span = input - last.input;
    let mut guarantee = last.guarantee;
    let mut out_entry = last.segment.entry().clone();
    let mut target_value = last.animation.target_value;
    let mut state = last.animation.spring_start_state;
    let mut cursor_ns = last.animation.spring_start_time_ns;
    // Parameters the in-flight animation runs at while no guarantee is
    // tightening it; crossing a breakpoint hands the animation to that
    // breakpoint's spring.
    let mut carried_params = last.animation.spring_parameters;

    let crossings: Vec<usize> = match direction {
        InputDirection::Max => ((from + 1)..=to).collect(),
        InputDirection::Min => ((to + 1)..=from).rev().collect(),
    };
    for index in crossings {
        let crossed = table.breakpoint(index).clone();
        let (leaving, entering) = match direction {
            InputDirection::Max => (index - 1, index),
            InputDirection::Min => (index, index - 1),
        };
        let alpha = if span.abs() > f32::EPSILON {
            ((crossed.position() - last.input) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let virtual_ns = lerp_time(last.frame_time_ns, frame_time_ns, alpha);
        let virtual_distance =
            last.gesture_distance + (distance - last.gesture_distance) * alpha;

        // Settle the outgoing guarantee at the crossing and advance the
        // spring up to that instant under the (possibly tightened) outgoing
        // parameters.
        guarantee = advance_guarantee(
            guarantee,
            out_entry.guarantee(),
            crossed.position(),
            virtual_distance,
            direction,
        );
        let params = if guarantee == GuaranteeState::Inactive {
            carried_params
        } else {
            tightened_spring(out_entry.spring(), guarantee, out_entry.guarantee())
        };
        state = state.advance(virtual_ns - cursor_ns, params);

        let delta = table.mapping(entering).map(crossed.position())
            - table.mapping(leaving).map(crossed.position());
        target_value += delta;
        state.displacement -= delta;

        guarantee = GuaranteeState::restart(crossed.guarantee(), crossed.position(), virtual_distance);
        carried_params = crossed.spring();
        out_entry = crossed;
        cursor_ns = virtual_ns;
    }

    // The final crossing's breakpoint is the new segment's entry; settle
    // its guarantee against the frame-end values and tighten once more.
    guarantee = advance_guarantee(guarantee, out_entry.guarantee(), input, distance, direction);
    let params = if guarantee == GuaranteeState::Inactive {
        carried_params
    } else {
        tightened_spring(out_entry.spring(), guarantee, out_entry.guarantee())
    };
    Ok((
        guarantee,
        DiscontinuityAnimation {
            target_value,
            spring_start_state: state,
            spring_parameters: params,
            spring_start_time_ns: cursor_ns,
        },
    ))
}

fn lerp_time(from_ns: i64, to_ns: i64, alpha: f32) -> i64 {
    from_ns + ((to_ns - from_ns) as f64 * f64::from(alpha)) as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
