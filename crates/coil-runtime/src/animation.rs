#![forbid(unsafe_code)]

//! Engine-side animation state: guarantee progress and the running
//! discontinuity animation.
//!
//! The engine accumulates every crossed discontinuity into one spring
//! animation: `target_value` is the total output delta the crossings are
//! worth, and the spring carries whatever part of it is not yet visible.
//! Guarantee progress is tracked per segment and only ever tightens the
//! spring — `max_delta` is a running maximum, so parameters never loosen
//! while the gesture stays inside a segment.

use coil_core::{Guarantee, SpringParameters, SpringState};

// ---------------------------------------------------------------------------
// GuaranteeState
// ---------------------------------------------------------------------------

/// Progress of the active segment's entry guarantee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuaranteeState {
    /// No guarantee is being tracked in this segment.
    Inactive,
    /// Progress measured from `start` in the guarantee's unit (input
    /// position or gesture distance).
    Active {
        /// Origin the progress is measured from.
        start: f32,
        /// Running maximum of signed progress, floored at zero.
        max_delta: f32,
    },
}

impl GuaranteeState {
    /// Begin tracking `guarantee` with the matching origin.
    #[must_use]
    pub fn restart(guarantee: Guarantee, input_origin: f32, distance_origin: f32) -> Self {
        match guarantee {
            Guarantee::None => Self::Inactive,
            Guarantee::InputDelta(_) => Self::Active {
                start: input_origin,
                max_delta: 0.0,
            },
            Guarantee::GestureDistance(_) => Self::Active {
                start: distance_origin,
                max_delta: 0.0,
            },
        }
    }

    /// Fold in a new observation of the guarantee's source value.
    ///
    /// `sign` is the travel direction's sign; progress is
    /// `(value - start) * sign`, so backing off never lowers `max_delta`.
    #[must_use]
    pub fn advanced(self, value: f32, sign: f32) -> Self {
        match self {
            Self::Inactive => Self::Inactive,
            Self::Active { start, max_delta } => Self::Active {
                start,
                max_delta: max_delta.max((value - start) * sign).max(0.0),
            },
        }
    }

    /// Fraction of the guarantee already met, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self, guarantee: Guarantee) -> f32 {
        let Some(denominator) = guarantee.denominator() else {
            return 0.0;
        };
        match self {
            Self::Inactive => 0.0,
            Self::Active { max_delta, .. } => (max_delta / denominator).clamp(0.0, 1.0),
        }
    }
}

/// Spring parameters for `base` tightened by guarantee progress.
///
/// Fully met guarantees land exactly on [`SpringParameters::SNAP`].
#[must_use]
pub(crate) fn tightened_spring(
    base: SpringParameters,
    state: GuaranteeState,
    guarantee: Guarantee,
) -> SpringParameters {
    SpringParameters::lerp(base, SpringParameters::SNAP, state.fraction(guarantee))
}

// ---------------------------------------------------------------------------
// DiscontinuityAnimation
// ---------------------------------------------------------------------------

/// The running spring animation over accumulated discontinuities.
///
/// `target_value` survives the spring settling: it is the permanent output
/// delta the crossings contributed, and later crossings keep adding to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscontinuityAnimation {
    /// Accumulated output delta of every crossed discontinuity.
    pub target_value: f32,
    /// Spring state at `spring_start_time_ns`.
    pub spring_start_state: SpringState,
    /// Parameters in effect since `spring_start_time_ns`.
    pub spring_parameters: SpringParameters,
    /// Anchor time for `spring_start_state`.
    pub spring_start_time_ns: i64,
}

impl DiscontinuityAnimation {
    /// A settled animation carrying `target_value`.
    #[must_use]
    pub fn settled(target_value: f32, parameters: SpringParameters, time_ns: i64) -> Self {
        Self {
            target_value,
            spring_start_state: SpringState::AT_REST,
            spring_parameters: parameters,
            spring_start_time_ns: time_ns,
        }
    }

    /// Spring state at `time_ns`, advanced from the anchor in one step.
    #[must_use]
    pub fn state_at(&self, time_ns: i64) -> SpringState {
        self.spring_start_state
            .advance(time_ns - self.spring_start_time_ns, self.spring_parameters)
    }

    /// Re-anchor at `time_ns` with `parameters` taking over from there.
    #[must_use]
    pub fn rebased(&self, time_ns: i64, parameters: SpringParameters) -> Self {
        Self {
            target_value: self.target_value,
            spring_start_state: self.state_at(time_ns),
            spring_parameters: parameters,
            spring_start_time_ns: time_ns,
        }
    }
}
