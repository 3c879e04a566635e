#![forbid(unsafe_code)]

//! Gesture context: the engine's read-only view of the gesture.
//!
//! The engine never interprets raw pointer events; the host distills them
//! into a travel direction and an accumulated distance. [`GestureTracker`]
//! is a ready-made implementation for hosts that have absolute positions
//! and nothing fancier.

use std::sync::Mutex;

use coil_core::InputDirection;

/// Read-only gesture state consumed by the engine once per frame.
///
/// Reads must be cheap and non-blocking; the engine calls both methods on
/// every frame.
pub trait GestureContext: Send + Sync {
    /// Which way the gesture is currently travelling.
    fn direction(&self) -> InputDirection;

    /// Accumulated gesture travel. The exact semantics belong to the host;
    /// distance-based guarantees measure progress in this unit.
    fn distance(&self) -> f32;
}

// ---------------------------------------------------------------------------
// GestureTracker
// ---------------------------------------------------------------------------

struct TrackerState {
    position: f32,
    direction: InputDirection,
    distance: f32,
    /// Travel against the current direction since the last confirmed move
    /// with it; a flip happens when this exceeds the slop.
    reversal: f32,
}

/// Derives direction and accumulated travel from absolute positions.
///
/// Feed it every pointer sample with [`record`](Self::record). Distance
/// accumulates the absolute per-sample travel; direction follows the sign
/// of movement, with an optional slop so jitter does not flip it.
pub struct GestureTracker {
    slop: f32,
    state: Mutex<TrackerState>,
}

impl GestureTracker {
    /// Track from `initial_position`, flipping direction on any reverse
    /// movement.
    #[must_use]
    pub fn new(initial_position: f32) -> Self {
        Self::with_direction_slop(initial_position, 0.0)
    }

    /// Track from `initial_position`, ignoring reverse movement smaller
    /// than `slop`.
    #[must_use]
    pub fn with_direction_slop(initial_position: f32, slop: f32) -> Self {
        Self {
            slop: slop.max(0.0),
            state: Mutex::new(TrackerState {
                position: initial_position,
                direction: InputDirection::Max,
                distance: 0.0,
                reversal: 0.0,
            }),
        }
    }

    /// Feed an absolute position sample.
    pub fn record(&self, position: f32) {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let delta = position - st.position;
        st.position = position;
        if delta == 0.0 {
            return;
        }
        st.distance += delta.abs();
        let moving = if delta > 0.0 {
            InputDirection::Max
        } else {
            InputDirection::Min
        };
        if moving == st.direction {
            st.reversal = 0.0;
        } else {
            st.reversal += delta.abs();
            if st.reversal > self.slop {
                st.direction = moving;
                st.reversal = 0.0;
            }
        }
    }

    /// The last recorded position.
    #[must_use]
    pub fn position(&self) -> f32 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).position
    }
}

impl GestureContext for GestureTracker {
    fn direction(&self) -> InputDirection {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .direction
    }

    fn distance(&self) -> f32 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).distance
    }
}
