#![forbid(unsafe_code)]

//! Debug inspector: read-only per-frame snapshots.
//!
//! Purely observational — the engine only copies a snapshot out when an
//! inspector is actually alive, so an unused inspector costs nothing and
//! an active one cannot perturb outputs.

use std::sync::{Arc, Mutex};

use coil_core::{InputDirection, SegmentData, SpringState};

use crate::animation::DiscontinuityAnimation;

/// Everything the engine computed for one frame.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    /// Input position this frame.
    pub input: f32,
    /// Travel direction this frame.
    pub direction: InputDirection,
    /// Accumulated gesture distance this frame.
    pub gesture_distance: f32,
    /// Host frame timestamp.
    pub frame_time_ns: i64,
    /// Spring state after this frame's advance.
    pub spring_state: SpringState,
    /// The segment the input resolved to.
    pub segment: SegmentData,
    /// The running discontinuity animation.
    pub animation: DiscontinuityAnimation,
    /// Whether an engine loop is currently running.
    pub is_active: bool,
    /// Whether the spring is still in motion.
    pub is_animating: bool,
}

pub(crate) struct InspectorShared {
    snapshot: Mutex<FrameSnapshot>,
}

impl InspectorShared {
    pub(crate) fn new(snapshot: FrameSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    pub(crate) fn publish(&self, snapshot: FrameSnapshot) {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }
}

/// Reference-counted handle onto the engine's frame snapshots.
///
/// All handles obtained while at least one is alive share the same
/// underlying snapshot slot; once the last handle is dropped the engine
/// stops publishing and a later request starts a fresh one.
#[derive(Clone)]
pub struct DebugInspector {
    shared: Arc<InspectorShared>,
}

impl DebugInspector {
    pub(crate) fn from_shared(shared: Arc<InspectorShared>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> &Arc<InspectorShared> {
        &self.shared
    }

    /// The most recently published frame snapshot.
    #[must_use]
    pub fn snapshot(&self) -> FrameSnapshot {
        self.shared
            .snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
