#![forbid(unsafe_code)]

//! Frame clocks: where the engine's time comes from.
//!
//! The engine never sleeps on wall-clock time itself — it asks a
//! [`FrameClock`] for the next frame timestamp and treats `None` as
//! shutdown. [`IntervalFrameClock`] is the production clock for hosts
//! without a vsync source; [`ScriptedFrameClock`] replays a fixed list of
//! timestamps for deterministic tests and demos.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use web_time::Instant;

/// Source of frame timestamps, in nanoseconds.
///
/// Implementations may block until the next frame is due. Returning `None`
/// signals shutdown: a driving loop finishes its work and returns.
pub trait FrameClock {
    /// Block until the next frame and return its timestamp.
    fn next_frame_nanos(&mut self) -> Option<i64>;
}

// ---------------------------------------------------------------------------
// ScriptedFrameClock
// ---------------------------------------------------------------------------

/// Replays a fixed sequence of frame timestamps without blocking.
pub struct ScriptedFrameClock {
    frames: VecDeque<i64>,
}

impl ScriptedFrameClock {
    /// A clock delivering exactly these timestamps, in order.
    #[must_use]
    pub fn from_frames(frames: impl IntoIterator<Item = i64>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// `count` frames starting at `start_ns`, `interval_ns` apart.
    #[must_use]
    pub fn at_interval(start_ns: i64, interval_ns: i64, count: usize) -> Self {
        Self::from_frames((0..count).map(|i| start_ns + interval_ns * i as i64))
    }

    /// Frames not yet delivered.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameClock for ScriptedFrameClock {
    fn next_frame_nanos(&mut self) -> Option<i64> {
        self.frames.pop_front()
    }
}

// ---------------------------------------------------------------------------
// IntervalFrameClock
// ---------------------------------------------------------------------------

struct ClockShared {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

/// Stop handle for an [`IntervalFrameClock`].
///
/// Cheap to clone; dropping it does **not** stop the clock — call
/// [`stop`](Self::stop) explicitly.
#[derive(Clone)]
pub struct ClockHandle {
    shared: Arc<ClockShared>,
}

impl ClockHandle {
    /// Stop the clock. The next (or in-flight) `next_frame_nanos` returns
    /// `None`.
    pub fn stop(&self) {
        let mut stopped = self
            .shared
            .stopped
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        self.shared.condvar.notify_all();
    }
}

/// Wall-clock frame source ticking at a fixed period.
///
/// Timestamps are multiples of the period since construction, so a slow
/// consumer skips frames instead of accumulating drift.
pub struct IntervalFrameClock {
    period: Duration,
    origin: Instant,
    shared: Arc<ClockShared>,
}

impl IntervalFrameClock {
    /// A clock ticking every `period` from now.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_nanos(1)),
            origin: Instant::now(),
            shared: Arc::new(ClockShared {
                stopped: Mutex::new(false),
                condvar: Condvar::new(),
            }),
        }
    }

    /// A 60 Hz clock.
    #[must_use]
    pub fn at_60hz() -> Self {
        Self::new(Duration::from_nanos(16_666_667))
    }

    /// Obtain a stop handle.
    #[must_use]
    pub fn handle(&self) -> ClockHandle {
        ClockHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl FrameClock for IntervalFrameClock {
    fn next_frame_nanos(&mut self) -> Option<i64> {
        let period = self.period.as_nanos();
        let elapsed = self.origin.elapsed().as_nanos();
        let target_ticks = elapsed / period + 1;
        let target = period * target_ticks;

        let mut stopped = self
            .shared
            .stopped
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        loop {
            if *stopped {
                return None;
            }
            let now = self.origin.elapsed().as_nanos();
            if now >= target {
                return Some(target as i64);
            }
            let wait = Duration::from_nanos((target - now) as u64);
            let (guard, _timeout) = self
                .shared
                .condvar
                .wait_timeout(stopped, wait)
                .unwrap_or_else(|e| e.into_inner());
            stopped = guard;
        }
    }
}
