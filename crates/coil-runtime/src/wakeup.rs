#![forbid(unsafe_code)]

//! Wakeup signalling for the engine loop.
//!
//! A latching flag with a condvar: the host raises it whenever something
//! the engine should react to changed (input, gesture, spec), and a stable
//! engine loop parks on it instead of burning frames.

use std::sync::{Condvar, Mutex};

/// A latching, thread-safe wakeup flag.
///
/// `notify` raises the flag and wakes waiters; `wait` parks until the flag
/// is raised and consumes it. A `notify` with no waiter is remembered, so
/// the notify/wait order never loses a signal.
#[derive(Default)]
pub struct WakeupSignal {
    pending: Mutex<bool>,
    condvar: Condvar,
}

impl WakeupSignal {
    /// Create an unraised signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake all waiters.
    pub fn notify(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        *pending = true;
        self.condvar.notify_all();
    }

    /// Consume the flag if it is raised, without blocking.
    pub fn take(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *pending)
    }

    /// Park until the flag is raised, then consume it.
    pub fn wait(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        while !*pending {
            pending = self
                .condvar
                .wait(pending)
                .unwrap_or_else(|e| e.into_inner());
        }
        *pending = false;
    }
}
