#![forbid(unsafe_code)]

//! Runtime: the frame-driven engine over `coil-core` motion specs.
//!
//! [`MotionValue`] turns a host-supplied input source, gesture context, and
//! [`coil_core::MotionSpec`] into an animated output, one frame at a time.
//! The host supplies time through a [`FrameClock`]; the engine never reads
//! the wall clock itself, so the same input trace replays to the same
//! outputs.

pub mod animation;
pub mod error;
pub mod frame_clock;
pub mod gesture;
pub mod inspector;
pub mod motion_value;
pub mod wakeup;

pub use animation::{DiscontinuityAnimation, GuaranteeState};
pub use error::EngineError;
pub use frame_clock::{ClockHandle, FrameClock, IntervalFrameClock, ScriptedFrameClock};
pub use gesture::{GestureContext, GestureTracker};
pub use inspector::{DebugInspector, FrameSnapshot};
pub use motion_value::MotionValue;
pub use wakeup::WakeupSignal;
