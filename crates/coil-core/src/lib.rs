#![forbid(unsafe_code)]

//! Core: motion specs, springs, and breakpoint tables.
//!
//! This crate holds the pure data model of a gesture-driven motion value:
//! sentinel-bounded breakpoint tables with per-segment mappings
//! ([`spec::DirectionalMotionSpec`], [`spec::MotionSpec`]), the closed-form
//! spring solver that absorbs output discontinuities ([`spring`]), and the
//! fluent builders that assemble specs forward or in reverse ([`builder`]).
//! Everything here is deterministic and clock-free; driving a spec frame by
//! frame is the job of `coil-runtime`.

pub mod breakpoint;
pub mod builder;
pub mod direction;
pub mod error;
pub mod mapping;
pub mod segment;
pub mod spec;
pub mod spring;

pub use breakpoint::{Breakpoint, BreakpointKey, Guarantee};
pub use direction::InputDirection;
pub use error::{InputError, SpecError};
pub use mapping::Mapping;
pub use segment::{SegmentData, SegmentKey};
pub use spec::{DirectionalMotionSpec, MotionSpec, SegmentChangeHook};
pub use spring::{SpringParameters, SpringState};
