#![forbid(unsafe_code)]

//! Materialized segments: one input interval, one mapping, one direction.
//!
//! A segment is the unit the engine reasons about frame to frame. Its
//! *entry* breakpoint is the one the gesture crossed to get in — the lower
//! breakpoint when travelling toward [`InputDirection::Max`], the upper
//! one when travelling toward [`InputDirection::Min`]. The entry side of
//! the interval is inclusive and the exit side exclusive, which makes an
//! input sitting exactly on a breakpoint unambiguous in either direction.

use crate::breakpoint::{Breakpoint, BreakpointKey};
use crate::direction::InputDirection;
use crate::mapping::Mapping;

/// Identity of a segment: the bounding keys in position order plus the
/// travel direction.
///
/// Opposite-direction segments between the same two breakpoints share
/// `(min, max)` and differ only in `direction`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentKey {
    /// Key of the lower breakpoint.
    pub min: BreakpointKey,
    /// Key of the upper breakpoint.
    pub max: BreakpointKey,
    /// Travel direction through the segment.
    pub direction: InputDirection,
}

impl SegmentKey {
    /// Whether `other` covers the same input interval, regardless of
    /// direction.
    #[must_use]
    pub fn same_bounds(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max
    }
}

/// A segment with its bounding breakpoints and mapping materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentData {
    entry: Breakpoint,
    exit: Breakpoint,
    direction: InputDirection,
    mapping: Mapping,
}

impl SegmentData {
    /// Materialize a segment from its bounding breakpoints.
    ///
    /// `entry` is the breakpoint on the side the segment is entered from:
    /// the lower one for [`InputDirection::Max`], the upper one for
    /// [`InputDirection::Min`].
    #[must_use]
    pub fn new(
        entry: Breakpoint,
        exit: Breakpoint,
        direction: InputDirection,
        mapping: Mapping,
    ) -> Self {
        debug_assert!(
            match direction {
                InputDirection::Max => entry.position() < exit.position(),
                InputDirection::Min => exit.position() < entry.position(),
            },
            "entry breakpoint must be on the entered side"
        );
        Self {
            entry,
            exit,
            direction,
            mapping,
        }
    }

    /// The breakpoint this segment was entered through.
    #[inline]
    #[must_use]
    pub fn entry(&self) -> &Breakpoint {
        &self.entry
    }

    /// The breakpoint the gesture would leave through if it keeps going.
    #[inline]
    #[must_use]
    pub fn exit(&self) -> &Breakpoint {
        &self.exit
    }

    /// Travel direction.
    #[inline]
    #[must_use]
    pub fn direction(&self) -> InputDirection {
        self.direction
    }

    /// The mapping governing this segment.
    #[inline]
    #[must_use]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Shorthand for `mapping().map(x)`.
    #[inline]
    #[must_use]
    pub fn map(&self, x: f32) -> f32 {
        self.mapping.map(x)
    }

    /// The lower of the two bounding breakpoints.
    #[must_use]
    pub fn min_breakpoint(&self) -> &Breakpoint {
        match self.direction {
            InputDirection::Max => &self.entry,
            InputDirection::Min => &self.exit,
        }
    }

    /// The upper of the two bounding breakpoints.
    #[must_use]
    pub fn max_breakpoint(&self) -> &Breakpoint {
        match self.direction {
            InputDirection::Max => &self.exit,
            InputDirection::Min => &self.entry,
        }
    }

    /// Identity of this segment.
    #[must_use]
    pub fn key(&self) -> SegmentKey {
        SegmentKey {
            min: self.min_breakpoint().key().clone(),
            max: self.max_breakpoint().key().clone(),
            direction: self.direction,
        }
    }

    /// Whether `x` travelling in `direction` still belongs to this segment.
    ///
    /// The entry side is inclusive, the exit side exclusive; a direction
    /// mismatch is never valid. The sentinels at `±∞` make the comparison
    /// uniform for unbounded segments.
    #[must_use]
    pub fn is_valid_for_input(&self, x: f32, direction: InputDirection) -> bool {
        if direction != self.direction {
            return false;
        }
        match self.direction {
            InputDirection::Max => self.entry.position() <= x && x < self.exit.position(),
            InputDirection::Min => self.exit.position() < x && x <= self.entry.position(),
        }
    }
}
