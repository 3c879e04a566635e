#![forbid(unsafe_code)]

//! Construction and lookup errors.
//!
//! Every variant here indicates a bug in the caller — a malformed spec, a
//! degenerate parameter, or a non-finite input fed to a lookup. Nothing is
//! retried or clamped internally; errors surface at the call site.

use std::fmt;

use crate::breakpoint::BreakpointKey;

/// A motion spec or one of its ingredients failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecError {
    /// A spec needs at least the two boundary sentinels.
    TooFewBreakpoints { count: usize },
    /// The first or last breakpoint is not the expected sentinel.
    MissingSentinel { expected: BreakpointKey },
    /// A sentinel key or infinite position appears between the bounds.
    InteriorSentinel { index: usize },
    /// Breakpoint positions are not strictly increasing.
    UnsortedPositions { index: usize },
    /// `mappings.len()` must be `breakpoints.len() - 1`.
    MappingCount { breakpoints: usize, mappings: usize },
    /// Two breakpoints share a key.
    DuplicateKey { key: BreakpointKey },
    /// Spring stiffness must be finite and positive.
    InvalidStiffness { stiffness: f32 },
    /// Spring damping ratio must be finite and non-negative.
    InvalidDampingRatio { damping_ratio: f32 },
    /// Guarantee thresholds must be finite and positive.
    InvalidGuaranteeThreshold { value: f32 },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewBreakpoints { count } => {
                write!(f, "spec needs at least 2 breakpoints, got {count}")
            }
            Self::MissingSentinel { expected } => {
                write!(f, "spec boundary is not the {expected} sentinel")
            }
            Self::InteriorSentinel { index } => {
                write!(f, "breakpoint {index} is a sentinel inside the spec bounds")
            }
            Self::UnsortedPositions { index } => {
                write!(f, "breakpoint {index} is not strictly above its predecessor")
            }
            Self::MappingCount {
                breakpoints,
                mappings,
            } => write!(
                f,
                "{breakpoints} breakpoints need {} mappings, got {mappings}",
                breakpoints.saturating_sub(1)
            ),
            Self::DuplicateKey { key } => write!(f, "duplicate breakpoint key {key}"),
            Self::InvalidStiffness { stiffness } => {
                write!(f, "spring stiffness must be finite and > 0, got {stiffness}")
            }
            Self::InvalidDampingRatio { damping_ratio } => write!(
                f,
                "spring damping ratio must be finite and >= 0, got {damping_ratio}"
            ),
            Self::InvalidGuaranteeThreshold { value } => {
                write!(f, "guarantee threshold must be finite and > 0, got {value}")
            }
        }
    }
}

impl std::error::Error for SpecError {}

/// A lookup was fed a value it cannot order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputError {
    /// Breakpoint lookups require a finite input.
    NonFinite { value: f32 },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { value } => write!(f, "input must be finite, got {value}"),
        }
    }
}

impl std::error::Error for InputError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_are_informative() {
        let err = SpecError::MappingCount {
            breakpoints: 4,
            mappings: 2,
        };
        assert_eq!(err.to_string(), "4 breakpoints need 3 mappings, got 2");

        let err = InputError::NonFinite { value: f32::NAN };
        assert!(err.to_string().contains("finite"));
    }
}
