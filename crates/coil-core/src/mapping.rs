#![forbid(unsafe_code)]

//! Per-segment mapping functions.
//!
//! A mapping turns an input position into an output value. The closed
//! variants cover the overwhelmingly common cases and evaluate with no
//! allocation and no indirection; [`Mapping::Custom`] is the escape hatch
//! for host-defined curves, which must be pure — the engine assumes
//! `map(x)` is the same value every time it is asked within a frame.

use std::fmt;
use std::sync::Arc;

/// A pure, continuous `f32 -> f32` mapping for one segment.
#[derive(Clone)]
pub enum Mapping {
    /// `y = x`.
    Identity,
    /// `y = c` regardless of input.
    Fixed(f32),
    /// `y = factor * x + offset`.
    Linear { factor: f32, offset: f32 },
    /// Host-supplied pure function.
    Custom(Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

impl Mapping {
    /// Constant-zero mapping.
    pub const ZERO: Self = Self::Fixed(0.0);

    /// `y = factor * x + offset`.
    #[must_use]
    pub fn linear(factor: f32, offset: f32) -> Self {
        Self::Linear { factor, offset }
    }

    /// The straight line through `(x0, y0)` and `(x1, y1)`.
    ///
    /// Both x positions must differ; the caller guarantees that (the
    /// builder only calls this with strictly ordered breakpoints).
    #[must_use]
    pub(crate) fn line_through(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let factor = (y1 - y0) / (x1 - x0);
        Self::Linear {
            factor,
            offset: y0 - factor * x0,
        }
    }

    /// Evaluate the mapping.
    #[inline]
    #[must_use]
    pub fn map(&self, x: f32) -> f32 {
        match self {
            Self::Identity => x,
            Self::Fixed(c) => *c,
            Self::Linear { factor, offset } => factor * x + offset,
            Self::Custom(f) => f(x),
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Fixed(c) => f.debug_tuple("Fixed").field(c).finish(),
            Self::Linear { factor, offset } => f
                .debug_struct("Linear")
                .field("factor", factor)
                .field("offset", offset)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Mapping {
    /// Structural equality for the closed variants; pointer equality for
    /// [`Mapping::Custom`].
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Identity, Self::Identity) => true,
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            (
                Self::Linear {
                    factor: fa,
                    offset: oa,
                },
                Self::Linear {
                    factor: fb,
                    offset: ob,
                },
            ) => fa == fb && oa == ob,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
