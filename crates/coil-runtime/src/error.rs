#![forbid(unsafe_code)]

//! Engine errors.

use std::fmt;

use coil_core::InputError;

/// Errors surfaced by the frame-driven engine.
///
/// Both variants indicate caller bugs; the engine never retries or clamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineError {
    /// The input source produced a non-finite value; the frame is abandoned
    /// with all state untouched.
    Input(InputError),
    /// A second `keep_running` entry while an earlier one is still active.
    AlreadyRunning,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(e) => write!(f, "input error: {e}"),
            Self::AlreadyRunning => f.write_str("engine loop is already running"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Input(e) => Some(e),
            Self::AlreadyRunning => None,
        }
    }
}

impl From<InputError> for EngineError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}
