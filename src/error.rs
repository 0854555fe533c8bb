use crate::Scalar;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong before a planner, the window builder or the gap filler
/// touches any data. All checks run up front, so an `Err` never leaves partial labels or a
/// half-built grid behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid sections: {reason}")]
    InvalidSections { reason: String },

    #[error("invalid layers: {reason}")]
    InvalidLayers { reason: String },

    #[error("invalid window: {reason}")]
    InvalidWindow { reason: String },

    #[error("invalid domain: {reason}")]
    InvalidDomain { reason: String },

    #[error("unknown interpolation method {0:?} (expected nearest, linear or cubic)")]
    UnknownMethod(String),

    #[error("unknown particle attribute {0:?}")]
    UnknownAttribute(String),

    #[error("{what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("axis {0} out of range, particles are two dimensional")]
    InvalidAxis(usize),
}

/// Fails with `make(reason)` unless every value is finite.
pub(crate) fn ensure_finite(
    values: &[(&str, Scalar)],
    make: impl Fn(String) -> Error,
) -> Result<()> {
    for (name, value) in values {
        if !value.is_finite() {
            return Err(make(format!("{} must be finite, got {}", name, value)));
        }
    }
    Ok(())
}
