//! Scattered-data interpolation used to fill missing grid cells.

mod cubic;
mod linear;
mod nearest;
pub mod triangulation;

pub use cubic::ThinPlate;
pub use linear::Linear;
pub use nearest::Nearest;
pub use triangulation::Triangulation;

use crate::error::Error;
use crate::{Scalar, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A known value at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: Vec2,
    pub value: Scalar,
}

impl Sample {
    pub fn new(x: Scalar, y: Scalar, value: Scalar) -> Self {
        Sample {
            position: Vec2::new(x, y),
            value,
        }
    }
}

/// Estimates values at query points from scattered samples.
///
/// `None` means the interpolator cannot produce an estimate for that query, typically
/// because it lies outside the samples' convex hull.
pub trait ScatteredInterpolator: Sync {
    fn interpolate(&self, samples: &[Sample], queries: &[Vec2]) -> Vec<Option<Scalar>>;
}

/// Interpolation method selected by name in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Nearest,
    Linear,
    Cubic,
}

impl Default for Method {
    fn default() -> Self {
        Method::Nearest
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Method::Nearest),
            "linear" => Ok(Method::Linear),
            "cubic" => Ok(Method::Cubic),
            _ => Err(Error::UnknownMethod(s.to_owned())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Nearest => "nearest",
            Method::Linear => "linear",
            Method::Cubic => "cubic",
        };
        f.write_str(name)
    }
}

impl ScatteredInterpolator for Method {
    fn interpolate(&self, samples: &[Sample], queries: &[Vec2]) -> Vec<Option<Scalar>> {
        match self {
            Method::Nearest => Nearest.interpolate(samples, queries),
            Method::Linear => Linear.interpolate(samples, queries),
            Method::Cubic => ThinPlate::default().interpolate(samples, queries),
        }
    }
}
