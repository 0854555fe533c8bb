use super::Band;
use crate::error::{ensure_finite, Error, Result};
use crate::Scalar;
use serde::{Deserialize, Serialize};

/// Label of the topmost band. The name is kept for compatibility with existing analysis
/// scripts even though the band sits at the surface.
pub const SUBSURFACE_LABEL: &str = "subsurface";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerParams {
    /// Cumulative layer tops, measured from the bottom of the domain.
    pub thicknesses: Vec<Scalar>,
    /// Thickness of the band below the top of the domain.
    pub margin: Scalar,
}

impl Default for LayerParams {
    fn default() -> Self {
        LayerParams {
            thicknesses: vec![5.],
            margin: 5.,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPlan {
    /// `[0, thicknesses.., height - margin, height]`, relative to the domain bottom.
    pub boundaries: Vec<Scalar>,
    /// One band per pair of consecutive boundaries, bottom to top.
    pub bands: Vec<Band>,
}

impl LayerPlan {
    pub fn count(&self) -> usize {
        self.bands.len()
    }
}

/// Plans horizontal layers for a domain of the given `height`.
///
/// Bands are labelled `"1"`, `"2"`, ... from the bottom, except the last one which is
/// always [`SUBSURFACE_LABEL`].
#[tracing::instrument(level = "debug", skip(thicknesses))]
pub fn plan_layers(thicknesses: &[Scalar], margin: Scalar, height: Scalar) -> Result<LayerPlan> {
    let invalid = |reason| Error::InvalidLayers { reason };
    ensure_finite(&[("height", height), ("margin", margin)], invalid)?;
    if let Some(t) = thicknesses.iter().find(|t| !t.is_finite()) {
        return Err(invalid(format!("layer thickness must be finite, got {}", t)));
    }

    if margin <= 0. {
        return Err(invalid(format!("margin must be positive, got {}", margin)));
    }
    let ceiling = height - margin;
    if ceiling <= 0. {
        return Err(invalid(format!(
            "margin {} leaves no room in a model {} high",
            margin, height
        )));
    }

    let mut boundaries = Vec::with_capacity(thicknesses.len() + 3);
    boundaries.push(0.);
    boundaries.extend_from_slice(thicknesses);

    if let Some(pair) = boundaries.windows(2).find(|w| w[0] >= w[1]) {
        return Err(invalid(format!(
            "layer tops must be positive and strictly increasing, found {} then {}",
            pair[0], pair[1]
        )));
    }
    if let Some(&top) = thicknesses.last() {
        if top >= ceiling {
            return Err(invalid(format!(
                "layer stack ({}) must stay below height minus margin ({})",
                top, ceiling
            )));
        }
    }

    boundaries.push(ceiling);
    boundaries.push(height);

    let n = boundaries.len() - 1;
    let bands = boundaries
        .windows(2)
        .enumerate()
        .map(|(i, w)| Band {
            start: w[0],
            end: w[1],
            label: if i + 1 == n {
                SUBSURFACE_LABEL.to_owned()
            } else {
                (i + 1).to_string()
            },
        })
        .collect::<Vec<_>>();

    tracing::debug!(layers = bands.len(), "planned layers");

    Ok(LayerPlan { boundaries, bands })
}
