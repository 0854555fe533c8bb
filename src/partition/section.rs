use super::Band;
use crate::error::{ensure_finite, Error, Result};
use crate::Scalar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionParams {
    /// Width of every regular section.
    pub interval: Scalar,
    /// Width of an irregular first section, or 0 to start with a regular one.
    pub first_length: Scalar,
    /// A leftover strip at the right edge only becomes its own section when it is wider
    /// than this. Usually about one particle diameter.
    pub min_residual: Scalar,
}

impl Default for SectionParams {
    fn default() -> Self {
        SectionParams {
            interval: 3.,
            first_length: 5.,
            min_residual: 0.,
        }
    }
}

impl SectionParams {
    pub fn validate(&self, total_width: Scalar) -> Result<()> {
        let invalid = |reason| Error::InvalidSections { reason };
        ensure_finite(
            &[
                ("total width", total_width),
                ("interval", self.interval),
                ("first section length", self.first_length),
                ("minimum residual", self.min_residual),
            ],
            invalid,
        )?;

        if self.interval <= 0. {
            return Err(invalid(format!(
                "interval must be positive, got {}",
                self.interval
            )));
        }
        if self.first_length < 0. {
            return Err(invalid(format!(
                "first section length must not be negative, got {}",
                self.first_length
            )));
        }
        if self.min_residual < 0. {
            return Err(invalid(format!(
                "minimum residual must not be negative, got {}",
                self.min_residual
            )));
        }
        if total_width <= self.first_length + self.interval {
            return Err(invalid(format!(
                "first section plus one interval ({}) must be narrower than the model ({})",
                self.first_length + self.interval,
                total_width
            )));
        }
        Ok(())
    }
}

/// Number of regular sections that fit in `total_width`.
///
/// With a first section of `first_length > 0` this is one plus the number of whole
/// intervals in the remaining width, otherwise the number of whole intervals.
pub fn section_count(total_width: Scalar, interval: Scalar, first_length: Scalar) -> Result<usize> {
    let params = SectionParams {
        interval,
        first_length,
        min_residual: 0.,
    };
    params.validate(total_width)?;
    Ok(regular_count(total_width, &params))
}

fn regular_count(total_width: Scalar, params: &SectionParams) -> usize {
    if params.first_length > 0. {
        ((total_width - params.first_length) / params.interval).floor() as usize + 1
    } else {
        (total_width / params.interval).floor() as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionPlan {
    /// Sections from left to right, labelled `"0"`, `"1"`, ...
    pub bands: Vec<Band>,
    /// Whether the last band is the leftover strip rather than a regular section.
    pub has_residual: bool,
}

impl SectionPlan {
    pub fn count(&self) -> usize {
        self.bands.len()
    }

    /// Cut points from the left edge of the first section to the right edge of the last.
    pub fn boundaries(&self) -> Vec<Scalar> {
        super::band_boundaries(&self.bands)
    }
}

/// Splits `[x0, x0 + total_width]` into sections.
///
/// Each band nominally covers `[start, end)`; the assigner uses inclusive bounds, so a
/// particle on a shared edge ends up in the later section. Whatever is left past the last
/// regular section becomes one more section if it is wider than `params.min_residual`,
/// and stays unlabelled otherwise.
#[tracing::instrument(level = "debug")]
pub fn plan_sections(x0: Scalar, total_width: Scalar, params: &SectionParams) -> Result<SectionPlan> {
    params.validate(total_width)?;
    ensure_finite(&[("x0", x0)], |reason| Error::InvalidSections { reason })?;

    let x_end = x0 + total_width;
    let count = regular_count(total_width, params);

    // Edges are computed from the index rather than accumulated so rounding can't drift.
    let edge = |j: usize| -> Scalar {
        let x = if params.first_length > 0. {
            if j == 0 {
                x0
            } else {
                x0 + params.first_length + (j - 1) as Scalar * params.interval
            }
        } else {
            x0 + j as Scalar * params.interval
        };
        x.min(x_end)
    };

    let mut bands: Vec<Band> = (0..count)
        .map(|j| Band {
            start: edge(j),
            end: edge(j + 1),
            label: j.to_string(),
        })
        .filter(|band| band.end > band.start)
        .collect();

    let last_end = bands.last().map_or(x0, |band| band.end);
    let residual = x_end - last_end;
    let has_residual = residual > params.min_residual;
    if has_residual {
        bands.push(Band {
            start: last_end,
            end: x_end,
            label: bands.len().to_string(),
        });
    }

    tracing::debug!(
        sections = bands.len(),
        residual,
        has_residual,
        "planned sections"
    );

    Ok(SectionPlan {
        bands,
        has_residual,
    })
}
