//! Labels particles by horizontal layer and vertical section.

mod group;
mod layer;
mod section;

pub use group::{assign, assign_ordered};
pub use layer::{plan_layers, LayerParams, LayerPlan, SUBSURFACE_LABEL};
pub use section::{plan_sections, section_count, SectionParams, SectionPlan};

use crate::domain::Domain;
use crate::error::Result;
use crate::particles::ParticleStore;
use crate::{Scalar, LAYER_SLOT, SECTION_SLOT};
use serde::{Deserialize, Serialize};

/// A labelled interval along one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub start: Scalar,
    pub end: Scalar,
    pub label: String,
}

impl Band {
    pub fn width(&self) -> Scalar {
        self.end - self.start
    }

    pub fn shifted(&self, offset: Scalar) -> Band {
        Band {
            start: self.start + offset,
            end: self.end + offset,
            label: self.label.clone(),
        }
    }
}

fn band_boundaries(bands: &[Band]) -> Vec<Scalar> {
    bands
        .first()
        .map(|b| b.start)
        .into_iter()
        .chain(bands.iter().map(|b| b.end))
        .collect()
}

/// Summary of a [`partition_particles`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub layers: LayerPlan,
    pub sections: SectionPlan,
    /// Particles matched by each layer band, bottom to top.
    pub layer_counts: Vec<usize>,
    /// Particles matched by each section band, left to right.
    pub section_counts: Vec<usize>,
}

impl Partition {
    pub fn section_count(&self) -> usize {
        self.sections.count()
    }
}

/// Plans layers and sections for `domain` and labels `store` with them, layers first.
///
/// Both plans are validated before any label is written, so an error leaves the store
/// untouched.
#[tracing::instrument(level = "info", skip(store, domain))]
pub fn partition_particles<S: ParticleStore + ?Sized>(
    store: &mut S,
    domain: &Domain,
    layers: &LayerParams,
    sections: &SectionParams,
) -> Result<Partition> {
    let layer_plan = plan_layers(&layers.thicknesses, layers.margin, domain.height())?;
    let section_plan = plan_sections(domain.origin().x, domain.width(), sections)?;

    let y0 = domain.origin().y;
    let layer_rects: Vec<_> = layer_plan
        .bands
        .iter()
        .map(|band| {
            let band = band.shifted(y0);
            (domain.row(band.start, band.end), band.label)
        })
        .collect();
    let layer_counts = assign_ordered(store, LAYER_SLOT, &layer_rects);

    let section_rects: Vec<_> = section_plan
        .bands
        .iter()
        .map(|band| (domain.column(band.start, band.end), band.label.clone()))
        .collect();
    let section_counts = assign_ordered(store, SECTION_SLOT, &section_rects);

    for (band, count) in layer_plan.bands.iter().zip(&layer_counts) {
        tracing::debug!(layer = %band.label, start = band.start, end = band.end, particles = count);
    }
    tracing::info!(
        layers = layer_plan.count(),
        sections = section_plan.count(),
        particles = store.len(),
        "partitioned particles"
    );

    Ok(Partition {
        layers: layer_plan,
        sections: section_plan,
        layer_counts,
        section_counts,
    })
}
