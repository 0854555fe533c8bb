//! Post-processing for discrete particle (granular / soil) simulations.
//!
//! Two independent pipelines share a particle snapshot and its domain bounds:
//!
//! - [`partition`] plans horizontal layers and vertical sections and stamps the matching
//!   labels onto the particles of a [`ParticleStore`].
//! - [`field`] averages a per-particle attribute over a sliding window grid and fills the
//!   holes in that grid with a scattered-data interpolator.

pub mod config;
pub mod domain;
pub mod error;
pub mod field;
pub mod particles;
pub mod partition;
pub mod snapshot;
pub mod statistics;
pub mod synthetic;
pub mod util;

extern crate nalgebra as na;

pub use config::PostprocessConfig;
pub use domain::{Domain, Walls};
pub use error::{Error, Result};
pub use field::{fill_gaps, windowed_mean, FieldGrid, Method, WindowParams};
pub use particles::{ParticleStore, Particles};
pub use partition::{
    assign, assign_ordered, partition_particles, plan_layers, plan_sections, section_count,
    Band, LayerParams, LayerPlan, SectionParams, SectionPlan,
};

pub type Scalar = f64;
pub type Vec2 = na::Vector2<Scalar>;

/// Slot holding the layer label of a particle.
pub const LAYER_SLOT: &str = "layer";
/// Slot holding the section label of a particle.
pub const SECTION_SLOT: &str = "section";
