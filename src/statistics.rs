use crate::error::Result;
use crate::particles::ParticleStore;
use crate::{FieldGrid, Scalar};

/// Summary of a reconstructed field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStatistics {
    pub cells: usize,
    pub missing: usize,
    pub gaps: usize,
    pub min: Option<Scalar>,
    pub max: Option<Scalar>,
    pub mean: Option<Scalar>,
}

impl FieldStatistics {
    pub fn of(grid: &FieldGrid) -> Self {
        let real: Vec<Scalar> = grid.values.iter().flatten().copied().collect();
        let min = real.iter().copied().min_by(|a, b| a.total_cmp(b));
        let max = real.iter().copied().max_by(|a, b| a.total_cmp(b));
        let mean = if real.is_empty() {
            None
        } else {
            Some(real.iter().sum::<Scalar>() / real.len() as Scalar)
        };

        FieldStatistics {
            cells: grid.num_cells(),
            missing: grid.num_cells() - real.len(),
            gaps: grid.gaps.iter().filter(|&&g| g).count(),
            min,
            max,
            mean,
        }
    }
}

/// Mean of attribute `name` over the particles at `indices`, `None` for an empty selection.
pub fn mean_attribute<S: ParticleStore + ?Sized>(
    store: &S,
    name: &str,
    indices: &[usize],
) -> Result<Option<Scalar>> {
    let values = store.attribute(name)?;
    if indices.is_empty() {
        return Ok(None);
    }
    let sum: Scalar = indices.iter().map(|&i| values[i]).sum();
    Ok(Some(sum / indices.len() as Scalar))
}
