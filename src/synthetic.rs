use crate::util::{RangeExt, Rect};
use crate::{Particles, Scalar, Vec2};
use num::ToPrimitive;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A jittered lattice of particles filling a rectangle, for tests and benchmarks.
///
/// Lattice sites sit half a spacing in from the lower bounds, and each particle is moved
/// by at most `jitter / 2` per axis.
pub struct ParticleBlock {
    pub bounds: Rect,
    pub spacing: Scalar,
    pub jitter: Scalar,
    pub seed: u64,
}

impl Default for ParticleBlock {
    fn default() -> Self {
        ParticleBlock {
            bounds: Vec2::zeros()..Vec2::new(30., 20.),
            spacing: 0.25,
            jitter: 0.25 / 8.,
            seed: 0,
        }
    }
}

impl ParticleBlock {
    pub fn generate(&self) -> Particles {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut particles = Particles::new();

        // Empty or inverted bounds give an empty block.
        let counts = (self.bounds.size() / self.spacing).map(|x| x.floor().to_usize().unwrap_or(0));

        for (j, i) in itertools::iproduct!(0..counts.y, 0..counts.x) {
            let site = self.bounds.start
                + Vec2::new(i as Scalar + 0.5, j as Scalar + 0.5) * self.spacing;
            let jitter = Vec2::new(rng.gen::<Scalar>() - 0.5, rng.gen::<Scalar>() - 0.5) * self.jitter;

            let id = particles.id.len() as u64;
            particles.add_particle(id, site + jitter);
        }

        particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParticleStore;

    #[test]
    fn block_stays_inside_bounds() {
        let block = ParticleBlock::default();
        let particles = block.generate();

        assert_eq!(particles.len(), 120 * 80);
        assert!(particles
            .positions()
            .iter()
            .all(|p| block.bounds.contains_point(p)));
    }

    #[test]
    fn same_seed_same_particles() {
        let a = ParticleBlock::default().generate();
        let b = ParticleBlock::default().generate();
        let c = ParticleBlock {
            seed: 1,
            ..ParticleBlock::default()
        }
        .generate();

        assert_eq!(a, b);
        assert_ne!(a.position, c.position);
    }
}
