use crate::domain::{Domain, Walls};
use crate::error::Result;
use crate::particles::Particles;
use serde::{Deserialize, Serialize};

/// Particle state exported from a simulation at one instant, together with the walls
/// that bound the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub walls: Walls,
    pub particles: Particles,
}

impl Snapshot {
    pub fn domain(&self) -> Result<Domain> {
        Domain::from_walls(self.walls)
    }

    /// Drops particles that escaped the walls, returning the domain and how many were
    /// removed.
    pub fn crop(&mut self) -> Result<(Domain, usize)> {
        let domain = self.domain()?;
        let removed = self.particles.retain_within(&domain.bounds);
        if removed > 0 {
            tracing::warn!(removed, "dropped particles outside the walls");
        }
        Ok((domain, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParticleStore, Vec2};

    fn snapshot() -> Snapshot {
        let mut particles = Particles::new();
        particles.add_particle(0, Vec2::new(1., 1.));
        particles.add_particle(1, Vec2::new(11., 1.));
        particles.add_particle(2, Vec2::new(10., 5.));
        particles
            .set_attribute("disp_y", vec![-0.1, -0.2, -0.3])
            .unwrap();

        Snapshot {
            walls: Walls {
                left: 0.,
                right: 10.,
                bottom: 0.,
                top: 5.,
            },
            particles,
        }
    }

    #[test]
    fn crop_keeps_particles_on_the_walls() {
        let mut s = snapshot();
        let (domain, removed) = s.crop().unwrap();

        assert_eq!(domain.width(), 10.);
        assert_eq!(removed, 1);
        assert_eq!(s.particles.id, vec![0, 2]);
        assert_eq!(&*s.particles.attribute("disp_y").unwrap(), &[-0.1, -0.3]);
    }

    #[test]
    fn reads_json_and_msgpack() {
        let s = snapshot();

        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(serde_json::from_str::<Snapshot>(&json).unwrap(), s);

        let bytes = rmp_serde::to_vec_named(&s).unwrap();
        assert_eq!(rmp_serde::from_slice::<Snapshot>(&bytes).unwrap(), s);
    }

    #[test]
    fn inverted_walls_are_rejected() {
        let mut s = snapshot();
        s.walls.right = -1.;
        assert!(s.crop().is_err());
    }
}
