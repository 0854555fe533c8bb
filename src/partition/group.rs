use crate::particles::ParticleStore;
use crate::util::{RangeExt, Rect};

/// Labels every particle inside `rect` (bounds inclusive on both axes) with `label` in
/// `slot`, returning how many particles matched.
///
/// Particles outside are left alone rather than cleared, so calls do not commute: where
/// two rectangles overlap, the later call's label is the one that sticks.
#[tracing::instrument(level = "trace", skip(store))]
pub fn assign<S: ParticleStore + ?Sized>(store: &mut S, rect: &Rect, slot: &str, label: &str) -> usize {
    let mask: Vec<bool> = store
        .positions()
        .iter()
        .map(|p| rect.contains_point(p))
        .collect();

    let matched = mask.iter().filter(|&&m| m).count();
    if matched > 0 {
        store.set_label(&mask, slot, label);
    }

    tracing::trace!(matched, "assigned group");
    matched
}

/// Applies each `(rect, label)` pair in order. Later pairs win where rectangles overlap.
/// Returns the number of particles matched by each pair.
pub fn assign_ordered<S, L>(store: &mut S, slot: &str, assignments: &[(Rect, L)]) -> Vec<usize>
where
    S: ParticleStore + ?Sized,
    L: AsRef<str>,
{
    assignments
        .iter()
        .map(|(rect, label)| assign(store, rect, slot, label.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::rect;
    use crate::{Particles, Vec2};

    fn row_of_particles() -> Particles {
        let mut p = Particles::new();
        for i in 0..6 {
            p.add_particle(i, Vec2::new(i as f64, 0.5));
        }
        p
    }

    #[test]
    fn later_assignment_wins_in_overlap() {
        let mut p = row_of_particles();

        assign(&mut p, &rect(0., 3., 0., 1.), "section", "a");
        assign(&mut p, &rect(2., 5., 0., 1.), "section", "b");

        let labels: Vec<_> = (0..6).map(|i| p.label(i, "section")).collect();
        assert_eq!(
            labels,
            vec![Some("a"), Some("a"), Some("b"), Some("b"), Some("b"), Some("b")]
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut p = row_of_particles();
        let matched = assign(&mut p, &rect(1., 3., 0.5, 0.5), "layer", "x");

        assert_eq!(matched, 3);
        assert_eq!(p.label(1, "layer"), Some("x"));
        assert_eq!(p.label(3, "layer"), Some("x"));
        assert_eq!(p.label(4, "layer"), None);
    }

    #[test]
    fn empty_rectangle_is_a_no_op() {
        let mut p = row_of_particles();
        assign(&mut p, &rect(0., 5., 0., 1.), "layer", "keep");

        let matched = assign(&mut p, &rect(10., 11., 0., 1.), "layer", "lost");

        assert_eq!(matched, 0);
        assert!((0..6).all(|i| p.label(i, "layer") == Some("keep")));
    }

    #[test]
    fn ordered_list_applies_in_sequence() {
        let mut p = row_of_particles();
        let matched = assign_ordered(
            &mut p,
            "section",
            &[
                (rect(0., 5., 0., 1.), "all"),
                (rect(4., 5., 0., 1.), "end"),
            ],
        );

        assert_eq!(matched, vec![6, 2]);
        assert_eq!(p.label(3, "section"), Some("all"));
        assert_eq!(p.label(4, "section"), Some("end"));
    }
}
