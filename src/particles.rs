use crate::error::{Error, Result};
use crate::util::{RangeExt, Rect};
use crate::{Scalar, Vec2};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// The capability set the post-processing code needs from whatever holds the particles.
///
/// Queries are bulk: one call returns the data for every particle, indexed the same way
/// across calls. A backend that only has per-object access collects into an owned `Cow`.
pub trait ParticleStore {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn positions(&self) -> Cow<'_, [Vec2]>;

    fn attribute(&self, name: &str) -> Result<Cow<'_, [Scalar]>>;

    /// Sets `slot` to `label` for every particle whose entry in `mask` is `true`. Other
    /// particles keep whatever label they had.
    fn set_label(&mut self, mask: &[bool], slot: &str, label: &str);

    fn label(&self, index: usize, slot: &str) -> Option<&str>;
}

/// In-memory particle storage, one `Vec` per quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Particles {
    pub id: Vec<u64>,
    pub position: Vec<Vec2>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<Scalar>>,
    #[serde(default)]
    pub labels: BTreeMap<String, Vec<Option<String>>>,
}

impl Particles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a particle with no attributes or labels. Attributes are attached in bulk with
    /// [`Particles::set_attribute`] once every particle is in.
    pub fn add_particle(&mut self, id: u64, position: Vec2) {
        self.id.push(id);
        self.position.push(position);
        for values in self.attributes.values_mut() {
            values.push(0.);
        }
        for labels in self.labels.values_mut() {
            labels.push(None);
        }
    }

    pub fn set_attribute(&mut self, name: &str, values: Vec<Scalar>) -> Result<()> {
        if values.len() != self.len() {
            return Err(Error::LengthMismatch {
                what: format!("attribute {:?}", name),
                expected: self.len(),
                actual: values.len(),
            });
        }
        self.attributes.insert(name.to_owned(), values);
        Ok(())
    }

    /// Deletes every particle outside `bounds` (inclusive). Returns how many were removed.
    pub fn retain_within(&mut self, bounds: &Rect) -> usize {
        let keep: Vec<bool> = self
            .position
            .iter()
            .map(|p| bounds.contains_point(p))
            .collect();
        let removed = keep.iter().filter(|&&k| !k).count();
        if removed == 0 {
            return 0;
        }

        retain_by_mask(&mut self.id, &keep);
        retain_by_mask(&mut self.position, &keep);
        for values in self.attributes.values_mut() {
            retain_by_mask(values, &keep);
        }
        for labels in self.labels.values_mut() {
            retain_by_mask(labels, &keep);
        }

        tracing::debug!(removed, remaining = self.len(), "cropped particles to bounds");
        removed
    }

    /// Largest coordinate along `axis` (0 for x, 1 for y), `None` without particles.
    pub fn max_position(&self, axis: usize) -> Result<Option<Scalar>> {
        if axis > 1 {
            return Err(Error::InvalidAxis(axis));
        }
        Ok(self
            .position
            .iter()
            .map(|p| p[axis])
            .fold(None, |max: Option<Scalar>, v| {
                Some(max.map_or(v, |m| m.max(v)))
            }))
    }

    /// Indices of the particles labelled `label` in `slot` whose height lies in `y_range`.
    pub fn select(&self, slot: &str, label: &str, y_range: RangeInclusive<Scalar>) -> Vec<usize> {
        let labels = match self.labels.get(slot) {
            Some(labels) => labels,
            None => return Vec::new(),
        };

        labels
            .iter()
            .zip(&self.position)
            .enumerate()
            .filter(|(_, (l, p))| l.as_deref() == Some(label) && y_range.contains(&p.y))
            .map(|(i, _)| i)
            .collect()
    }
}

fn retain_by_mask<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut keep = keep.iter();
    values.retain(|_| *keep.next().unwrap_or(&false));
}

impl ParticleStore for Particles {
    fn len(&self) -> usize {
        self.position.len()
    }

    fn positions(&self) -> Cow<'_, [Vec2]> {
        Cow::Borrowed(&self.position)
    }

    fn attribute(&self, name: &str) -> Result<Cow<'_, [Scalar]>> {
        self.attributes
            .get(name)
            .map(|values| Cow::Borrowed(values.as_slice()))
            .ok_or_else(|| Error::UnknownAttribute(name.to_owned()))
    }

    fn set_label(&mut self, mask: &[bool], slot: &str, label: &str) {
        let n = self.position.len();
        let labels = self
            .labels
            .entry(slot.to_owned())
            .or_insert_with(|| vec![None; n]);

        for (current, &selected) in labels.iter_mut().zip(mask) {
            if selected {
                *current = Some(label.to_owned());
            }
        }
    }

    fn label(&self, index: usize, slot: &str) -> Option<&str> {
        self.labels.get(slot)?.get(index)?.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::rect;

    fn three_particles() -> Particles {
        let mut p = Particles::new();
        p.add_particle(10, Vec2::new(0., 0.));
        p.add_particle(11, Vec2::new(1., 2.));
        p.add_particle(12, Vec2::new(5., 1.));
        p.set_attribute("disp_y", vec![-1., -2., -3.]).unwrap();
        p
    }

    #[test]
    fn attribute_length_is_checked() {
        let mut p = three_particles();
        assert_eq!(
            p.set_attribute("disp_x", vec![0.; 2]),
            Err(Error::LengthMismatch {
                what: "attribute \"disp_x\"".to_owned(),
                expected: 3,
                actual: 2
            })
        );
        assert!(matches!(
            p.attribute("missing"),
            Err(Error::UnknownAttribute(_))
        ));
    }

    #[test]
    fn set_label_only_touches_masked_particles() {
        let mut p = three_particles();
        p.set_label(&[true, false, true], "section", "0");
        p.set_label(&[false, false, true], "section", "1");

        assert_eq!(p.label(0, "section"), Some("0"));
        assert_eq!(p.label(1, "section"), None);
        assert_eq!(p.label(2, "section"), Some("1"));
        assert_eq!(p.label(0, "layer"), None);
    }

    #[test]
    fn retain_within_keeps_columns_aligned() {
        let mut p = three_particles();
        p.set_label(&[true, true, true], "layer", "1");

        let removed = p.retain_within(&rect(0., 2., 0., 2.));

        assert_eq!(removed, 1);
        assert_eq!(p.id, vec![10, 11]);
        assert_eq!(p.attribute("disp_y").unwrap().as_ref(), &[-1., -2.]);
        assert_eq!(p.labels["layer"].len(), 2);
    }

    #[test]
    fn max_position_per_axis() {
        let p = three_particles();
        assert_eq!(p.max_position(0), Ok(Some(5.)));
        assert_eq!(p.max_position(1), Ok(Some(2.)));
        assert_eq!(p.max_position(2), Err(Error::InvalidAxis(2)));
        assert_eq!(Particles::new().max_position(0), Ok(None));
    }

    #[test]
    fn select_by_label_and_height() {
        let mut p = three_particles();
        p.set_label(&[true, true, false], "section", "0");

        assert_eq!(p.select("section", "0", 0.0..=2.0), vec![0, 1]);
        assert_eq!(p.select("section", "0", 0.5..=2.0), vec![1]);
        assert!(p.select("layer", "0", 0.0..=2.0).is_empty());
    }

    #[test]
    fn particles_added_after_labels_start_unlabelled() {
        let mut p = three_particles();
        p.set_label(&[true, true, true], "layer", "1");
        p.add_particle(13, Vec2::new(0., 0.));

        assert_eq!(p.label(3, "layer"), None);
        assert_eq!(p.attribute("disp_y").unwrap().len(), 4);
    }
}
