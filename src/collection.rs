use crate::{block::SurfaceSample, sampling::sample_indices_with_replacement, Coordinates};

use fnv::{FnvHashMap, FnvHashSet};
use rand::Rng;
use std::ops::Add;

/// An ordered set of surface samples, indexed by column.
///
/// The column index is keyed by the ground-plane projection, so only the most recently
/// inserted sample of a column can be found with `find`. Iteration still yields every
/// sample in insertion order, duplicates included.
#[derive(Clone, Debug, Default)]
pub struct BlockCollection {
    samples: Vec<SurfaceSample>,
    by_column: FnvHashMap<Coordinates, usize>,
}

impl BlockCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: SurfaceSample) {
        self.by_column.insert(sample.column(), self.samples.len());
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SurfaceSample> {
        self.samples.iter()
    }

    pub fn get(&self, i: usize) -> Option<&SurfaceSample> {
        self.samples.get(i)
    }

    /// The sample for the column containing `coordinates`; the height is ignored.
    pub fn find(&self, coordinates: &Coordinates) -> Option<&SurfaceSample> {
        self.by_column
            .get(&coordinates.ground())
            .map(|i| &self.samples[*i])
    }

    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        self.by_column.contains_key(&coordinates.ground())
    }

    pub fn positions(&self) -> impl Iterator<Item = Coordinates> + '_ {
        self.samples.iter().map(|s| s.coordinates)
    }

    fn retain(&self, predicate: impl Fn(&SurfaceSample) -> bool) -> Self {
        self.samples
            .iter()
            .filter(|s| predicate(s))
            .cloned()
            .collect()
    }

    /// Samples whose name contains any of `patterns`.
    pub fn filter(&self, patterns: &[&str]) -> Self {
        self.retain(|s| s.name_matches_any(patterns))
    }

    /// Samples whose name contains none of `patterns`.
    pub fn without(&self, patterns: &[&str]) -> Self {
        self.retain(|s| !s.name_matches_any(patterns))
    }

    /// Samples whose column is not in `columns`. The set must hold ground-plane keys.
    pub fn not_inside(&self, columns: &FnvHashSet<Coordinates>) -> Self {
        self.retain(|s| !columns.contains(&s.column()))
    }

    /// `n` samples drawn with replacement.
    pub fn random_elements(&self, n: usize, rng: &mut impl Rng) -> Self {
        sample_indices_with_replacement(self.samples.len(), n, rng)
            .into_iter()
            .map(|i| self.samples[i].clone())
            .collect()
    }

    /// Samples whose column lies within the square of `radius` around `center`.
    pub fn near(&self, center: &Coordinates, radius: i32) -> Self {
        let mut found = BlockCollection::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                if let Some(s) = self.find(&center.ground().shift(dx, 0, dz)) {
                    found.push(s.clone());
                }
            }
        }

        found
    }
}

impl std::iter::FromIterator<SurfaceSample> for BlockCollection {
    fn from_iter<I: IntoIterator<Item = SurfaceSample>>(iter: I) -> Self {
        let mut collection = BlockCollection::new();
        for s in iter {
            collection.push(s);
        }

        collection
    }
}

impl Add for BlockCollection {
    type Output = BlockCollection;

    /// Concatenation. Duplicated columns are kept in iteration order.
    fn add(mut self, rhs: BlockCollection) -> BlockCollection {
        for s in rhs.samples {
            self.push(s);
        }

        self
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
