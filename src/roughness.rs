use crate::{sampling::fraction_of, world::HeightGrid, Coordinates};

use fnv::FnvHashSet;

/// Score given to columns that must never be picked.
pub const WORST_ROUGHNESS: u64 = u64::MAX;

/// Local unevenness of each interior column of a plot. Lower is flatter.
#[derive(Clone, Debug, Default)]
pub struct RoughnessMap {
    /// Interior columns in x-major order with their scores.
    cells: Vec<(Coordinates, u64)>,
}

impl RoughnessMap {
    /// Scores every column at least `span` away from the grid border by the sum of absolute
    /// height differences to the `(2 * span + 1)^2` columns around it. Columns in `water` get
    /// `WORST_ROUGHNESS`.
    pub fn compute(grid: &HeightGrid, water: &FnvHashSet<Coordinates>, span: i32) -> Self {
        let origin = grid.origin();
        let size = grid.size();
        let mut cells = Vec::new();
        for dx in span..size.x - span {
            for dz in span..size.z - span {
                let column = origin.shift(dx, 0, dz);
                if water.contains(&column) {
                    cells.push((column, WORST_ROUGHNESS));
                    continue;
                }

                let mut score = 0;
                if let Some(h) = grid.get(column.x, column.z) {
                    for nx in -span..=span {
                        for nz in -span..=span {
                            if let Some(n) = grid.get(column.x + nx, column.z + nz) {
                                score += u64::from((h - n).unsigned_abs());
                            }
                        }
                    }
                }
                cells.push((column, score));
            }
        }

        RoughnessMap { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn score(&self, column: &Coordinates) -> Option<u64> {
        let column = column.ground();
        self.cells
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, s)| *s)
    }

    /// The flattest `fraction` of scored columns, flattest first, minus any in `occupied`.
    /// Ties keep x-major order.
    pub fn priority_cells(
        &self,
        fraction: f32,
        occupied: &FnvHashSet<Coordinates>,
    ) -> Vec<Coordinates> {
        let mut ranked = self.cells.clone();
        ranked.sort_by_key(|(_, score)| *score);

        ranked
            .into_iter()
            .take(fraction_of(self.cells.len(), fraction))
            .filter(|(c, score)| *score != WORST_ROUGHNESS && !occupied.contains(c))
            .map(|(c, _)| c)
            .collect()
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size;

    /// A 10x10 grid that is flat at 64 for x < 5 and a staircase rising along x beyond.
    fn half_stairs() -> HeightGrid {
        let mut grid = HeightGrid::filled(Coordinates::default(), Size::new(10, 10), 64);
        for x in 5..10 {
            for z in 0..10 {
                grid.set(x, z, 64 + 2 * (x - 4));
            }
        }

        grid
    }

    #[test]
    fn test_only_interior_cells_are_scored() {
        let map = RoughnessMap::compute(&half_stairs(), &FnvHashSet::default(), 2);
        assert_eq!(map.len(), 36);
        assert_eq!(map.score(&Coordinates::new(0, 0, 0)), None);
        assert_eq!(map.score(&Coordinates::new(2, 0, 2)), Some(0));
        assert!(map.score(&Coordinates::new(6, 0, 5)).unwrap() > 0);
    }

    #[test]
    fn test_priority_prefers_flat_ground() {
        let map = RoughnessMap::compute(&half_stairs(), &FnvHashSet::default(), 1);
        let picked = map.priority_cells(0.1, &FnvHashSet::default());
        assert_eq!(picked.len(), 6);
        assert!(picked.iter().all(|c| c.x < 4));
    }

    #[test]
    fn test_water_and_occupied_are_never_priority() {
        let grid = HeightGrid::filled(Coordinates::default(), Size::new(6, 6), 64);
        let mut water = FnvHashSet::default();
        water.insert(Coordinates::new(1, 0, 1));
        let mut occupied = FnvHashSet::default();
        occupied.insert(Coordinates::new(1, 0, 2));

        let map = RoughnessMap::compute(&grid, &water, 1);
        assert_eq!(map.score(&Coordinates::new(1, 0, 1)), Some(WORST_ROUGHNESS));

        let picked = map.priority_cells(1.0, &occupied);
        assert_eq!(picked.len(), 14);
        assert!(!picked.contains(&Coordinates::new(1, 0, 1)));
        assert!(!picked.contains(&Coordinates::new(1, 0, 2)));
    }

    #[test]
    fn test_fraction_is_a_knob() {
        let map = RoughnessMap::compute(&half_stairs(), &FnvHashSet::default(), 1);
        let few = map.priority_cells(0.1, &FnvHashSet::default());
        let many = map.priority_cells(0.5, &FnvHashSet::default());
        assert!(few.len() < many.len());
        assert_eq!(&many[..few.len()], &few[..]);
    }
}
