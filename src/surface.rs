use crate::{
    block::SurfaceSample,
    collection::BlockCollection,
    error::{PlanError, Result},
    world::{is_air, Criterion, HeightGrid, WorldSnapshot},
    Coordinates, Size,
};

use fnv::FnvHashMap;

/// Lazily computed, per-criterion views of the terrain under one plot.
///
/// Nothing here is refreshed automatically; call `invalidate` when the snapshot changes.
#[derive(Clone, Debug)]
pub struct SurfaceModel {
    origin: Coordinates,
    size: Size,
    heightmaps: FnvHashMap<Criterion, HeightGrid>,
    blocks: FnvHashMap<Criterion, BlockCollection>,
}

impl SurfaceModel {
    pub fn new(origin: Coordinates, size: Size) -> Self {
        SurfaceModel {
            origin: origin.ground(),
            size,
            heightmaps: FnvHashMap::default(),
            blocks: FnvHashMap::default(),
        }
    }

    pub fn invalidate(&mut self) {
        self.heightmaps.clear();
        self.blocks.clear();
    }

    /// The grid for `criterion`, clipped to this plot.
    pub fn heightmap<W: WorldSnapshot + ?Sized>(
        &mut self,
        world: &W,
        criterion: Criterion,
    ) -> Result<&HeightGrid> {
        if !self.heightmaps.contains_key(&criterion) {
            let grid = self.load_heightmap(world, criterion)?;
            self.heightmaps.insert(criterion, grid);
        }

        Ok(&self.heightmaps[&criterion])
    }

    fn load_heightmap<W: WorldSnapshot + ?Sized>(
        &mut self,
        world: &W,
        criterion: Criterion,
    ) -> Result<HeightGrid> {
        if criterion.is_derived() {
            let base = self
                .heightmap(world, Criterion::MotionBlockingNoLeaves)?
                .clone();
            return Ok(descend_through_trees(world, base));
        }

        let full = world
            .heightmap(criterion)
            .ok_or_else(|| PlanError::InvalidCriterion(criterion.name().to_string()))?;

        full.clip(self.origin, self.size)
            .ok_or(PlanError::OutsideSnapshot(self.origin))
    }

    pub fn cached_blocks(&self, criterion: Criterion) -> Option<&BlockCollection> {
        self.blocks.get(&criterion)
    }

    /// One sample per column: the top block under `criterion`, at `height - 1`.
    pub fn blocks<W: WorldSnapshot + ?Sized>(
        &mut self,
        world: &W,
        criterion: Criterion,
    ) -> Result<&BlockCollection> {
        if !self.blocks.contains_key(&criterion) {
            let grid = self.heightmap(world, criterion)?;
            let collection: BlockCollection = grid
                .iter()
                .map(|(column, height)| {
                    let top = column.with_y(height - 1);
                    SurfaceSample::new(world.block_at(&top), top)
                })
                .collect();
            log::debug!(
                "Sampled {} surface blocks for {}",
                collection.len(),
                criterion
            );
            self.blocks.insert(criterion, collection);
        }

        Ok(&self.blocks[&criterion])
    }
}

fn is_tree_part(block: &str) -> bool {
    is_air(block) || ["leaves", "log", "vine"].iter().any(|p| block.contains(p))
}

/// Lowers every column of `grid` past trunks, leaves and vines. A column that never reaches
/// ground before the bottom of the world keeps its height.
pub fn descend_through_trees<W: WorldSnapshot + ?Sized>(
    world: &W,
    mut grid: HeightGrid,
) -> HeightGrid {
    let min_y = world.min_y();
    let columns: Vec<_> = grid.iter().collect();
    for (column, height) in columns {
        let mut y = height - 1;
        while y >= min_y && is_tree_part(world.block_at(&column.with_y(y))) {
            y -= 1;
        }
        if y >= min_y {
            grid.set(column.x, column.z, y + 1);
        }
    }

    grid
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
    use crate::world::{MemoryWorld, AIR};

    fn forest() -> MemoryWorld {
        let mut world = MemoryWorld::flat(Coordinates::default(), Size::new(4, 4), 4, "dirt");
        world.set_column(1, 1, &["stone", "dirt", "dirt", "grass_block", "oak_log", "oak_log"]);
        world.set_column(2, 2, &["stone", "dirt", "grass_block", "vine", "oak_log", "oak_leaves"]);
        world.set_column(3, 3, &["stone", "water", "water"]);

        world
    }

    /// Claims a tall surface everywhere but contains nothing but air.
    struct HollowWorld;

    impl WorldSnapshot for HollowWorld {
        fn block_at(&self, _: &Coordinates) -> &str {
            AIR
        }

        fn heightmap(&self, criterion: Criterion) -> Option<HeightGrid> {
            if criterion.is_derived() {
                None
            } else {
                Some(HeightGrid::filled(Coordinates::default(), Size::new(2, 2), 9))
            }
        }
    }

    #[test]
    fn test_derived_grid_drops_trunks() {
        let world = forest();
        let mut model = SurfaceModel::new(Coordinates::default(), Size::new(4, 4));
        let no_trees = model
            .heightmap(&world, Criterion::MotionBlockingNoTrees)
            .unwrap()
            .clone();

        assert_eq!(no_trees.get(1, 1), Some(4));
        assert_eq!(no_trees.get(2, 2), Some(3));
        assert_eq!(no_trees.get(0, 0), Some(4));
        assert_eq!(no_trees.get(3, 3), Some(3));
    }

    #[test]
    fn test_derived_never_above_no_leaves() {
        let world = forest();
        let mut model = SurfaceModel::new(Coordinates::default(), Size::new(4, 4));
        let no_leaves = model
            .heightmap(&world, Criterion::MotionBlockingNoLeaves)
            .unwrap()
            .clone();
        let no_trees = model
            .heightmap(&world, Criterion::MotionBlockingNoTrees)
            .unwrap();

        for (column, h) in no_trees.iter() {
            assert!(h <= no_leaves.get(column.x, column.z).unwrap());
        }
    }

    #[test]
    fn test_groundless_column_keeps_height() {
        let mut model = SurfaceModel::new(Coordinates::default(), Size::new(2, 2));
        let grid = model
            .heightmap(&HollowWorld, Criterion::MotionBlockingNoTrees)
            .unwrap();
        assert!(grid.iter().all(|(_, h)| h == 9));
    }

    #[test]
    fn test_blocks_sample_top_of_column() {
        let world = forest();
        let mut model = SurfaceModel::new(Coordinates::new(1, 0, 1), Size::new(2, 2));
        let blocks = model
            .blocks(&world, Criterion::MotionBlockingNoTrees)
            .unwrap();
        assert_eq!(blocks.len(), 4);

        let trunk_column = blocks.find(&Coordinates::new(1, 0, 1)).unwrap();
        assert_eq!(trunk_column.name, "grass_block");
        assert_eq!(trunk_column.coordinates.y, 3);
    }

    #[test]
    fn test_plot_outside_snapshot() {
        let world = forest();
        let mut model = SurfaceModel::new(Coordinates::new(3, 0, 3), Size::new(2, 2));
        assert_eq!(
            model.heightmap(&world, Criterion::WorldSurface).map(|_| ()),
            Err(PlanError::OutsideSnapshot(Coordinates::new(3, 0, 3)))
        );
    }

    #[test]
    fn test_invalidate_picks_up_new_terrain() {
        let mut world = forest();
        let mut model = SurfaceModel::new(Coordinates::default(), Size::new(4, 4));
        assert_eq!(
            model
                .heightmap(&world, Criterion::WorldSurface)
                .unwrap()
                .get(0, 0),
            Some(4)
        );

        world.set_block(&Coordinates::new(0, 4, 0), "stone");
        assert_eq!(
            model
                .heightmap(&world, Criterion::WorldSurface)
                .unwrap()
                .get(0, 0),
            Some(4)
        );

        model.invalidate();
        assert_eq!(
            model
                .heightmap(&world, Criterion::WorldSurface)
                .unwrap()
                .get(0, 0),
            Some(5)
        );
    }
}
