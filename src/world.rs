use crate::{error::PlanError, Coordinates, Size};

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const AIR: &str = "minecraft:air";

/// A rule for deciding which block counts as the top of a column.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Criterion {
    /// Topmost solid or liquid block.
    MotionBlocking,
    /// Like `MotionBlocking`, ignoring leaves.
    MotionBlockingNoLeaves,
    /// Topmost non-air block.
    WorldSurface,
    /// Topmost solid, non-liquid block.
    OceanFloor,
    /// Derived from `MotionBlockingNoLeaves` by descending through trunks and vines.
    MotionBlockingNoTrees,
}

impl Criterion {
    pub const BASE: [Criterion; 4] = [
        Criterion::MotionBlocking,
        Criterion::MotionBlockingNoLeaves,
        Criterion::WorldSurface,
        Criterion::OceanFloor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Criterion::MotionBlocking => "MOTION_BLOCKING",
            Criterion::MotionBlockingNoLeaves => "MOTION_BLOCKING_NO_LEAVES",
            Criterion::WorldSurface => "WORLD_SURFACE",
            Criterion::OceanFloor => "OCEAN_FLOOR",
            Criterion::MotionBlockingNoTrees => "MOTION_BLOCKING_NO_TREES",
        }
    }

    /// Whether the snapshot is expected to supply this grid itself.
    pub fn is_derived(&self) -> bool {
        matches!(self, Criterion::MotionBlockingNoTrees)
    }

    /// Whether `block` terminates a downward scan under this criterion.
    pub fn counts_as_top(&self, block: &str) -> bool {
        let blocking = !is_passable(block);
        match self {
            Criterion::WorldSurface => !is_air(block),
            Criterion::MotionBlocking => blocking,
            Criterion::MotionBlockingNoLeaves | Criterion::MotionBlockingNoTrees => {
                blocking && !block.contains("leaves")
            }
            Criterion::OceanFloor => blocking && !is_liquid(block),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Criterion {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MOTION_BLOCKING" => Ok(Criterion::MotionBlocking),
            "MOTION_BLOCKING_NO_LEAVES" => Ok(Criterion::MotionBlockingNoLeaves),
            "WORLD_SURFACE" => Ok(Criterion::WorldSurface),
            "OCEAN_FLOOR" => Ok(Criterion::OceanFloor),
            "MOTION_BLOCKING_NO_TREES" => Ok(Criterion::MotionBlockingNoTrees),
            other => Err(PlanError::InvalidCriterion(other.to_string())),
        }
    }
}

/// Matches `air`, `cave_air` and `void_air` but not `oak_stairs`.
pub fn is_air(block: &str) -> bool {
    block.ends_with("air")
}

pub fn is_liquid(block: &str) -> bool {
    block.contains("water") || block.contains("lava")
}

/// Blocks an entity can move through.
pub fn is_passable(block: &str) -> bool {
    const PASSABLE: [&str; 5] = ["flower", "tall_grass", "fern", "torch", "vine"];
    is_air(block) || PASSABLE.iter().any(|p| block.contains(p))
}

/// Column heights over a ground rectangle. A height is the y of the first block above the
/// top, so the top block itself sits at `height - 1`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HeightGrid {
    origin: Coordinates,
    size: Size,
    heights: Vec<i32>,
}

impl HeightGrid {
    pub fn filled(origin: Coordinates, size: Size, height: i32) -> Self {
        HeightGrid {
            origin: origin.ground(),
            size,
            heights: vec![height; (size.x.max(0) * size.z.max(0)) as usize],
        }
    }

    pub fn origin(&self) -> Coordinates {
        self.origin
    }

    pub fn size(&self) -> Size {
        self.size
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        let (dx, dz) = (x - self.origin.x, z - self.origin.z);
        if dx < 0 || dz < 0 || dx >= self.size.x || dz >= self.size.z {
            return None;
        }

        Some((dx * self.size.z + dz) as usize)
    }

    /// Height at world column `(x, z)`.
    pub fn get(&self, x: i32, z: i32) -> Option<i32> {
        self.index(x, z).map(|i| self.heights[i])
    }

    pub fn set(&mut self, x: i32, z: i32, height: i32) {
        if let Some(i) = self.index(x, z) {
            self.heights[i] = height;
        }
    }

    /// The sub-grid covering `[origin, origin + size)`, or `None` if it isn't fully covered.
    pub fn clip(&self, origin: Coordinates, size: Size) -> Option<HeightGrid> {
        let far = origin.shift(size.x - 1, 0, size.z - 1);
        if self.index(origin.x, origin.z).is_none() || self.index(far.x, far.z).is_none() {
            return None;
        }

        let mut clipped = HeightGrid::filled(origin, size, 0);
        for c in size.cells(origin) {
            clipped.set(c.x, c.z, self.get(c.x, c.z)?);
        }

        Some(clipped)
    }

    /// `(column, height)` pairs in x-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coordinates, i32)> + '_ {
        self.size
            .cells(self.origin)
            .zip(self.heights.iter().copied())
    }
}

/// Read access to a snapshot of the world. Implementations are never mutated by the planner.
pub trait WorldSnapshot {
    /// Block name at `position`. Unloaded or out-of-range positions read as air.
    fn block_at(&self, position: &Coordinates) -> &str;

    /// The grid for a base criterion, or `None` if the snapshot cannot supply it.
    fn heightmap(&self, criterion: Criterion) -> Option<HeightGrid>;

    /// The lowest layer a downward scan may visit.
    fn min_y(&self) -> i32 {
        0
    }

    /// Changes whenever the snapshot's blocks change. Snapshots that never change can keep
    /// the default.
    fn revision(&self) -> u64 {
        0
    }
}

/// A column-addressed voxel world held in memory.
#[derive(Clone, Debug)]
pub struct MemoryWorld {
    origin: Coordinates,
    size: Size,
    min_y: i32,
    /// Blocks of each column from `min_y` upward, in x-major column order.
    columns: Vec<Vec<String>>,
    revision: u64,
}

impl MemoryWorld {
    pub fn new(origin: Coordinates, size: Size, min_y: i32) -> Self {
        MemoryWorld {
            origin: origin.ground(),
            size,
            min_y,
            columns: vec![Vec::new(); (size.x.max(0) * size.z.max(0)) as usize],
            revision: 0,
        }
    }

    /// Every column is `ground` up to (excluding) `height`.
    pub fn flat(origin: Coordinates, size: Size, height: i32, ground: &str) -> Self {
        let mut world = MemoryWorld::new(origin, size, 0);
        for c in size.cells(origin) {
            world.fill_column(c.x, c.z, height, ground);
        }

        world
    }

    pub fn origin(&self) -> Coordinates {
        self.origin
    }

    pub fn size(&self) -> Size {
        self.size
    }

    fn column_index(&self, x: i32, z: i32) -> Option<usize> {
        let column = Coordinates::new(x, 0, z);
        if column.within(&self.origin, &self.size) {
            Some(((x - self.origin.x) * self.size.z + (z - self.origin.z)) as usize)
        } else {
            None
        }
    }

    /// Replaces a column with `ground` from `min_y` up to (excluding) `height`.
    pub fn fill_column(&mut self, x: i32, z: i32, height: i32, ground: &str) {
        if let Some(i) = self.column_index(x, z) {
            let layers = (height - self.min_y).max(0) as usize;
            self.columns[i] = vec![ground.to_string(); layers];
            self.revision += 1;
        }
    }

    /// Replaces a column with the given layers, bottom first, starting at `min_y`.
    pub fn set_column(&mut self, x: i32, z: i32, layers: &[&str]) {
        if let Some(i) = self.column_index(x, z) {
            self.columns[i] = layers.iter().map(|s| s.to_string()).collect();
            self.revision += 1;
        }
    }

    pub fn set_block(&mut self, position: &Coordinates, block: &str) {
        let min_y = self.min_y;
        if position.y < min_y {
            return;
        }
        if let Some(i) = self.column_index(position.x, position.z) {
            let column = &mut self.columns[i];
            let layer = (position.y - min_y) as usize;
            if column.len() <= layer {
                column.resize(layer + 1, AIR.to_string());
            }
            column[layer] = block.to_string();
            self.revision += 1;
        }
    }

    fn column_height(&self, column: &[String], criterion: Criterion) -> i32 {
        column
            .iter()
            .rposition(|b| criterion.counts_as_top(b))
            .map_or(self.min_y, |i| self.min_y + i as i32 + 1)
    }
}

impl WorldSnapshot for MemoryWorld {
    fn block_at(&self, position: &Coordinates) -> &str {
        if position.y < self.min_y {
            return AIR;
        }
        self.column_index(position.x, position.z)
            .and_then(|i| self.columns[i].get((position.y - self.min_y) as usize))
            .map_or(AIR, |s| s.as_str())
    }

    fn heightmap(&self, criterion: Criterion) -> Option<HeightGrid> {
        if criterion.is_derived() {
            return None;
        }

        let mut grid = HeightGrid::filled(self.origin, self.size, self.min_y);
        for c in self.size.cells(self.origin) {
            if let Some(i) = self.column_index(c.x, c.z) {
                grid.set(c.x, c.z, self.column_height(&self.columns[i], criterion));
            }
        }

        Some(grid)
    }

    fn min_y(&self) -> i32 {
        self.min_y
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
