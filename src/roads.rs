use crate::{
    collection::BlockCollection,
    config::{PlannerConfig, RoadPalette},
    Coordinates,
};

use fnv::{FnvHashMap, FnvHashSet};
use petgraph::{
    algo::astar,
    graph::{EdgeIndex, NodeIndex},
    stable_graph::StableGraph,
    visit::EdgeRef,
    Undirected,
};
use serde::{Deserialize, Serialize};

/// Concentric strips of a road, strongest first.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum RoadBand {
    /// The path itself.
    Inner,
    /// The four orthogonal neighbours of the path.
    Middle,
    /// Diagonal neighbours and the cells two steps out along each axis.
    Outer,
}

impl RoadBand {
    pub const ALL: [RoadBand; 3] = [RoadBand::Inner, RoadBand::Middle, RoadBand::Outer];

    fn index(self) -> usize {
        self as usize
    }
}

/// A laid road: the columns of its center line (at surface height) and its total cost.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadPath {
    pub cells: Vec<Coordinates>,
    pub cost: u64,
}

/// One rendered road column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoadBlock {
    pub coordinates: Coordinates,
    pub band: RoadBand,
    /// The smoothed height sits more than half a block above `coordinates`.
    pub half_step: bool,
}

/// A weighted grid graph over the surface plus the road bands laid on it so far.
///
/// Every column is in at most one band. Re-adding a column to a weaker band than the one it
/// is in is a no-op; adding it to a stronger band moves it.
#[derive(Clone, Debug, Default)]
pub struct RoadNetwork {
    graph: StableGraph<Coordinates, u64, Undirected>,
    nodes: FnvHashMap<Coordinates, NodeIndex>,
    built: bool,
    bands: [FnvHashMap<Coordinates, u32>; 3],
    /// Surface height of every band column, refreshed whenever the graph is rebuilt.
    heights: FnvHashMap<Coordinates, i32>,
    /// Column pairs whose edge was reinforced, so a rebuilt graph can restore them.
    reinforced: FnvHashSet<(Coordinates, Coordinates)>,
}

fn ordered_pair(a: Coordinates, b: Coordinates) -> (Coordinates, Coordinates) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

impl RoadNetwork {
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Forgets the terrain graph. Bands, their heights and reinforcements are kept; the next
    /// `build` re-applies them.
    pub fn invalidate_graph(&mut self) {
        self.graph.clear();
        self.nodes.clear();
        self.built = false;
    }

    /// One node per surface column, joined to its orthogonal neighbours with a cost that grows
    /// with the height step. Occupied columns that aren't road get `blocked_weight` edges.
    pub fn build(
        &mut self,
        surface: &BlockCollection,
        occupied: &FnvHashSet<Coordinates>,
        config: &PlannerConfig,
    ) {
        self.invalidate_graph();

        let mut order = Vec::new();
        for position in surface.positions() {
            let key = position.ground();
            if self.nodes.contains_key(&key) {
                continue;
            }
            // Only the latest sample of a column is authoritative.
            let top = surface.find(&key).map_or(position, |s| s.coordinates);
            let n = self.graph.add_node(top);
            self.nodes.insert(key, n);
            order.push(key);
        }

        for key in order.iter() {
            let n = self.nodes[key];
            for step in [Coordinates::new(1, 0, 0), Coordinates::new(0, 0, 1)].iter() {
                if let Some(&m) = self.nodes.get(&(*key + *step)) {
                    let dy = (self.graph[n].y - self.graph[m].y).unsigned_abs();
                    let weight =
                        config.road_base_weight + config.road_slope_weight * u64::from(dy);
                    self.graph.add_edge(n, m, weight);
                }
            }
        }

        for (column, height) in self.heights.iter_mut() {
            if let Some(&n) = self.nodes.get(column) {
                *height = self.graph[n].y;
            }
        }

        let reinforced: Vec<_> = self.reinforced.iter().copied().collect();
        for (a, b) in reinforced {
            self.set_edge_weight(&a, &b, config.road_reinforced_weight);
        }
        for c in occupied.iter() {
            self.block_column(c, config.blocked_weight);
        }

        self.built = true;
        log::debug!(
            "Road graph built with {} nodes and {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn edge_between(&self, a: &Coordinates, b: &Coordinates) -> Option<EdgeIndex> {
        let n = self.nodes.get(&a.ground())?;
        let m = self.nodes.get(&b.ground())?;

        self.graph.find_edge(*n, *m)
    }

    pub fn edge_weight(&self, a: &Coordinates, b: &Coordinates) -> Option<u64> {
        self.edge_between(a, b).map(|e| self.graph[e])
    }

    fn set_edge_weight(&mut self, a: &Coordinates, b: &Coordinates, weight: u64) {
        if let Some(e) = self.edge_between(a, b) {
            self.graph[e] = weight;
        }
    }

    /// Makes every edge touching `column` nearly impassable, unless the column is road.
    pub fn block_column(&mut self, column: &Coordinates, weight: u64) {
        let column = column.ground();
        if self.band_of(&column).is_some() {
            return;
        }
        if let Some(&n) = self.nodes.get(&column) {
            let edges: Vec<_> = self.graph.edges(n).map(|e| e.id()).collect();
            for e in edges {
                self.graph[e] = weight;
            }
        }
    }

    /// Cheapest path between two columns, or `None` if either is off the graph or they are
    /// disconnected.
    pub fn shortest_path(&self, from: &Coordinates, to: &Coordinates) -> Option<RoadPath> {
        let start = *self.nodes.get(&from.ground())?;
        let goal = *self.nodes.get(&to.ground())?;

        let (cost, nodes) = astar(
            &self.graph,
            start,
            |n| n == goal,
            |e| *e.weight(),
            |_| 0,
        )?;

        Some(RoadPath {
            cells: nodes.into_iter().map(|n| self.graph[n]).collect(),
            cost,
        })
    }

    pub fn band_of(&self, column: &Coordinates) -> Option<RoadBand> {
        let column = column.ground();
        RoadBand::ALL
            .iter()
            .copied()
            .find(|b| self.bands[b.index()].contains_key(&column))
    }

    /// How many times `column` was claimed for its current band.
    pub fn usage(&self, column: &Coordinates) -> u32 {
        self.band_of(column)
            .and_then(|b| self.bands[b.index()].get(&column.ground()).copied())
            .unwrap_or(0)
    }

    /// Columns of `band` in sorted order.
    pub fn cells(&self, band: RoadBand) -> impl Iterator<Item = Coordinates> {
        let mut cells: Vec<_> = self.bands[band.index()].keys().copied().collect();
        cells.sort();

        cells.into_iter()
    }

    fn add_road_block(&mut self, column: Coordinates, band: RoadBand, height: i32) {
        self.heights.entry(column).or_insert(height);
        if let Some(current) = self.band_of(&column) {
            if current < band {
                return;
            }
            if current != band {
                self.bands[current.index()].remove(&column);
            }
        }
        *self.bands[band.index()].entry(column).or_insert(0) += 1;
    }

    /// Finds a path, claims its bands and cheapens its edges for later roads. Leaves the
    /// network untouched when there is no path.
    pub fn lay_road(
        &mut self,
        from: &Coordinates,
        to: &Coordinates,
        occupied: &FnvHashSet<Coordinates>,
        config: &PlannerConfig,
    ) -> Option<RoadPath> {
        let path = self.shortest_path(from, to)?;

        for cell in path.cells.iter() {
            self.add_road_block(cell.ground(), RoadBand::Inner, cell.y);
        }
        for cell in path.cells.iter() {
            let center = cell.ground();
            let middle = center.cardinals().map(|c| (c, RoadBand::Middle));
            let outer = center
                .diagonals()
                .chain(center.axial_two())
                .map(|c| (c, RoadBand::Outer));
            for (c, band) in middle.chain(outer) {
                if occupied.contains(&c) {
                    continue;
                }
                if let Some(&n) = self.nodes.get(&c) {
                    let height = self.graph[n].y;
                    self.add_road_block(c, band, height);
                }
            }
        }

        for pair in path.cells.windows(2) {
            self.set_edge_weight(&pair[0], &pair[1], config.road_reinforced_weight);
            self.reinforced
                .insert(ordered_pair(pair[0].ground(), pair[1].ground()));
        }

        Some(path)
    }

    /// Each road column at the mean surface height of its same-band neighbours within
    /// `radius`.
    pub fn road_blocks(&self, radius: i32) -> Vec<RoadBlock> {
        let mut blocks = Vec::new();
        for band in RoadBand::ALL.iter().copied() {
            let members = &self.bands[band.index()];
            for column in self.cells(band) {
                let mut heights = Vec::new();
                for dx in -radius..=radius {
                    for dz in -radius..=radius {
                        let n = column.shift(dx, 0, dz);
                        if members.contains_key(&n) {
                            if let Some(&h) = self.heights.get(&n) {
                                heights.push(h);
                            }
                        }
                    }
                }
                if heights.is_empty() {
                    continue;
                }

                let mean = stats::mean(heights.into_iter());
                let floor = mean.floor();
                blocks.push(RoadBlock {
                    coordinates: column.with_y(floor as i32),
                    band,
                    half_step: mean - floor > 0.5,
                });
            }
        }

        blocks
    }

    /// Block placements for every road column: a full block at the smoothed height, plus a
    /// slab one layer up where the height is closer to the next layer. A half step adds the
    /// slab on top of the full block rather than replacing it.
    pub fn render(&self, radius: i32, palette: &RoadPalette) -> Vec<(Coordinates, String)> {
        let mut placements = Vec::new();
        for block in self.road_blocks(radius) {
            let (full, slab) = match block.band {
                RoadBand::Inner => (&palette.inner, &palette.inner_slab),
                RoadBand::Middle => (&palette.middle, &palette.middle_slab),
                RoadBand::Outer => (&palette.outer, &palette.outer_slab),
            };
            placements.push((block.coordinates, full.clone()));
            if block.half_step {
                placements.push((block.coordinates.shift(0, 1, 0), slab.clone()));
            }
        }

        placements
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
