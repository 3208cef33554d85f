use crate::{
    collection::BlockCollection,
    config::PlannerConfig,
    error::{PlanError, Result},
    roads::{RoadBlock, RoadNetwork, RoadPath},
    roughness::RoughnessMap,
    sampling::small_rng,
    sink::BlockSink,
    world::{Criterion, HeightGrid, WorldSnapshot},
    Coordinates, Size,
};

use fnv::FnvHashSet;
use rand::rngs::SmallRng;

/// The criterion placement and roads plan against.
pub const GROUND: Criterion = Criterion::MotionBlockingNoTrees;

/// A rectangular build region and all planning state accumulated on it.
///
/// Terrain views are cached until `update` is called. Occupancy and road bands survive
/// `update`, since they describe decisions rather than terrain.
#[derive(Clone)]
pub struct Plot {
    start: Coordinates,
    size: Size,
    pub(crate) config: PlannerConfig,
    pub(crate) surface: crate::surface::SurfaceModel,
    pub(crate) occupied: FnvHashSet<Coordinates>,
    priority: Option<Vec<Coordinates>>,
    pub(crate) candidates: Option<BlockCollection>,
    pub(crate) roads: RoadNetwork,
    pub(crate) rng: SmallRng,
    /// Snapshot revision the terrain caches were filled from.
    revision: Option<u64>,
}

impl Plot {
    pub fn new(start: Coordinates, size: Size, config: PlannerConfig) -> Result<Self> {
        if !size.is_positive() {
            return Err(PlanError::MalformedSize {
                x: size.x,
                z: size.z,
            });
        }
        config.validate()?;

        let start = start.ground();
        Ok(Plot {
            start,
            size,
            rng: small_rng(config.seed),
            config,
            surface: crate::surface::SurfaceModel::new(start, size),
            occupied: FnvHashSet::default(),
            priority: None,
            candidates: None,
            roads: RoadNetwork::default(),
            revision: None,
        })
    }

    pub fn start(&self) -> Coordinates {
        self.start
    }

    /// The corner just past the plot, exclusive.
    pub fn end(&self) -> Coordinates {
        self.start.shift(self.size.x, 0, self.size.z)
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn center(&self) -> Coordinates {
        self.start.shift(self.size.x / 2, 0, self.size.z / 2)
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        coordinates.within(&self.start, &self.size)
    }

    /// Drops every cached terrain view so the next query reads the snapshot again.
    pub fn update(&mut self) {
        log::debug!("Invalidating terrain caches of plot at {:?}", self.start);
        self.surface.invalidate();
        self.priority = None;
        self.candidates = None;
        self.roads.invalidate_graph();
        self.revision = None;
    }

    /// Whether `world` changed since the terrain caches were filled.
    pub fn is_stale<W: WorldSnapshot + ?Sized>(&self, world: &W) -> bool {
        self.revision.map_or(false, |r| r != world.revision())
    }

    /// Calls `update` if `world` changed since the caches were filled. Returns whether it did.
    pub fn sync<W: WorldSnapshot + ?Sized>(&mut self, world: &W) -> bool {
        let stale = self.is_stale(world);
        if stale {
            self.update();
        }

        stale
    }

    fn observe<W: WorldSnapshot + ?Sized>(&mut self, world: &W) {
        if self.revision.is_none() {
            self.revision = Some(world.revision());
        }
    }

    pub fn heightmap<W: WorldSnapshot + ?Sized>(
        &mut self,
        world: &W,
        criterion: Criterion,
    ) -> Result<&HeightGrid> {
        self.observe(world);
        self.surface.heightmap(world, criterion)
    }

    pub fn blocks<W: WorldSnapshot + ?Sized>(
        &mut self,
        world: &W,
        criterion: Criterion,
    ) -> Result<&BlockCollection> {
        self.observe(world);
        self.surface.blocks(world, criterion)
    }

    pub fn occupied(&self) -> &FnvHashSet<Coordinates> {
        &self.occupied
    }

    pub fn is_occupied(&self, coordinates: &Coordinates) -> bool {
        self.occupied.contains(&coordinates.ground())
    }

    /// Claims columns without a placement search, e.g. for structures already standing.
    pub fn occupy(&mut self, columns: impl IntoIterator<Item = Coordinates>) {
        let blocked_weight = self.config.blocked_weight;
        for c in columns {
            let c = c.ground();
            self.occupied.insert(c);
            self.roads.block_column(&c, blocked_weight);
        }
    }

    /// The flattest free columns, computed once per terrain refresh.
    pub fn priority_cells<W: WorldSnapshot + ?Sized>(
        &mut self,
        world: &W,
    ) -> Result<&[Coordinates]> {
        self.observe(world);
        if self.priority.is_none() {
            let water: FnvHashSet<_> = self
                .surface
                .blocks(world, GROUND)?
                .filter(&["water"])
                .positions()
                .map(|c| c.ground())
                .collect();
            let grid = self.surface.heightmap(world, GROUND)?;
            let map = RoughnessMap::compute(grid, &water, self.config.roughness_span);
            let cells = map.priority_cells(self.config.priority_fraction, &self.occupied);
            log::debug!(
                "{} priority cells out of {} scored columns",
                cells.len(),
                map.len()
            );
            self.priority = Some(cells);
        }

        Ok(self.priority.as_deref().unwrap_or(&[]))
    }

    pub fn roads(&self) -> &RoadNetwork {
        &self.roads
    }

    fn ensure_road_graph<W: WorldSnapshot + ?Sized>(&mut self, world: &W) -> Result<()> {
        self.observe(world);
        if !self.roads.is_built() {
            let surface = self.surface.blocks(world, GROUND)?;
            self.roads.build(surface, &self.occupied, &self.config);
        }

        Ok(())
    }

    /// Lays a road between two entrances. `Ok(None)` means no path exists; nothing is changed
    /// in that case.
    pub fn compute_roads<W: WorldSnapshot + ?Sized>(
        &mut self,
        world: &W,
        from: &Coordinates,
        to: &Coordinates,
    ) -> Result<Option<RoadPath>> {
        self.ensure_road_graph(world)?;

        let path = self
            .roads
            .lay_road(from, to, &self.occupied, &self.config);
        match &path {
            Some(p) => log::debug!(
                "Road from {:?} to {:?}: {} cells, cost {}",
                from,
                to,
                p.cells.len(),
                p.cost
            ),
            None => log::warn!("No road possible from {:?} to {:?}", from, to),
        }

        Ok(path)
    }

    /// Every road column at its smoothed height, without placing anything.
    pub fn road_blocks(&self) -> Vec<RoadBlock> {
        self.roads.road_blocks(self.config.smoothing_radius)
    }

    /// Writes every road band to `sink` and flushes it. Returns the number of blocks placed.
    pub fn build_roads(&self, sink: &mut impl BlockSink) -> usize {
        let placements = self
            .roads
            .render(self.config.smoothing_radius, &self.config.palette);
        for (coordinates, block) in placements.iter() {
            sink.place(*coordinates, block);
        }
        sink.flush();

        placements.len()
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
