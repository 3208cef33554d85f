use crate::{
    collection::BlockCollection,
    config::PlannerConfig,
    error::{PlanError, Result},
    plot::{Plot, GROUND},
    sampling::fraction_of,
    world::{is_air, Criterion, WorldSnapshot},
    Coordinates, Size,
};

use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

/// Score of a site that cannot be used at all.
pub const REJECTED: f32 = std::f32::INFINITY;

/// Criterion whose top blocks count as nearby resources.
const RESOURCES: Criterion = Criterion::MotionBlocking;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum BuildingKind {
    Generic,
    Farm,
    Woodcutter,
    Forge,
}

impl Default for BuildingKind {
    fn default() -> Self {
        BuildingKind::Generic
    }
}

/// Resources that make a site more attractive for a kind of building.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affinity {
    pub resources: &'static [&'static str],
    pub radius: i32,
}

impl BuildingKind {
    pub fn affinity(&self) -> Option<Affinity> {
        match self {
            BuildingKind::Generic => None,
            BuildingKind::Farm => Some(Affinity {
                resources: &["water"],
                radius: 10,
            }),
            BuildingKind::Woodcutter => Some(Affinity {
                resources: &["log", "leaves"],
                radius: 8,
            }),
            BuildingKind::Forge => Some(Affinity {
                resources: &["stone"],
                radius: 5,
            }),
        }
    }
}

/// What to look for in a subplot search.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SubplotRequest {
    pub size: Size,
    /// Extra ring of columns reserved around the footprint.
    pub padding: i32,
    /// Only every `speed`-th candidate is scored.
    pub speed: usize,
    /// Sites scoring at or above this are not viable.
    pub max_score: f32,
    pub kind: BuildingKind,
}

impl SubplotRequest {
    pub fn new(size: Size) -> Self {
        SubplotRequest {
            size,
            padding: 2,
            speed: 1,
            max_score: 100_000.0,
            kind: BuildingKind::Generic,
        }
    }

    pub fn padding(mut self, padding: i32) -> Self {
        self.padding = padding;
        self
    }

    pub fn speed(mut self, speed: usize) -> Self {
        self.speed = speed;
        self
    }

    pub fn max_score(mut self, max_score: f32) -> Self {
        self.max_score = max_score;
        self
    }

    pub fn kind(mut self, kind: BuildingKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A reserved building site.
#[derive(Clone, Debug, PartialEq)]
pub struct Subplot {
    /// Minimum corner of the footprint, at the surface height of that column.
    pub origin: Coordinates,
    pub size: Size,
    pub padding: i32,
    pub score: f32,
    pub kind: BuildingKind,
}

impl Subplot {
    pub fn footprint(&self) -> impl Iterator<Item = Coordinates> {
        self.size.cells(self.origin)
    }

    /// Minimum corner and extent of the footprint grown by the padding.
    pub fn reserved_area(&self) -> (Coordinates, Size) {
        let p = self.padding;
        (
            self.origin.ground().shift(-p, 0, -p),
            Size::new(self.size.x + 2 * p, self.size.z + 2 * p),
        )
    }
}

pub(crate) struct SiteScorer<'a> {
    pub surface: &'a BlockCollection,
    pub resources: &'a BlockCollection,
    pub occupied: &'a FnvHashSet<Coordinates>,
    pub center: Coordinates,
    pub config: &'a PlannerConfig,
}

impl<'a> SiteScorer<'a> {
    /// Lower is better. Filling under the footprint is cheaper than digging into it.
    pub fn score(&self, origin: &Coordinates, request: &SubplotRequest) -> f32 {
        let config = self.config;
        let mut score =
            origin.ground().manhattan_distance(&self.center) as f32 * config.centering_weight;

        for cell in request.size.cells(*origin) {
            let sample = match self.surface.find(&cell) {
                Some(s) if !self.occupied.contains(&cell) => s,
                _ => return REJECTED,
            };

            let dy = sample.coordinates.y - origin.y;
            score += if dy < 0 {
                config.raise_weight * (-dy) as f32
            } else {
                config.lower_weight * dy as f32
            };
            if score >= request.max_score {
                return score;
            }
        }

        if let Some(affinity) = request.kind.affinity() {
            let nearby = self
                .resources
                .near(origin, affinity.radius)
                .filter(affinity.resources)
                .len();
            score -= config.affinity_weight * nearby as f32;
        }

        score
    }
}

impl Plot {
    /// Priority cells plus a random share of the free dry surface, at least one cell when any
    /// is left. Built once per terrain refresh. Fails only when the plot has no solid surface.
    fn prepare_candidates<W: WorldSnapshot + ?Sized>(&mut self, world: &W) -> Result<()> {
        if self.candidates.is_some() {
            return Ok(());
        }

        let priority = self.priority_cells(world)?.to_vec();
        let surface = self.surface.blocks(world, GROUND)?;
        if surface.iter().all(|s| is_air(&s.name)) {
            return Err(PlanError::EmptyCandidatePool);
        }
        let prioritized: BlockCollection = priority
            .iter()
            .filter_map(|c| surface.find(c).cloned())
            .collect();
        let dry = surface
            .without(&["water", "lava"])
            .not_inside(&self.occupied);
        let n = if dry.is_empty() {
            0
        } else {
            fraction_of(dry.len(), self.config.random_sample_fraction).max(1)
        };
        let sampled = dry.random_elements(n, &mut self.rng);
        log::debug!(
            "Candidate pool: {} priority, {} sampled",
            prioritized.len(),
            sampled.len()
        );

        self.candidates = Some(prioritized + sampled);

        Ok(())
    }

    /// Searches for the best site for `request` and reserves it. `Ok(None)` means no site
    /// scored below `max_score`; the plot is unchanged in that case.
    pub fn get_subplot<W: WorldSnapshot + ?Sized>(
        &mut self,
        world: &W,
        request: &SubplotRequest,
    ) -> Result<Option<Subplot>> {
        self.get_subplot_with_cancel(world, request, &|| false)
    }

    /// Like `get_subplot`, checking `cancelled` before each candidate. A cancelled search
    /// returns `Ok(None)` without reserving anything.
    pub fn get_subplot_with_cancel<W: WorldSnapshot + ?Sized>(
        &mut self,
        world: &W,
        request: &SubplotRequest,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<Option<Subplot>> {
        if !request.size.is_positive() || request.padding < 0 {
            return Err(PlanError::MalformedSize {
                x: request.size.x,
                z: request.size.z,
            });
        }

        self.prepare_candidates(world)?;
        self.surface.blocks(world, RESOURCES)?;

        let best = {
            let missing = |c: Criterion| PlanError::InvalidCriterion(c.name().to_string());
            let scorer = SiteScorer {
                surface: self
                    .surface
                    .cached_blocks(GROUND)
                    .ok_or_else(|| missing(GROUND))?,
                resources: self
                    .surface
                    .cached_blocks(RESOURCES)
                    .ok_or_else(|| missing(RESOURCES))?,
                occupied: &self.occupied,
                center: self.center(),
                config: &self.config,
            };
            let candidates = self
                .candidates
                .as_ref()
                .ok_or(PlanError::EmptyCandidatePool)?;

            let mut best: Option<(f32, Coordinates)> = None;
            for candidate in candidates.iter().step_by(request.speed.max(1)) {
                if cancelled() {
                    log::debug!("Subplot search cancelled");
                    return Ok(None);
                }

                let score = scorer.score(&candidate.coordinates, request);
                if best.map_or(true, |(b, _)| score < b) {
                    best = Some((score, candidate.coordinates));
                }
            }

            best
        };

        match best {
            Some((score, origin)) if score < request.max_score => {
                let subplot = Subplot {
                    origin,
                    size: request.size,
                    padding: request.padding,
                    score,
                    kind: request.kind,
                };
                let (min, area) = subplot.reserved_area();
                self.occupy(area.cells(min));
                log::debug!(
                    "Reserved {:?} {}x{} at {:?} (score {})",
                    subplot.kind,
                    subplot.size.x,
                    subplot.size.z,
                    origin,
                    score
                );

                Ok(Some(subplot))
            }
            _ => {
                log::debug!(
                    "No viable site for {}x{} below {}",
                    request.size.x,
                    request.size.z,
                    request.max_score
                );

                Ok(None)
            }
        }
    }

    /// A fresh plot covering a reserved footprint, for planning inside the building.
    pub fn subplot_plot(&self, subplot: &Subplot) -> Result<Plot> {
        Plot::new(subplot.origin, subplot.size, self.config.clone())
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
    use crate::{block::SurfaceSample, world::MemoryWorld};
    use std::cell::Cell;

    fn flat(w: i32, d: i32) -> (MemoryWorld, Plot) {
        let size = Size::new(w, d);
        let world = MemoryWorld::flat(Coordinates::default(), size, 64, "grass_block");
        let plot = Plot::new(Coordinates::default(), size, PlannerConfig::default()).unwrap();

        (world, plot)
    }

    fn flat_surface(w: i32, d: i32) -> BlockCollection {
        Size::new(w, d)
            .cells(Coordinates::default())
            .map(|c| SurfaceSample::new("grass_block", c.with_y(63)))
            .collect()
    }

    #[test]
    fn test_flat_ground_costs_only_centering() {
        let (world, mut plot) = flat(10, 10);
        let request = SubplotRequest::new(Size::new(3, 3)).padding(1);
        let subplot = plot.get_subplot(&world, &request).unwrap().unwrap();

        let distance = subplot.origin.ground().manhattan_distance(&plot.center());
        assert_eq!(subplot.score, distance as f32 * 0.1);
        assert!(subplot.footprint().all(|c| plot.contains(&c)));
    }

    #[test]
    fn test_occupied_cell_rejects_site() {
        let surface = flat_surface(10, 10);
        let config = PlannerConfig::default();
        let mut occupied = FnvHashSet::default();
        occupied.insert(Coordinates::new(5, 0, 5));
        let scorer = SiteScorer {
            surface: &surface,
            resources: &surface,
            occupied: &occupied,
            center: Coordinates::new(5, 0, 5),
            config: &config,
        };
        let request = SubplotRequest::new(Size::new(3, 3));

        assert_eq!(scorer.score(&Coordinates::new(4, 63, 4), &request), REJECTED);
        assert_eq!(scorer.score(&Coordinates::new(1, 63, 1), &request), 0.8);
        // Running off the surface is just as bad.
        assert_eq!(scorer.score(&Coordinates::new(8, 63, 8), &request), REJECTED);
    }

    #[test]
    fn test_occupied_center_never_wins() {
        let (world, mut plot) = flat(10, 10);
        let center = plot.center();
        plot.occupy(vec![center]);
        let request = SubplotRequest::new(Size::new(3, 3)).padding(0);
        let subplot = plot.get_subplot(&world, &request).unwrap().unwrap();

        assert!(subplot.footprint().all(|c| c != Coordinates::new(5, 0, 5)));
    }

    #[test]
    fn test_raising_is_cheaper_than_lowering() {
        let mut surface = flat_surface(4, 4);
        surface.push(SurfaceSample::new("grass_block", Coordinates::new(1, 61, 0)));
        let mut bump = flat_surface(4, 4);
        bump.push(SurfaceSample::new("grass_block", Coordinates::new(1, 65, 0)));
        let config = PlannerConfig::default();
        let occupied = FnvHashSet::default();
        let request = SubplotRequest::new(Size::new(2, 2));
        let score_on = |surface: &BlockCollection| {
            SiteScorer {
                surface,
                resources: surface,
                occupied: &occupied,
                center: Coordinates::default(),
                config: &config,
            }
            .score(&Coordinates::new(0, 63, 0), &request)
        };

        assert_eq!(score_on(&surface), 0.8 * 2.0);
        assert_eq!(score_on(&bump), 3.0 * 2.0);
    }

    #[test]
    fn test_cutoff_prunes_early() {
        let mut surface = flat_surface(4, 4);
        surface.push(SurfaceSample::new("stone", Coordinates::new(0, 80, 1)));
        let config = PlannerConfig::default();
        let occupied = FnvHashSet::default();
        let scorer = SiteScorer {
            surface: &surface,
            resources: &surface,
            occupied: &occupied,
            center: Coordinates::default(),
            config: &config,
        };
        let request = SubplotRequest::new(Size::new(3, 3)).max_score(10.0);

        assert_eq!(scorer.score(&Coordinates::new(0, 63, 0), &request), 51.0);
    }

    #[test]
    fn test_farm_prefers_water() {
        let surface = flat_surface(10, 10);
        let mut resources = flat_surface(10, 10);
        for x in 0..3 {
            resources.push(SurfaceSample::new("minecraft:water", Coordinates::new(x, 62, 9)));
        }
        let config = PlannerConfig::default();
        let occupied = FnvHashSet::default();
        let scorer = SiteScorer {
            surface: &surface,
            resources: &resources,
            occupied: &occupied,
            center: Coordinates::new(5, 0, 5),
            config: &config,
        };
        let site = Coordinates::new(0, 63, 5);
        let generic = scorer.score(&site, &SubplotRequest::new(Size::new(2, 2)));
        let farm = scorer.score(
            &site,
            &SubplotRequest::new(Size::new(2, 2)).kind(BuildingKind::Farm),
        );
        let forge = scorer.score(
            &site,
            &SubplotRequest::new(Size::new(2, 2)).kind(BuildingKind::Forge),
        );

        assert_eq!(generic - farm, 1.5);
        assert_eq!(forge, generic);
    }

    #[test]
    fn test_reservation_covers_padding() {
        let (world, mut plot) = flat(16, 16);
        let request = SubplotRequest::new(Size::new(3, 2)).padding(2);
        assert!(plot.occupied().is_empty());

        let subplot = plot.get_subplot(&world, &request).unwrap().unwrap();
        let (min, area) = subplot.reserved_area();
        assert_eq!(area, Size::new(7, 6));
        assert!(area.cells(min).all(|c| plot.is_occupied(&c)));
        assert_eq!(plot.occupied().len(), 42);
    }

    #[test]
    fn test_rejection_commits_nothing() {
        let (world, mut plot) = flat(10, 10);
        let request = SubplotRequest::new(Size::new(3, 3)).max_score(0.0);

        assert_eq!(plot.get_subplot(&world, &request), Ok(None));
        assert!(plot.occupied().is_empty());
    }

    #[test]
    fn test_repeated_placements_never_overlap() {
        let (world, mut plot) = flat(24, 24);
        let request = SubplotRequest::new(Size::new(3, 3)).padding(1);
        let mut reserved = FnvHashSet::default();
        for _ in 0..6 {
            if let Some(subplot) = plot.get_subplot(&world, &request).unwrap() {
                for c in subplot.footprint() {
                    assert!(!reserved.contains(&c), "{:?} reserved twice", c);
                    assert!(plot.contains(&c));
                }
                let (min, area) = subplot.reserved_area();
                reserved.extend(area.cells(min));
            }
        }
        assert!(!reserved.is_empty());
    }

    #[test]
    fn test_search_is_deterministic() {
        let (mut world, plot) = flat(20, 20);
        for x in 0..20 {
            world.fill_column(x, 3, 66, "stone");
            world.fill_column(x, 15, 61, "dirt");
        }
        let request = SubplotRequest::new(Size::new(4, 3));

        let mut a = plot.clone();
        let mut b = plot;
        assert_eq!(
            a.get_subplot(&world, &request).unwrap(),
            b.get_subplot(&world, &request).unwrap()
        );
        assert_eq!(
            a.get_subplot(&world, &request).unwrap(),
            b.get_subplot(&world, &request).unwrap()
        );
    }

    #[test]
    fn test_cancelled_search_reserves_nothing() {
        let (world, mut plot) = flat(10, 10);
        let checks = Cell::new(0);
        let cancel_after_two = || {
            checks.set(checks.get() + 1);
            checks.get() > 2
        };
        let request = SubplotRequest::new(Size::new(2, 2));

        assert_eq!(
            plot.get_subplot_with_cancel(&world, &request, &cancel_after_two),
            Ok(None)
        );
        assert_eq!(checks.get(), 3);
        assert!(plot.occupied().is_empty());
    }

    #[test]
    fn test_all_water_plot_has_no_site() {
        let size = Size::new(8, 8);
        let world = MemoryWorld::flat(Coordinates::default(), size, 62, "water");
        let mut plot = Plot::new(Coordinates::default(), size, PlannerConfig::default()).unwrap();

        assert_eq!(
            plot.get_subplot(&world, &SubplotRequest::new(Size::new(2, 2))),
            Ok(None)
        );
        assert!(plot.occupied().is_empty());
    }

    #[test]
    fn test_void_plot_has_no_candidates() {
        let size = Size::new(8, 8);
        let world = MemoryWorld::new(Coordinates::default(), size, 0);
        let mut plot = Plot::new(Coordinates::default(), size, PlannerConfig::default()).unwrap();

        assert_eq!(
            plot.get_subplot(&world, &SubplotRequest::new(Size::new(2, 2))),
            Err(PlanError::EmptyCandidatePool)
        );
    }

    #[test]
    fn test_tiny_dry_plot_still_gets_a_candidate() {
        let (world, mut plot) = flat(3, 3);
        let request = SubplotRequest::new(Size::new(1, 1)).padding(0);

        let subplot = plot.get_subplot(&world, &request).unwrap().unwrap();
        assert!(plot.contains(&subplot.origin));
        assert_eq!(plot.occupied().len(), 1);
    }

    #[test]
    fn test_malformed_request() {
        let (world, mut plot) = flat(10, 10);
        assert_eq!(
            plot.get_subplot(&world, &SubplotRequest::new(Size::new(3, -1))),
            Err(PlanError::MalformedSize { x: 3, z: -1 })
        );
    }

    #[test]
    fn test_roads_route_around_new_buildings() {
        let (world, mut plot) = flat(16, 16);
        let (a, b) = (Coordinates::new(0, 0, 8), Coordinates::new(15, 0, 8));
        // Builds the graph; the far entrance is off the plot so no road is laid.
        let off_plot = Coordinates::new(99, 0, 99);
        assert_eq!(plot.compute_roads(&world, &a, &off_plot), Ok(None));

        let subplot = plot
            .get_subplot(&world, &SubplotRequest::new(Size::new(4, 4)).padding(0))
            .unwrap()
            .unwrap();
        let inside = subplot.origin.ground().shift(1, 0, 1);
        assert_eq!(
            plot.roads()
                .edge_weight(&inside, &inside.shift(1, 0, 0)),
            Some(plot.config().blocked_weight)
        );

        let road = plot.compute_roads(&world, &a, &b).unwrap().unwrap();
        let footprint: FnvHashSet<_> = subplot.footprint().collect();
        let blocked_steps = road
            .cells
            .iter()
            .filter(|c| footprint.contains(&c.ground()))
            .count();
        assert_eq!(blocked_steps, 0);
    }

    #[test]
    fn test_subplot_becomes_plot() {
        let (world, mut plot) = flat(12, 12);
        let subplot = plot
            .get_subplot(&world, &SubplotRequest::new(Size::new(4, 5)))
            .unwrap()
            .unwrap();
        let mut inner = plot.subplot_plot(&subplot).unwrap();

        assert_eq!(inner.start(), subplot.origin.ground());
        assert_eq!(inner.size(), Size::new(4, 5));
        assert_eq!(
            inner.heightmap(&world, GROUND).unwrap().get(
                subplot.origin.x,
                subplot.origin.z
            ),
            Some(64)
        );
    }
}
