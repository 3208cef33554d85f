//! Plans building sites and connecting roads on a region of a voxel world, working only from
//! per-column surface heights.

pub mod block;
pub mod collection;
pub mod config;
pub mod coords;
pub mod error;
pub mod placement;
pub mod plot;
pub mod roads;
pub mod roughness;
pub mod sampling;
pub mod sink;
pub mod surface;
pub mod world;

pub use block::SurfaceSample;
pub use collection::BlockCollection;
pub use config::{PlannerConfig, RoadPalette};
pub use coords::{Coordinates, Rotation, Size};
pub use error::{PlanError, Result};
pub use placement::{BuildingKind, Subplot, SubplotRequest};
pub use plot::Plot;
pub use roads::{RoadBand, RoadBlock, RoadPath};
pub use sink::{BatchedSink, BlockSink, BlockWriter, PlacedBlock};
pub use world::{Criterion, HeightGrid, MemoryWorld, WorldSnapshot};
