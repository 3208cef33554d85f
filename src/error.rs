use thiserror::Error;

/// Fatal misconfiguration. Expected absences (no site, no path) are `Option`s instead.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("unknown or unavailable heightmap criterion {0:?}")]
    InvalidCriterion(String),
    #[error("malformed size {x}x{z}, both dimensions must be positive")]
    MalformedSize { x: i32, z: i32 },
    #[error("plot region {0:?} is not covered by the world snapshot")]
    OutsideSnapshot(crate::Coordinates),
    #[error("plot has no surface cells to search")]
    EmptyCandidatePool,
    #[error("invalid planner configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;
