// Error type for fallible setup and storage operations.
//
// Per-tick navigation never fails with an error: dead ends and lost grids
// are reported as `NavEvent::Deleted`, stale boxes are skipped silently.
// `NavError` covers the operations a host calls outside the tick loop:
// loading config, mutating the reference voxel storage, and addressing
// grids by handle.
//
// See also: `config.rs` (`ChaseConfig::from_json`), `world.rs` (bounded
// mutations), `grid.rs` (`GridSet`).

use crate::types::{CellCoord, GridId};

pub type Result<T> = std::result::Result<T, NavError>;

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// Config JSON did not parse.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Config parsed but holds values the navigator cannot run with.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A mutation addressed a cell outside the grid's storage.
    #[error("cell {0} is outside the grid")]
    OutOfBounds(CellCoord),

    /// The grid handle no longer resolves.
    #[error("grid {0} is not live")]
    UnknownGrid(GridId),
}
