// Navigation events emitted to the host.
//
// The navigator never edits voxels or despawns entities itself. Each tick
// it appends `NavEvent`s to a caller-owned buffer and the host reacts:
// filling the vacated cell with a trail material on `Moved`, removing the
// agent's entity on `Deleted`, and so on.
//
// See also: `chase.rs` for where events are produced.
//
// **Critical constraint: determinism.** Events are appended in tick order,
// one agent's events never interleave within a tick, and their contents
// depend only on the seed, the config and the world.

use crate::types::{AgentId, CellCoord, GridId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One event from one agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEvent {
    pub agent: AgentId,
    pub kind: NavEventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavEventKind {
    /// The agent arrived at `coord` in `grid` and committed its next step.
    Moved { grid: GridId, coord: CellCoord },
    /// The agent gave up. It stops ticking and the host should remove it.
    Deleted { reason: DeleteReason },
}

/// Why an agent removed itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeleteReason {
    /// No legal direction at the arrival cell.
    DeadEnd,
    /// Its grid vanished and no other grid was within reach.
    NoGrid,
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReason::DeadEnd => f.write_str("dead end"),
            DeleteReason::NoGrid => f.write_str("no grid"),
        }
    }
}
