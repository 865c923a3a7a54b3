// Cell filters: how an agent type reads the world.
//
// Different agents treat the same material differently. A wall-crawler
// sees every non-empty cell as solid; a burrower passes through soft
// materials and clings to them, but treats the level's permanent geometry
// as solid and refuses to touch hazard materials at all. The navigator is
// written against `CellFilter` and never inspects materials itself.
//
// Any `Fn(CellState) -> CellClass` is a filter. `CrawlerFilter` is the
// data-driven one for agents configured from JSON.
//
// See also: `neighborhood.rs`, the only caller.

use crate::types::{CellClass, CellState, MaterialId};
use serde::{Deserialize, Serialize};

/// Maps raw cell state to a traversal class.
pub trait CellFilter {
    fn classify(&self, state: CellState) -> CellClass;
}

impl<F: Fn(CellState) -> CellClass> CellFilter for F {
    fn classify(&self, state: CellState) -> CellClass {
        self(state)
    }
}

/// Empty cells are open space, everything else is solid.
pub fn solid_filter(state: CellState) -> CellClass {
    if state.is_empty() {
        CellClass::Empty
    } else {
        CellClass::Filled
    }
}

/// Filter for agents that tunnel through soft material.
///
/// Precedence: empty or `passable` → `Empty`; `avoid` → `Avoid`;
/// permanent, hard, or `solid` → `Filled`; anything else → `Penetrable`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerFilter {
    /// Materials the agent treats as open space (its own trail, for
    /// instance).
    pub passable: Vec<MaterialId>,
    /// Materials that are solid to this agent even if soft.
    pub solid: Vec<MaterialId>,
    /// Materials the agent neither enters nor clings to.
    pub avoid: Vec<MaterialId>,
}

impl CellFilter for CrawlerFilter {
    fn classify(&self, state: CellState) -> CellClass {
        if state.is_empty() || self.passable.contains(&state.material) {
            CellClass::Empty
        } else if self.avoid.contains(&state.material) {
            CellClass::Avoid
        } else if state.permanent || state.hard || self.solid.contains(&state.material) {
            CellClass::Filled
        } else {
            CellClass::Penetrable
        }
    }
}
