// Storage-side interfaces the navigator reads through.
//
// The voxel store of a host game is not part of this crate: agents only
// see it through the `VoxelGrid` trait (cell lookup, box lookup, box
// adjacency, lattice-to-world transform). Hosts that react to `Moved`
// events edit cells through `VoxelGridMut`. `GridSet` is the registry of
// grids an agent can be attached to; an agent holds a `GridId` and
// resolves it every tick, so a grid being removed or deactivated shows up
// as a failed lookup rather than a dangling reference.
//
// Two implementations ship with the crate: `VoxelWorld` (in `world.rs`, a
// dense bounded grid with merged boxes) and `ProceduralGrid` below, an
// unbounded grid whose cells are computed by a closure. The latter has no
// boxes, so agents on it only ever use local steering.
//
// See also: `neighborhood.rs` and `planner.rs`, the two readers.
//
// **Critical constraint: determinism.** `GridSet::live()` iterates in slot
// order; grid re-acquisition breaks distance ties by that order.

use crate::boxes::VoxelBox;
use crate::error::{NavError, Result};
use crate::types::{BoxId, CellCoord, CellState, Direction, GridId, Vec3};
use serde::{Deserialize, Serialize};

/// Read access to one voxel grid.
pub trait VoxelGrid {
    /// The stored state at `coord`, or `None` when the cell is outside the
    /// grid or has not been generated. Callers treat `None` as empty space.
    fn cell(&self, coord: CellCoord) -> Option<CellState>;

    /// The merged box containing `coord`, if the cell belongs to one.
    fn box_at(&self, coord: CellCoord) -> Option<BoxId>;

    /// Resolve a box id. `None` once the box has been merged away or split.
    fn box_info(&self, id: BoxId) -> Option<&VoxelBox>;

    /// Live adjacency list of a box. May contain `None` holes and ids that
    /// no longer resolve; empty for stale ids.
    fn adjacent(&self, id: BoxId) -> &[Option<BoxId>];

    /// Grid-local point to world space.
    fn absolute_point(&self, local: Vec3) -> Vec3;

    /// World-space point to the cell containing it.
    fn coordinate_of(&self, world: Vec3) -> CellCoord;

    /// World-space center of a cell.
    fn absolute_position(&self, coord: CellCoord) -> Vec3 {
        self.absolute_point(coord.center())
    }

    /// World-space displacement of one step along `dir`.
    fn absolute_vector(&self, dir: Direction) -> Vec3 {
        self.absolute_point(dir.vector()) - self.absolute_point(Vec3::ZERO)
    }

    /// Nearest non-empty cell to `coord`. Checks `coord` itself, then cube
    /// shells of increasing radius below `max_distance`, returning the
    /// closest hit (by center distance) from the first shell that has one.
    fn find_closest_filled_cell(&self, coord: CellCoord, max_distance: u32) -> Option<CellCoord> {
        let filled = |c: CellCoord| self.cell(c).is_some_and(|s| !s.is_empty());
        if filled(coord) {
            return Some(coord);
        }
        let origin = coord.center();
        let max_radius = i32::try_from(max_distance).unwrap_or(i32::MAX);
        for r in 1..max_radius {
            let mut best: Option<(f32, CellCoord)> = None;
            for dy in -r..=r {
                for dz in -r..=r {
                    for dx in -r..=r {
                        if dx.abs().max(dy.abs()).max(dz.abs()) != r {
                            continue;
                        }
                        let c = coord.shifted(dx, dy, dz);
                        if !filled(c) {
                            continue;
                        }
                        let d = (c.center() - origin).length_squared();
                        if best.is_none_or(|(best_d, _)| d < best_d) {
                            best = Some((d, c));
                        }
                    }
                }
            }
            if let Some((_, c)) = best {
                return Some(c);
            }
        }
        None
    }
}

/// Cell edits, used by hosts in response to navigation events.
pub trait VoxelGridMut: VoxelGrid {
    /// Set a cell to `state`. Returns whether anything changed.
    fn fill(&mut self, coord: CellCoord, state: CellState) -> Result<bool>;

    /// Clear a cell. Returns whether anything changed.
    fn empty(&mut self, coord: CellCoord) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Lattice transform
// ---------------------------------------------------------------------------

/// Translation + uniform scale from grid-local space to world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridTransform {
    pub origin: Vec3,
    pub cell_size: f32,
}

impl Default for GridTransform {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            cell_size: 1.0,
        }
    }
}

impl GridTransform {
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.origin + local * self.cell_size
    }

    pub fn to_cell(&self, world: Vec3) -> CellCoord {
        let local = (world - self.origin) * (1.0 / self.cell_size);
        CellCoord::new(
            local.x.floor() as i32,
            local.y.floor() as i32,
            local.z.floor() as i32,
        )
    }
}

// ---------------------------------------------------------------------------
// Grid registry
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct GridSlot<G> {
    generation: u32,
    active: bool,
    grid: Option<G>,
}

/// Every grid agents may walk on, addressed by weak `GridId`s.
#[derive(Clone, Debug)]
pub struct GridSet<G> {
    slots: Vec<GridSlot<G>>,
}

impl<G> Default for GridSet<G> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<G: VoxelGrid> GridSet<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active grid.
    pub fn insert(&mut self, grid: G) -> GridId {
        if let Some(index) = self.slots.iter().position(|s| s.grid.is_none()) {
            let slot = &mut self.slots[index];
            slot.grid = Some(grid);
            slot.active = true;
            GridId::new(index as u32, slot.generation)
        } else {
            self.slots.push(GridSlot {
                generation: 0,
                active: true,
                grid: Some(grid),
            });
            GridId::new(self.slots.len() as u32 - 1, 0)
        }
    }

    /// Resolve a handle to an active grid.
    pub fn get(&self, id: GridId) -> Option<&G> {
        self.slot(id)
            .filter(|s| s.active)
            .and_then(|s| s.grid.as_ref())
    }

    pub fn get_mut(&mut self, id: GridId) -> Option<&mut G> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation && s.active)
            .and_then(|s| s.grid.as_mut())
    }

    /// Switch a grid on or off. Agents attached to an inactive grid
    /// re-acquire on their next tick.
    pub fn set_active(&mut self, id: GridId, active: bool) -> Result<()> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation && s.grid.is_some())
            .ok_or(NavError::UnknownGrid(id))?;
        slot.active = active;
        Ok(())
    }

    /// Unregister a grid. Its id never resolves again.
    pub fn remove(&mut self, id: GridId) -> Option<G> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)?;
        let grid = slot.grid.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.active = false;
        Some(grid)
    }

    /// Active grids in slot order.
    pub fn live(&self) -> impl Iterator<Item = (GridId, &G)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            match (&slot.grid, slot.active) {
                (Some(grid), true) => Some((GridId::new(index as u32, slot.generation), grid)),
                _ => None,
            }
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.grid.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: GridId) -> Option<&GridSlot<G>> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
    }
}

// ---------------------------------------------------------------------------
// Procedural grid
// ---------------------------------------------------------------------------

/// Unbounded grid whose cells come from a closure over coordinates. Has no
/// merged boxes.
#[derive(Clone)]
pub struct ProceduralGrid<F> {
    generator: F,
    pub transform: GridTransform,
}

impl<F: Fn(CellCoord) -> CellState> ProceduralGrid<F> {
    pub fn new(generator: F) -> Self {
        Self {
            generator,
            transform: GridTransform::default(),
        }
    }

    pub fn with_transform(generator: F, transform: GridTransform) -> Self {
        Self {
            generator,
            transform,
        }
    }
}

impl<F: Fn(CellCoord) -> CellState> VoxelGrid for ProceduralGrid<F> {
    fn cell(&self, coord: CellCoord) -> Option<CellState> {
        Some((self.generator)(coord))
    }

    fn box_at(&self, _coord: CellCoord) -> Option<BoxId> {
        None
    }

    fn box_info(&self, _id: BoxId) -> Option<&VoxelBox> {
        None
    }

    fn adjacent(&self, _id: BoxId) -> &[Option<BoxId>] {
        &[]
    }

    fn absolute_point(&self, local: Vec3) -> Vec3 {
        self.transform.to_world(local)
    }

    fn coordinate_of(&self, world: Vec3) -> CellCoord {
        self.transform.to_cell(world)
    }
}
