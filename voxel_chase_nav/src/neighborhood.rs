// Local step classification over the 3×3×3 block around an agent.
//
// A crawling agent may step along a face direction when the destination
// cell can be occupied and the agent would still be touching something
// after the step. "Touching" is checked on two rings of four cells, both
// lying in the plane perpendicular to the step axis:
//
//   - the middle ring: the four in-plane face neighbors of the current
//     cell (what the agent is holding on to now), and
//   - the destination ring: the four in-plane face neighbors of the
//     destination cell (what it will be holding on to).
//
// One support cell on either ring is enough. Corner cells of the block are
// never read, so `sample` performs 18 lookups (6 faces + 12 edges).
//
// Out-of-bounds and ungenerated cells (`VoxelGrid::cell` returning `None`)
// classify as `Empty` without reaching the filter.
//
// See also: `filter.rs` for how raw cells become `CellClass`es, `chase.rs`
// for the selector that picks among the legal directions.
//
// **Critical constraint: determinism.** `legal_directions` reports in
// `Direction::CANDIDATE_ORDER` and `first_support_direction` scans in
// `Direction::ALL`; both orders feed tie-breaking downstream.

use crate::filter::CellFilter;
use crate::grid::VoxelGrid;
use crate::types::{CellClass, CellCoord, Direction};
use smallvec::SmallVec;

/// Legal step directions at one cell. Never more than six.
pub type DirectionSet = SmallVec<[Direction; 6]>;

/// Classify one cell through `filter`. `None` cells are `Empty`.
pub fn classify_cell<G, F>(grid: &G, coord: CellCoord, filter: &F) -> CellClass
where
    G: VoxelGrid + ?Sized,
    F: CellFilter + ?Sized,
{
    grid.cell(coord)
        .map_or(CellClass::Empty, |state| filter.classify(state))
}

/// Classified snapshot of the block around `center`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighborhood {
    center: CellCoord,
    /// Indexed `[dx + 1][dy + 1][dz + 1]`. Corners stay `Empty`.
    cells: [[[CellClass; 3]; 3]; 3],
}

impl Neighborhood {
    /// Read the face and edge cells around `center`.
    pub fn sample<G, F>(grid: &G, center: CellCoord, filter: &F) -> Self
    where
        G: VoxelGrid + ?Sized,
        F: CellFilter + ?Sized,
    {
        let mut cells = [[[CellClass::Empty; 3]; 3]; 3];
        for dx in -1..=1i32 {
            for dy in -1..=1i32 {
                for dz in -1..=1i32 {
                    let nonzero = (dx != 0) as u8 + (dy != 0) as u8 + (dz != 0) as u8;
                    if nonzero == 0 || nonzero == 3 {
                        continue;
                    }
                    cells[(dx + 1) as usize][(dy + 1) as usize][(dz + 1) as usize] =
                        classify_cell(grid, center.shifted(dx, dy, dz), filter);
                }
            }
        }
        Self { center, cells }
    }

    pub fn center(&self) -> CellCoord {
        self.center
    }

    /// Class of the cell at offset `(dx, dy, dz)` from the center. Offsets
    /// outside `-1..=1` read as `Empty`.
    pub fn class_at(&self, dx: i32, dy: i32, dz: i32) -> CellClass {
        let index = |d: i32| usize::try_from(d + 1).ok().filter(|&i| i < 3);
        match (index(dx), index(dy), index(dz)) {
            (Some(x), Some(y), Some(z)) => self.cells[x][y][z],
            _ => CellClass::Empty,
        }
    }

    fn class_at_offset(&self, (dx, dy, dz): (i32, i32, i32)) -> CellClass {
        self.class_at(dx, dy, dz)
    }

    /// Whether a step along `dir` is allowed.
    pub fn is_legal(&self, dir: Direction) -> bool {
        let dest = dir.offset();
        if !self.class_at_offset(dest).is_traversable() {
            return false;
        }
        let (u, v) = dir.axis().others();
        let mut ring = [u.step(1), u.step(-1), v.step(1), v.step(-1)].into_iter();
        ring.any(|(rx, ry, rz)| {
            self.class_at(rx, ry, rz).is_support()
                || self
                    .class_at(dest.0 + rx, dest.1 + ry, dest.2 + rz)
                    .is_support()
        })
    }

    /// Every legal direction, in `Direction::CANDIDATE_ORDER`. Empty means
    /// the agent is at a dead end.
    pub fn legal_directions(&self) -> DirectionSet {
        Direction::CANDIDATE_ORDER
            .into_iter()
            .filter(|&dir| self.is_legal(dir))
            .collect()
    }

    /// The first face neighbor (in `Direction::ALL` order) that supports
    /// the agent.
    pub fn first_support_direction(&self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&dir| self.class_at_offset(dir.offset()).is_support())
    }
}
