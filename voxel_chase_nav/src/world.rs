// Dense bounded voxel grid with merged boxes.
//
// Reference storage for hosts without a voxel engine of their own, and the
// grid the integration tests and benchmark run on. Cells are a flat
// `Vec<CellState>` indexed by `x + z * size_x + y * size_x * size_z` with
// the lattice origin at (0, 0, 0). Out-of-bounds reads are `None`
// (`VoxelGrid::cell`) or `CellState::EMPTY` (`get`); out-of-bounds writes
// are `NavError::OutOfBounds`.
//
// Non-empty cells are grouped into boxes by `regenerate()`: a greedy merge
// that grows each box along x, then z, then y over unclaimed cells of the
// same state, followed by face-adjacency linking. Editing a cell removes
// the box that contained it, so until the next `regenerate()` the other
// cells of that box have no box and the neighbors' adjacency lists hold
// `None` holes. This is the same staleness a live engine exposes between a
// destruction and its rebuild, and the navigator is built to ride it out.
//
// See also: `boxes.rs` for the arena, `grid.rs` for the traits implemented
// here.
//
// **Critical constraint: determinism.** `regenerate()` visits cells in
// index order, so the same cells always produce the same boxes, ids and
// adjacency order.

use crate::boxes::{BoxArena, VoxelBox};
use crate::error::{NavError, Result};
use crate::grid::{GridTransform, VoxelGrid, VoxelGridMut};
use crate::types::{BoxId, CellCoord, CellState, Vec3};
use log::debug;

/// Dense voxel grid with a box decomposition.
#[derive(Clone, Debug)]
pub struct VoxelWorld {
    /// Flat storage: index = x + z * size_x + y * size_x * size_z.
    cells: Vec<CellState>,
    /// Box containing each cell, same indexing.
    box_index: Vec<Option<BoxId>>,
    boxes: BoxArena,
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
    pub transform: GridTransform,
}

impl VoxelWorld {
    /// An all-empty world with no boxes.
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Self {
        let total = (size_x as usize) * (size_y as usize) * (size_z as usize);
        Self {
            cells: vec![CellState::EMPTY; total],
            box_index: vec![None; total],
            boxes: BoxArena::new(),
            size_x,
            size_y,
            size_z,
            transform: GridTransform::default(),
        }
    }

    pub fn in_bounds(&self, coord: CellCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.z >= 0
            && (coord.x as u32) < self.size_x
            && (coord.y as u32) < self.size_y
            && (coord.z as u32) < self.size_z
    }

    fn index(&self, coord: CellCoord) -> Option<usize> {
        if !self.in_bounds(coord) {
            return None;
        }
        let sx = self.size_x as usize;
        let sz = self.size_z as usize;
        Some(coord.x as usize + coord.z as usize * sx + coord.y as usize * sx * sz)
    }

    /// Read a cell. `EMPTY` outside the bounds.
    pub fn get(&self, coord: CellCoord) -> CellState {
        self.index(coord)
            .map_or(CellState::EMPTY, |i| self.cells[i])
    }

    /// Write a cell. Returns whether it changed. A change drops the box
    /// that contained the cell until the next `regenerate()`.
    pub fn set(&mut self, coord: CellCoord, state: CellState) -> Result<bool> {
        let i = self.index(coord).ok_or(NavError::OutOfBounds(coord))?;
        Ok(self.write(i, state))
    }

    /// Fill an axis-aligned block, inclusive of both corners. Cells outside
    /// the bounds are skipped.
    pub fn fill_region(&mut self, a: CellCoord, b: CellCoord, state: CellState) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    if let Some(i) = self.index(CellCoord::new(x, y, z)) {
                        self.write(i, state);
                    }
                }
            }
        }
    }

    pub fn boxes(&self) -> &BoxArena {
        &self.boxes
    }

    fn write(&mut self, i: usize, state: CellState) -> bool {
        if self.cells[i] == state {
            return false;
        }
        self.cells[i] = state;
        if let Some(id) = self.box_index[i] {
            self.detach_box(id);
        }
        true
    }

    fn detach_box(&mut self, id: BoxId) {
        let Some(bounds) = self.boxes.remove(id) else {
            return;
        };
        for y in 0..bounds.height as i32 {
            for z in 0..bounds.depth as i32 {
                for x in 0..bounds.width as i32 {
                    if let Some(i) = self.index(bounds.min().shifted(x, y, z)) {
                        self.box_index[i] = None;
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Box decomposition
    // -----------------------------------------------------------------------

    /// Rebuild every box and all adjacency from the current cells. All
    /// previously issued `BoxId`s go stale.
    pub fn regenerate(&mut self) {
        self.boxes.clear();
        self.box_index.iter_mut().for_each(|slot| *slot = None);

        for y in 0..self.size_y as i32 {
            for z in 0..self.size_z as i32 {
                for x in 0..self.size_x as i32 {
                    let origin = CellCoord::new(x, y, z);
                    if self.claimable(origin).is_some() {
                        self.grow_box(origin);
                    }
                }
            }
        }
        self.link_faces();
        debug!(
            "world: regenerated {} boxes over {}x{}x{}",
            self.boxes.len(),
            self.size_x,
            self.size_y,
            self.size_z
        );
    }

    /// The state of `coord` if it is non-empty and not yet in a box.
    fn claimable(&self, coord: CellCoord) -> Option<CellState> {
        let i = self.index(coord)?;
        let state = self.cells[i];
        (!state.is_empty() && self.box_index[i].is_none()).then_some(state)
    }

    fn grow_box(&mut self, origin: CellCoord) {
        let Some(state) = self.claimable(origin) else {
            return;
        };
        let matches = |c: CellCoord| self.claimable(c) == Some(state);

        let mut width = 1;
        while matches(origin.shifted(width, 0, 0)) {
            width += 1;
        }
        let mut depth = 1;
        while (0..width).all(|dx| matches(origin.shifted(dx, 0, depth))) {
            depth += 1;
        }
        let mut height = 1;
        while (0..width).all(|dx| (0..depth).all(|dz| matches(origin.shifted(dx, height, dz)))) {
            height += 1;
        }

        let id = self.boxes.insert(VoxelBox::new(
            origin,
            width as u32,
            height as u32,
            depth as u32,
            state,
        ));
        for dy in 0..height {
            for dz in 0..depth {
                for dx in 0..width {
                    if let Some(i) = self.index(origin.shifted(dx, dy, dz)) {
                        self.box_index[i] = Some(id);
                    }
                }
            }
        }
    }

    fn link_faces(&mut self) {
        let mut pairs = Vec::new();
        for y in 0..self.size_y as i32 {
            for z in 0..self.size_z as i32 {
                for x in 0..self.size_x as i32 {
                    let c = CellCoord::new(x, y, z);
                    let Some(a) = self.box_at(c) else {
                        continue;
                    };
                    for (dx, dy, dz) in [(1, 0, 0), (0, 1, 0), (0, 0, 1)] {
                        if let Some(b) = self.box_at(c.shifted(dx, dy, dz)).filter(|&b| b != a) {
                            pairs.push((a, b));
                        }
                    }
                }
            }
        }
        for (a, b) in pairs {
            self.boxes.link(a, b);
        }
    }
}

impl VoxelGrid for VoxelWorld {
    fn cell(&self, coord: CellCoord) -> Option<CellState> {
        self.index(coord).map(|i| self.cells[i])
    }

    fn box_at(&self, coord: CellCoord) -> Option<BoxId> {
        self.index(coord).and_then(|i| self.box_index[i])
    }

    fn box_info(&self, id: BoxId) -> Option<&VoxelBox> {
        self.boxes.get(id)
    }

    fn adjacent(&self, id: BoxId) -> &[Option<BoxId>] {
        self.boxes.adjacent(id)
    }

    fn absolute_point(&self, local: Vec3) -> Vec3 {
        self.transform.to_world(local)
    }

    fn coordinate_of(&self, world: Vec3) -> CellCoord {
        self.transform.to_cell(world)
    }
}

impl VoxelGridMut for VoxelWorld {
    fn fill(&mut self, coord: CellCoord, state: CellState) -> Result<bool> {
        self.set(coord, state)
    }

    fn empty(&mut self, coord: CellCoord) -> Result<bool> {
        self.set(coord, CellState::EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MaterialId;

    const STONE: CellState = CellState::of(MaterialId(1));
    const DIRT: CellState = CellState::of(MaterialId(2));

    #[test]
    fn indexing_is_correct() {
        let mut world = VoxelWorld::new(10, 8, 6);
        let coord = CellCoord::new(5, 3, 4);
        assert!(world.set(coord, STONE).unwrap());
        assert!(!world.set(coord, STONE).unwrap());
        assert_eq!(world.get(coord), STONE);
        assert_eq!(world.get(CellCoord::new(4, 3, 4)), CellState::EMPTY);
        assert_eq!(world.get(CellCoord::new(5, 2, 4)), CellState::EMPTY);
        assert_eq!(world.get(CellCoord::new(5, 3, 3)), CellState::EMPTY);
    }

    #[test]
    fn out_of_bounds_reads_none_and_writes_fail() {
        let mut world = VoxelWorld::new(4, 4, 4);
        let outside = CellCoord::new(4, 0, 0);
        assert_eq!(world.cell(outside), None);
        assert_eq!(world.cell(CellCoord::new(0, 0, 0)), Some(CellState::EMPTY));
        let err = world.fill(outside, STONE).unwrap_err();
        assert!(matches!(err, NavError::OutOfBounds(c) if c == outside));
    }

    #[test]
    fn solid_slab_becomes_one_box() {
        let mut world = VoxelWorld::new(8, 4, 8);
        world.fill_region(CellCoord::new(1, 0, 2), CellCoord::new(4, 0, 4), STONE);
        world.regenerate();
        assert_eq!(world.boxes().len(), 1);
        let id = world.box_at(CellCoord::new(3, 0, 3)).unwrap();
        let b = world.box_info(id).unwrap();
        assert_eq!((b.x, b.y, b.z), (1, 0, 2));
        assert_eq!((b.width, b.height, b.depth), (4, 1, 3));
        assert_eq!(world.box_at(CellCoord::new(0, 0, 0)), None);
    }

    #[test]
    fn different_materials_split_and_link() {
        let mut world = VoxelWorld::new(6, 1, 1);
        world.fill_region(CellCoord::new(0, 0, 0), CellCoord::new(2, 0, 0), STONE);
        world.fill_region(CellCoord::new(3, 0, 0), CellCoord::new(5, 0, 0), DIRT);
        world.regenerate();
        let a = world.box_at(CellCoord::new(0, 0, 0)).unwrap();
        let b = world.box_at(CellCoord::new(5, 0, 0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(world.adjacent(a), &[Some(b)]);
        assert_eq!(world.adjacent(b), &[Some(a)]);
    }

    #[test]
    fn editing_a_cell_drops_its_box_until_regenerate() {
        let mut world = VoxelWorld::new(6, 1, 1);
        world.fill_region(CellCoord::new(0, 0, 0), CellCoord::new(2, 0, 0), STONE);
        world.fill_region(CellCoord::new(3, 0, 0), CellCoord::new(5, 0, 0), DIRT);
        world.regenerate();
        let stone = world.box_at(CellCoord::new(0, 0, 0)).unwrap();
        let dirt = world.box_at(CellCoord::new(4, 0, 0)).unwrap();

        world.empty(CellCoord::new(4, 0, 0)).unwrap();
        assert!(world.box_info(dirt).is_none());
        assert_eq!(world.box_at(CellCoord::new(3, 0, 0)), None);
        assert_eq!(world.adjacent(stone), &[None]);

        world.regenerate();
        assert!(world.box_info(stone).is_none());
        assert_eq!(world.boxes().len(), 3);
        assert_eq!(world.box_at(CellCoord::new(4, 0, 0)), None);
    }

    #[test]
    fn fill_region_clips_to_bounds_and_drops_touched_boxes() {
        let mut world = VoxelWorld::new(4, 2, 4);
        world.fill_region(CellCoord::new(0, 0, 0), CellCoord::new(3, 0, 3), STONE);
        world.regenerate();
        let floor = world.box_at(CellCoord::new(0, 0, 0)).unwrap();

        world.fill_region(CellCoord::new(2, 0, 2), CellCoord::new(9, 5, 9), DIRT);
        assert!(world.box_info(floor).is_none());
        assert_eq!(world.get(CellCoord::new(3, 1, 3)), DIRT);
        assert_eq!(world.get(CellCoord::new(1, 0, 1)), STONE);
        assert_eq!(world.cell(CellCoord::new(4, 0, 0)), None);
    }

    #[test]
    fn merge_grows_x_then_z_then_y() {
        let mut world = VoxelWorld::new(3, 2, 2);
        world.fill_region(CellCoord::new(0, 0, 0), CellCoord::new(2, 1, 1), STONE);
        // Notch out one top corner so the bottom layer merges alone.
        world.empty(CellCoord::new(2, 1, 1)).unwrap();
        world.regenerate();
        let bottom = world.box_info(world.box_at(CellCoord::new(0, 0, 0)).unwrap()).unwrap();
        assert_eq!((bottom.width, bottom.height, bottom.depth), (3, 1, 2));
        // Top layer: a full 3-wide row at z = 0, then a 2-wide remainder.
        let top_front = world.box_info(world.box_at(CellCoord::new(0, 1, 0)).unwrap()).unwrap();
        assert_eq!((top_front.width, top_front.height, top_front.depth), (3, 1, 1));
        assert_eq!(world.boxes().len(), 3);
    }

    #[test]
    fn closest_filled_cell_uses_the_dense_cells() {
        let mut world = VoxelWorld::new(8, 8, 8);
        world.fill(CellCoord::new(6, 2, 2), STONE).unwrap();
        assert_eq!(
            world.find_closest_filled_cell(CellCoord::new(3, 2, 2), 10),
            Some(CellCoord::new(6, 2, 2))
        );
        assert_eq!(world.find_closest_filled_cell(CellCoord::new(3, 2, 2), 3), None);
    }
}
