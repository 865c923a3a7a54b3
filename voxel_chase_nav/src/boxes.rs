// Merged voxel boxes and the arena that owns them.
//
// A `VoxelBox` is an axis-aligned run of contiguous cells sharing one
// `CellState`. Boxes live in a `BoxArena` and are referred to by
// generation-tagged `BoxId`s: removing a box bumps its slot's generation,
// so every outstanding id for it stops resolving instead of aliasing
// whatever box reuses the slot later.
//
// Adjacency is stored per box as `Vec<Option<BoxId>>`. When a box is
// removed, the entries pointing at it in its neighbors' lists are set to
// `None` in place rather than spliced out, so a reader walking a list while
// the world is being edited between ticks sees holes, never shifted
// indices. Holes disappear when the owning world rebuilds its boxes.
//
// See also: `world.rs`, which decomposes its cells into boxes and keeps a
// per-cell box index, `planner.rs`, which walks the adjacency lists.

use crate::types::{BoxId, CellCoord, CellState, Vec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned block of cells with one shared state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelBox {
    /// Minimum corner.
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub state: CellState,
}

impl VoxelBox {
    pub fn new(min: CellCoord, width: u32, height: u32, depth: u32, state: CellState) -> Self {
        Self {
            x: min.x,
            y: min.y,
            z: min.z,
            width,
            height,
            depth,
            state,
        }
    }

    pub fn min(&self) -> CellCoord {
        CellCoord::new(self.x, self.y, self.z)
    }

    /// Center in grid-local space.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            self.x as f32 + self.width as f32 * 0.5,
            self.y as f32 + self.height as f32 * 0.5,
            self.z as f32 + self.depth as f32 * 0.5,
        )
    }

    pub fn contains(&self, c: CellCoord) -> bool {
        c.x >= self.x
            && c.y >= self.y
            && c.z >= self.z
            && c.x < self.x + self.width as i32
            && c.y < self.y + self.height as i32
            && c.z < self.z + self.depth as i32
    }

    /// Average of the three dimensions, truncated. Cost of crossing this box.
    pub fn size_weight(&self) -> u32 {
        ((self.width + self.height + self.depth) as f32 / 3.0) as u32
    }

    pub fn max_extent(&self) -> u32 {
        self.width.max(self.height).max(self.depth)
    }
}

#[derive(Clone, Debug)]
struct BoxSlot {
    generation: u32,
    entry: Option<BoxEntry>,
}

#[derive(Clone, Debug)]
struct BoxEntry {
    bounds: VoxelBox,
    adjacent: Vec<Option<BoxId>>,
}

/// Slot arena of boxes with adjacency lists.
#[derive(Clone, Debug, Default)]
pub struct BoxArena {
    slots: Vec<BoxSlot>,
    free: Vec<u32>,
    live: usize,
}

impl BoxArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a box with no neighbors. Returns its id.
    pub fn insert(&mut self, bounds: VoxelBox) -> BoxId {
        let entry = BoxEntry {
            bounds,
            adjacent: Vec::new(),
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            BoxId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(BoxSlot {
                generation: 0,
                entry: Some(entry),
            });
            BoxId::new(index, 0)
        }
    }

    /// Remove a box. Neighbors keep a `None` hole where it used to be.
    pub fn remove(&mut self, id: BoxId) -> Option<VoxelBox> {
        let entry = {
            let slot = self.slot_mut(id)?;
            let entry = slot.entry.take()?;
            slot.generation = slot.generation.wrapping_add(1);
            entry
        };
        self.free.push(id.index);
        self.live -= 1;

        for neighbor in entry.adjacent.iter().flatten() {
            if let Some(other) = self.entry_mut(*neighbor) {
                for link in other.adjacent.iter_mut() {
                    if *link == Some(id) {
                        *link = None;
                    }
                }
            }
        }
        Some(entry.bounds)
    }

    /// Remove every box. All previously issued ids go stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
    }

    /// Link two boxes both ways. Duplicate and self links are ignored.
    pub fn link(&mut self, a: BoxId, b: BoxId) {
        if a == b || self.get(a).is_none() || self.get(b).is_none() {
            return;
        }
        for (from, to) in [(a, b), (b, a)] {
            if let Some(entry) = self
                .entry_mut(from)
                .filter(|e| !e.adjacent.contains(&Some(to)))
            {
                entry.adjacent.push(Some(to));
            }
        }
    }

    pub fn get(&self, id: BoxId) -> Option<&VoxelBox> {
        self.entry(id).map(|e| &e.bounds)
    }

    /// The adjacency list of `id`, holes included. Empty for stale ids.
    pub fn adjacent(&self, id: BoxId) -> &[Option<BoxId>] {
        self.entry(id).map_or(&[], |e| e.adjacent.as_slice())
    }

    pub fn contains(&self, id: BoxId) -> bool {
        self.entry(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live boxes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BoxId, &VoxelBox)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry
                .as_ref()
                .map(|e| (BoxId::new(index as u32, slot.generation), &e.bounds))
        })
    }

    fn entry(&self, id: BoxId) -> Option<&BoxEntry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: BoxId) -> Option<&mut BoxEntry> {
        self.slot_mut(id)?.entry.as_mut()
    }

    fn slot_mut(&mut self, id: BoxId) -> Option<&mut BoxSlot> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        Some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MaterialId;

    fn unit_box(x: i32) -> VoxelBox {
        VoxelBox::new(
            CellCoord::new(x, 0, 0),
            1,
            1,
            1,
            CellState::of(MaterialId(1)),
        )
    }

    #[test]
    fn center_and_contains() {
        let b = VoxelBox::new(
            CellCoord::new(2, 0, -1),
            4,
            2,
            1,
            CellState::of(MaterialId(3)),
        );
        assert_eq!(b.center(), Vec3::new(4.0, 1.0, -0.5));
        assert!(b.contains(CellCoord::new(2, 0, -1)));
        assert!(b.contains(CellCoord::new(5, 1, -1)));
        assert!(!b.contains(CellCoord::new(6, 1, -1)));
        assert!(!b.contains(CellCoord::new(2, 0, 0)));
    }

    #[test]
    fn size_weight_truncates_average() {
        let b = VoxelBox::new(CellCoord::new(0, 0, 0), 4, 1, 1, CellState::EMPTY);
        assert_eq!(b.size_weight(), 2);
        assert_eq!(b.max_extent(), 4);
    }

    #[test]
    fn removed_id_goes_stale_and_slot_is_reused() {
        let mut arena = BoxArena::new();
        let a = arena.insert(unit_box(0));
        assert!(arena.remove(a).is_some());
        assert!(arena.get(a).is_none());
        assert!(arena.remove(a).is_none());

        let b = arena.insert(unit_box(1));
        assert_eq!(b.index, a.index);
        assert_ne!(b.generation, a.generation);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b).unwrap().x, 1);
    }

    #[test]
    fn remove_leaves_holes_in_neighbors() {
        let mut arena = BoxArena::new();
        let a = arena.insert(unit_box(0));
        let b = arena.insert(unit_box(1));
        let c = arena.insert(unit_box(2));
        arena.link(a, b);
        arena.link(b, c);
        assert_eq!(arena.adjacent(b), &[Some(a), Some(c)]);

        arena.remove(a);
        assert_eq!(arena.adjacent(b), &[None, Some(c)]);
        assert_eq!(arena.adjacent(c), &[Some(b)]);
    }

    #[test]
    fn link_ignores_duplicates_self_and_stale() {
        let mut arena = BoxArena::new();
        let a = arena.insert(unit_box(0));
        let b = arena.insert(unit_box(1));
        arena.link(a, b);
        arena.link(b, a);
        arena.link(a, a);
        assert_eq!(arena.adjacent(a), &[Some(b)]);

        arena.remove(b);
        arena.link(a, b);
        assert_eq!(arena.adjacent(a), &[None]);
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut arena = BoxArena::new();
        let ids: Vec<BoxId> = (0..4).map(|x| arena.insert(unit_box(x))).collect();
        assert_eq!(arena.len(), 4);
        arena.clear();
        assert!(arena.is_empty());
        assert!(ids.iter().all(|&id| !arena.contains(id)));
        assert_eq!(arena.iter().count(), 0);
    }
}
