// Box-level A* for long-range headings.
//
// Searches the adjacency graph of merged boxes rather than individual
// cells, so a single call covers long distances in a handful of
// expansions. The search is deliberately approximate and the agent's
// movement depends on its exact shape:
//
//   - entering a box costs that box's `size_weight()` (truncated average
//     dimension), so large open regions are cheap to cross per cell;
//   - the heuristic is the Euclidean distance from the box's world-space
//     center to the target;
//   - the search stops at the first popped box whose heuristic is below its
//     own size ("the target is roughly inside or next to this box"), which
//     is not the same as containing the target;
//   - a hard iteration cap bounds per-call cost. Hitting it returns the
//     path to the box being popped; exhausting the open set returns the
//     path to the box that got closest.
//
// Open-set entries are a min-heap via reversed ordering with a sequence
// counter for FIFO tie-breaking, the same pattern as the event queue in a
// discrete event simulator. Nodes live in a `Vec` arena for the duration of
// one call; box ids map to node indices through `FxHashMap`s whose
// iteration order is never observed.
//
// The box graph is edited between ticks by other systems. Adjacency lists
// may hold `None` holes and ids whose box is gone; both are skipped.
//
// See also: `boxes.rs` for the arena and adjacency lists, `chase.rs` for
// the caller that turns `BoxPath::waypoint()` into a heading.
//
// **Critical constraint: determinism.** Pure function of the box graph,
// the start box and the target. Ordering uses `total_cmp` plus insertion
// sequence.

use crate::grid::VoxelGrid;
use crate::types::{BoxId, Vec3};
use log::{debug, trace};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Result of one planner call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoxPath {
    /// Start box first. Empty when the start box no longer resolves.
    pub boxes: Vec<BoxId>,
    /// Whether the search stopped on a box near the target, as opposed to
    /// hitting the cap or running out of boxes.
    pub reached: bool,
    /// Nodes popped.
    pub iterations: usize,
}

impl BoxPath {
    /// The first box on the path that is not the start box.
    pub fn waypoint(&self) -> Option<BoxId> {
        self.boxes.get(1).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

struct SearchNode {
    parent: Option<usize>,
    id: BoxId,
    g: u32,
    heuristic: f32,
    /// Entry cost of this box, or the start box's largest dimension.
    size: u32,
    /// Sequence number of this node's current heap entry.
    seq: u64,
}

impl SearchNode {
    fn f(&self) -> f32 {
        self.g as f32 + self.heuristic
    }
}

/// Entry in the open set (min-heap via reversed ordering).
struct OpenEntry {
    f: f32,
    seq: u64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: lowest F first, then earliest insertion.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

fn heuristic<G: VoxelGrid + ?Sized>(grid: &G, center: Vec3, target: Vec3) -> f32 {
    (target - grid.absolute_point(center)).length()
}

fn reconstruct(nodes: &[SearchNode], mut index: usize) -> Vec<BoxId> {
    let mut boxes = vec![nodes[index].id];
    while let Some(parent) = nodes[index].parent {
        boxes.push(nodes[parent].id);
        index = parent;
    }
    boxes.reverse();
    boxes
}

/// Plan from `start` toward the world-space point `target`, popping at most
/// `max_iterations` nodes.
pub fn plan<G: VoxelGrid + ?Sized>(
    grid: &G,
    start: BoxId,
    target: Vec3,
    max_iterations: usize,
) -> BoxPath {
    let Some(start_box) = grid.box_info(start) else {
        debug!("planner: start box {start} no longer resolves");
        return BoxPath::default();
    };

    let mut seq: u64 = 0;
    let mut nodes = vec![SearchNode {
        parent: None,
        id: start,
        g: 0,
        heuristic: heuristic(grid, start_box.center(), target),
        size: start_box.max_extent(),
        seq,
    }];
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        f: nodes[0].f(),
        seq,
        node: 0,
    });
    let mut queued: FxHashMap<BoxId, usize> = FxHashMap::default();
    queued.insert(start, 0);
    let mut closed: FxHashMap<BoxId, u32> = FxHashMap::default();
    let mut closest = 0;
    let mut iterations = 0;

    while let Some(entry) = open.pop() {
        let current = entry.node;
        if nodes[current].seq != entry.seq || queued.get(&nodes[current].id) != Some(&current) {
            continue;
        }
        iterations += 1;

        let (id, g) = (nodes[current].id, nodes[current].g);
        trace!(
            "planner: pop {id} g={g} h={:.2} size={}",
            nodes[current].heuristic,
            nodes[current].size
        );

        if nodes[current].heuristic < nodes[current].size as f32 {
            debug!("planner: reached {id} after {iterations} iterations");
            return BoxPath {
                boxes: reconstruct(&nodes, current),
                reached: true,
                iterations,
            };
        }
        if iterations >= max_iterations {
            debug!("planner: iteration cap {max_iterations} hit at {id}");
            return BoxPath {
                boxes: reconstruct(&nodes, current),
                reached: false,
                iterations,
            };
        }

        queued.remove(&id);
        closed.insert(id, g);

        for &neighbor in grid.adjacent(id).iter().flatten() {
            let Some(bounds) = grid.box_info(neighbor) else {
                continue;
            };
            let size = bounds.size_weight();
            let tentative = g + size;
            if closed.get(&neighbor).is_some_and(|&prev| tentative >= prev) {
                continue;
            }

            seq += 1;
            let index = match queued.get(&neighbor).copied() {
                Some(index) if tentative < nodes[index].g => {
                    let node = &mut nodes[index];
                    node.parent = Some(current);
                    node.g = tentative;
                    node.seq = seq;
                    index
                }
                Some(_) => continue,
                None => {
                    closed.remove(&neighbor);
                    nodes.push(SearchNode {
                        parent: Some(current),
                        id: neighbor,
                        g: tentative,
                        heuristic: heuristic(grid, bounds.center(), target),
                        size,
                        seq,
                    });
                    let index = nodes.len() - 1;
                    queued.insert(neighbor, index);
                    index
                }
            };
            if nodes[index].heuristic < nodes[closest].heuristic {
                closest = index;
            }
            open.push(OpenEntry {
                f: nodes[index].f(),
                seq,
                node: index,
            });
        }
    }

    debug!(
        "planner: open set exhausted after {iterations} iterations, closest {}",
        nodes[closest].id
    );
    BoxPath {
        boxes: reconstruct(&nodes, closest),
        reached: false,
        iterations,
    }
}
