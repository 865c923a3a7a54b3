// voxel_chase_nav: navigation for crawling agents in destructible voxel
// worlds.
//
// An agent occupies one cell at a time, clings to solid or soft material,
// and chases a moving world-space target while the world is torn down and
// rebuilt around it. Each tick is a cheap local decision over the 3×3×3
// neighborhood; a bounded box-level A* is consulted only when the target is
// far away.
//
// Module overview:
// - `chase.rs`:        ChaseAgent: tick loop, interpolation, direction selection, grid re-acquisition.
// - `neighborhood.rs`: Local step classifier over the 3×3×3 block (legal directions).
// - `planner.rs`:      Box-level A* with an iteration cap and partial paths.
// - `history.rs`:      Bounded FIFO of recent cells for the oscillation guard.
// - `filter.rs`:       CellFilter: per-agent mapping from raw cells to traversal classes.
// - `grid.rs`:         VoxelGrid / VoxelGridMut storage traits, GridSet registry, ProceduralGrid.
// - `world.rs`:        VoxelWorld: dense reference grid with greedy box merging.
// - `boxes.rs`:        VoxelBox + BoxArena with generation-tagged ids and holey adjacency.
// - `event.rs`:        NavEvent output (Moved / Deleted).
// - `config.rs`:       ChaseConfig: all tunable parameters, JSON-loadable.
// - `error.rs`:        NavError for setup and storage operations.
// - `prng`:            Re-exported from `voxel_chase_prng`: xoshiro256++ with SplitMix64 seeding.
// - `types.rs`:        CellCoord, Direction, Vec3, cell states/classes, handles.
//
// The library never mutates voxels, spawns or despawns entities, or
// installs a logger. Hosts own the world and react to `NavEvent`s.
//
// **Critical constraint: determinism.** Navigation is a pure function of
// (agent state, world, dt sequence). Randomness comes only from each
// agent's seeded `ChaseRng`. No system time, no OS entropy, and no hash map
// whose iteration order is observable.

pub mod boxes;
pub mod chase;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod grid;
pub mod history;
pub mod neighborhood;
pub mod planner;
pub use voxel_chase_prng as prng;
pub mod types;
pub mod world;
