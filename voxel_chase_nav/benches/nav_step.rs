// Per-tick cost of the navigator on the dense reference world.
//
// `classify` measures one 18-cell neighborhood read, `plan` one capped box
// search down a chain of boxes, and `tick` a chasing agent's steady-state
// tick (mostly interpolation, with a commit every few ticks).

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use voxel_chase_nav::chase::ChaseAgent;
use voxel_chase_nav::config::ChaseConfig;
use voxel_chase_nav::filter::solid_filter;
use voxel_chase_nav::grid::{GridSet, VoxelGrid};
use voxel_chase_nav::neighborhood::Neighborhood;
use voxel_chase_nav::planner::plan;
use voxel_chase_nav::types::{AgentId, CellCoord, CellState, MaterialId, Vec3};
use voxel_chase_nav::world::VoxelWorld;

/// 64 × 8 × 64 world whose floor alternates material every 4 cells along
/// x, giving a 16-box chain.
fn striped_floor() -> VoxelWorld {
    let mut world = VoxelWorld::new(64, 8, 64);
    for stripe in 0..16 {
        let state = CellState::of(MaterialId(1 + (stripe % 2) as u16));
        world.fill_region(
            CellCoord::new(stripe * 4, 0, 0),
            CellCoord::new(stripe * 4 + 3, 0, 63),
            state,
        );
    }
    world.regenerate();
    world
}

fn bench_classify(c: &mut Criterion) {
    let world = striped_floor();
    let at = CellCoord::new(20, 1, 20);
    c.bench_function("classify", |b| {
        b.iter(|| Neighborhood::sample(&world, black_box(at), &solid_filter).legal_directions())
    });
}

fn bench_plan(c: &mut Criterion) {
    let world = striped_floor();
    let Some(start) = world.box_at(CellCoord::new(1, 0, 32)) else {
        return;
    };
    let target = Vec3::new(62.5, 1.5, 32.5);
    c.bench_function("plan", |b| {
        b.iter(|| plan(&world, black_box(start), black_box(target), 20))
    });
}

fn bench_tick(c: &mut Criterion) {
    let mut grids = GridSet::new();
    let id = grids.insert(striped_floor());
    let Ok(mut agent) = ChaseAgent::spawn_at(
        AgentId(0),
        &ChaseConfig::default(),
        1,
        &grids,
        id,
        CellCoord::new(32, 1, 32),
    ) else {
        return;
    };
    let east = Vec3::new(61.5, 1.5, 32.5);
    let west = Vec3::new(2.5, 1.5, 32.5);
    agent.set_target(east);
    let mut events = Vec::new();
    c.bench_function("tick", |b| {
        b.iter(|| {
            // Run back and forth so the agent never settles on its target.
            let x = agent.position().x;
            if x > 56.0 {
                agent.set_target(west);
            } else if x < 8.0 {
                agent.set_target(east);
            }
            agent.tick(black_box(1.0 / 60.0), &grids, &solid_filter, &mut events);
            events.clear();
        })
    });
}

criterion_group!(benches, bench_classify, bench_plan, bench_tick);
criterion_main!(benches);
