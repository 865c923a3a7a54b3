// End-to-end navigation scenarios on the dense reference world.
//
// Each test builds a `VoxelWorld`, registers it in a `GridSet`, spawns one
// or more `ChaseAgent`s and drives them tick by tick the way a host would:
// tick every agent, then apply the returned events to the world (laying a
// trail, rebuilding boxes, removing deleted agents). Only the public API is
// used.

use voxel_chase_nav::chase::{ChaseAgent, TickOutcome};
use voxel_chase_nav::config::ChaseConfig;
use voxel_chase_nav::event::{DeleteReason, NavEvent, NavEventKind};
use voxel_chase_nav::filter::{CrawlerFilter, solid_filter};
use voxel_chase_nav::grid::{GridSet, GridTransform, VoxelGrid, VoxelGridMut};
use voxel_chase_nav::planner::plan;
use voxel_chase_nav::types::{AgentId, CellCoord, CellState, MaterialId, Vec3};
use voxel_chase_nav::world::VoxelWorld;

const STONE: CellState = CellState::of(MaterialId(1));
const DIRT: CellState = CellState::of(MaterialId(2));
const TRAIL_MATERIAL: MaterialId = MaterialId(7);
const TRAIL: CellState = CellState::of(TRAIL_MATERIAL);

/// Fixed step used by every scenario: 0.4 cells per tick at default speed.
const DT: f32 = 0.05;

/// A `size` × 8 × `size` world with a stone floor at y = 0.
fn floored_world(size: u32) -> VoxelWorld {
    let mut world = VoxelWorld::new(size, 8, size);
    let far = size as i32 - 1;
    world.fill_region(CellCoord::new(0, 0, 0), CellCoord::new(far, 0, far), STONE);
    world.regenerate();
    world
}

/// A 40 × 4 × 3 corridor floor of alternating 4-cell stone and dirt
/// segments, so the box graph is a chain of ten boxes.
fn segmented_corridor() -> VoxelWorld {
    let mut world = VoxelWorld::new(40, 4, 3);
    for segment in 0..10 {
        let state = if segment % 2 == 0 { STONE } else { DIRT };
        world.fill_region(
            CellCoord::new(segment * 4, 0, 0),
            CellCoord::new(segment * 4 + 3, 0, 2),
            state,
        );
    }
    world.regenerate();
    world
}

fn moved(events: &[NavEvent]) -> impl Iterator<Item = CellCoord> + '_ {
    events.iter().filter_map(|e| match e.kind {
        NavEventKind::Moved { coord, .. } => Some(coord),
        NavEventKind::Deleted { .. } => None,
    })
}

#[test]
fn trail_laying_chaser_reaches_its_target() {
    let mut grids = GridSet::new();
    let id = grids.insert(floored_world(48));
    let filter = CrawlerFilter {
        passable: vec![TRAIL_MATERIAL],
        solid: vec![STONE.material],
        ..CrawlerFilter::default()
    };
    let target = Vec3::new(24.5, 1.5, 24.5);
    let mut agent = ChaseAgent::spawn_at(
        AgentId(1),
        &ChaseConfig::default(),
        11,
        &grids,
        id,
        CellCoord::new(8, 1, 8),
    )
    .unwrap();
    agent.set_target(target);

    let mut events = Vec::new();
    let mut commits = 0;
    let mut closest = f32::MAX;
    for _ in 0..400 {
        agent.tick(DT, &grids, &filter, &mut events);
        assert!(agent.is_alive());
        closest = closest.min((agent.position() - target).length());

        let world = grids.get_mut(id).unwrap();
        for coord in moved(&events) {
            assert_eq!(coord.y, 1, "left the floor at {coord}");
            if world.in_bounds(coord) {
                world.fill(coord, TRAIL).unwrap();
            }
            commits += 1;
            if commits % 10 == 0 {
                world.regenerate();
            }
        }
        events.clear();
    }

    assert!(closest < 2.0, "closest approach {closest}");
    let world = grids.get(id).unwrap();
    assert_eq!(world.get(CellCoord::new(8, 1, 8)), TRAIL);
}

#[test]
fn corridor_plan_spans_the_box_chain() {
    let world = segmented_corridor();
    assert_eq!(world.boxes().len(), 10);
    let start = world.box_at(CellCoord::new(1, 0, 1)).unwrap();
    let path = plan(&world, start, Vec3::new(38.5, 1.5, 1.5), 20);
    assert!(path.reached);
    assert_eq!(path.boxes.len(), 10);
    assert!(path.iterations <= 20);
    assert_eq!(path.waypoint(), world.box_at(CellCoord::new(5, 0, 1)));
}

#[test]
fn pathfinding_chaser_runs_the_corridor() {
    let mut grids = GridSet::new();
    let id = grids.insert(segmented_corridor());
    let mut agent = ChaseAgent::spawn_at(
        AgentId(3),
        &ChaseConfig::default(),
        5,
        &grids,
        id,
        CellCoord::new(1, 1, 1),
    )
    .unwrap();
    agent.set_target(Vec3::new(38.5, 1.5, 1.5));
    assert!(agent.pathfinding_enabled());

    let mut events = Vec::new();
    for _ in 0..200 {
        agent.tick(DT, &grids, &solid_filter, &mut events);
        assert!(agent.is_alive());
    }
    let furthest = moved(&events).map(|c| c.x).max().unwrap();
    assert!(furthest >= 35, "only reached x = {furthest}");
}

#[test]
fn removing_the_floor_strands_the_agent() {
    let mut grids = GridSet::new();
    let id = grids.insert(floored_world(8));
    let mut agent = ChaseAgent::spawn_at(
        AgentId(4),
        &ChaseConfig::default(),
        2,
        &grids,
        id,
        CellCoord::new(4, 1, 4),
    )
    .unwrap();

    let mut events = Vec::new();
    assert_eq!(
        agent.tick(DT, &grids, &solid_filter, &mut events),
        TickOutcome::Stepped
    );

    let world = grids.get_mut(id).unwrap();
    world.fill_region(CellCoord::new(0, 0, 0), CellCoord::new(7, 0, 7), CellState::EMPTY);

    let mut outcome = TickOutcome::Moving;
    for _ in 0..10 {
        outcome = agent.tick(DT, &grids, &solid_filter, &mut events);
        if outcome != TickOutcome::Moving {
            break;
        }
    }
    assert_eq!(outcome, TickOutcome::Deleted(DeleteReason::DeadEnd));
    assert!(matches!(
        events.last(),
        Some(NavEvent {
            agent: AgentId(4),
            kind: NavEventKind::Deleted {
                reason: DeleteReason::DeadEnd
            }
        })
    ));
}

#[test]
fn deactivated_grid_hands_agent_to_the_nearest_other() {
    let mut grids = GridSet::new();
    let home = grids.insert(floored_world(8));
    let mut neighbor = VoxelWorld::new(8, 8, 8);
    neighbor.transform = GridTransform {
        origin: Vec3::new(1.0, 0.0, 0.0),
        cell_size: 1.0,
    };
    neighbor.fill(CellCoord::new(5, 4, 4), STONE).unwrap();
    neighbor.regenerate();
    let other = grids.insert(neighbor);

    let mut agent = ChaseAgent::new(
        AgentId(5),
        &ChaseConfig::default(),
        9,
        Vec3::new(4.5, 4.5, 4.5),
    )
    .unwrap();
    grids.set_active(home, false).unwrap();

    let mut events = Vec::new();
    assert_eq!(
        agent.tick(DT, &grids, &solid_filter, &mut events),
        TickOutcome::Reacquired(other)
    );
    // Agent sits at neighbor-local (3, 4, 4); the stone is two cells along
    // +X, so the agent lands on its -X face.
    assert_eq!(agent.current_coord(), CellCoord::new(4, 4, 4));
    let landed = grids.get(other).unwrap().absolute_position(CellCoord::new(4, 4, 4));
    assert_eq!(agent.position(), landed);
    assert_eq!(landed, Vec3::new(5.5, 4.5, 4.5));
    assert!(events.is_empty());
}

#[test]
fn same_seed_same_events() {
    let run = |seed: u64| {
        let mut grids = GridSet::new();
        let id = grids.insert(floored_world(16));
        let mut agent = ChaseAgent::spawn_at(
            AgentId(6),
            &ChaseConfig::default(),
            seed,
            &grids,
            id,
            CellCoord::new(8, 1, 8),
        )
        .unwrap();
        let mut events = Vec::new();
        for _ in 0..500 {
            agent.tick(DT, &grids, &solid_filter, &mut events);
        }
        events
    };

    let a = run(42);
    let b = run(42);
    assert!(!a.is_empty());
    assert_eq!(a, b);
    assert_ne!(a, run(43));
}

#[test]
fn config_file_drives_agents() {
    let config = ChaseConfig::from_json(r#"{ "speed": 2.0, "history_capacity": 3 }"#).unwrap();
    let mut grids = GridSet::new();
    let id = grids.insert(floored_world(8));
    let mut agent =
        ChaseAgent::spawn_at(AgentId(7), &config, 1, &grids, id, CellCoord::new(3, 1, 3)).unwrap();

    let mut events = Vec::new();
    for _ in 0..100 {
        agent.tick(DT, &grids, &solid_filter, &mut events);
        assert!(agent.history().len() <= 3);
    }
    // One commit on spawn, then roughly one every 10 ticks at 2 cells/s.
    let commits = moved(&events).count();
    assert!((10..=11).contains(&commits), "{commits} commits");
}
