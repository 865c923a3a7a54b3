// Per-agent navigation state and the tick loop.
//
// A `ChaseAgent` occupies one cell at a time and slides between cells:
// `blend` runs from 0 to 1 while the continuous position is interpolated
// from `last_coord` to `current_coord`. When blend passes 1 the agent
// *commits*: it has arrived at `current_coord`, re-reads the neighborhood
// there, picks the next direction and starts the next slide.
//
// Direction choice on commit, in order:
//
//   1. No legal direction: the agent deletes itself (`DeadEnd`).
//   2. Keep going straight if the current direction is still legal, no
//      change was forced, and the change die (`one_in(odds)`, odds lower
//      while chasing) does not come up.
//   3. Otherwise re-decide. Idle agents pick uniformly. Chasing agents
//      steer by dot product toward the target, or toward the next box on a
//      planned path when the target is far. If the best direction leads
//      back into a recently visited cell, a random other direction is
//      taken instead, preferring cells not in the history.
//
// The world is mutated by other systems between ticks. Every commit reads
// fresh cells, the in-flight destination is re-checked at the start of
// each tick, and a grid handle that stops resolving sends the agent
// looking for the nearest other grid (`reacquire`).
//
// See also: `neighborhood.rs` (legal directions), `planner.rs` (box
// paths), `history.rs` (oscillation guard memory), `event.rs` (output).
//
// **Critical constraint: determinism.** All randomness comes from the
// agent's own `ChaseRng`. The die is only rolled when the current direction
// is otherwise keepable, so the number of draws per commit depends only on
// the world and the agent's state.

use crate::config::ChaseConfig;
use crate::error::{NavError, Result};
use crate::event::{DeleteReason, NavEvent, NavEventKind};
use crate::filter::CellFilter;
use crate::grid::{GridSet, VoxelGrid};
use crate::history::MoveHistory;
use crate::neighborhood::{DirectionSet, Neighborhood, classify_cell};
use crate::planner::plan;
use crate::types::{AgentId, CellCoord, Direction, GridId, Vec3};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use voxel_chase_prng::ChaseRng;

/// Whether the next commit must re-decide its direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionChange {
    #[default]
    Normal,
    /// Set by `force_direction_change`; cleared by the next re-decide.
    Forced,
}

/// What one call to `ChaseAgent::tick` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The agent was already deleted. Nothing happened.
    Dead,
    /// The grid handle was invalid and the agent attached to another grid.
    /// No step was taken this tick.
    Reacquired(GridId),
    /// Still sliding between two cells.
    Moving,
    /// Arrived at a cell and committed the next step.
    Stepped,
    /// The agent gave up this tick.
    Deleted(DeleteReason),
}

/// Navigation state of one crawling agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChaseAgent {
    id: AgentId,
    grid: Option<GridId>,
    last_coord: CellCoord,
    current_coord: CellCoord,
    blend: f32,
    speed: f32,
    direction: Option<Direction>,
    history: MoveHistory,
    target: Vec3,
    target_active: bool,
    enable_pathfinding: bool,
    enable_movement: bool,
    position: Vec3,
    direction_change: DirectionChange,
    rng: ChaseRng,
    alive: bool,
    config: ChaseConfig,
}

impl ChaseAgent {
    /// An agent not yet attached to any grid. Its first tick re-acquires a
    /// grid near `position`. Fails if `config` does not validate.
    pub fn new(id: AgentId, config: &ChaseConfig, seed: u64, position: Vec3) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id,
            grid: None,
            last_coord: CellCoord::default(),
            current_coord: CellCoord::default(),
            blend: 0.0,
            speed: config.speed,
            direction: None,
            history: MoveHistory::new(config.history_capacity),
            target: Vec3::ZERO,
            target_active: false,
            enable_pathfinding: config.pathfinding_enabled,
            enable_movement: true,
            position,
            direction_change: DirectionChange::Normal,
            rng: ChaseRng::new(seed),
            alive: true,
            config: config.clone(),
        })
    }

    /// An agent standing on `coord` in `grid`. The first tick commits from
    /// there.
    pub fn spawn_at<G: VoxelGrid>(
        id: AgentId,
        config: &ChaseConfig,
        seed: u64,
        grids: &GridSet<G>,
        grid: GridId,
        coord: CellCoord,
    ) -> Result<Self> {
        let voxels = grids.get(grid).ok_or(NavError::UnknownGrid(grid))?;
        let mut agent = Self::new(id, config, seed, voxels.absolute_position(coord))?;
        agent.attach(grid, coord);
        Ok(agent)
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance by `dt` seconds. Events are appended to `events`.
    pub fn tick<G, F>(
        &mut self,
        dt: f32,
        grids: &GridSet<G>,
        filter: &F,
        events: &mut Vec<NavEvent>,
    ) -> TickOutcome
    where
        G: VoxelGrid,
        F: CellFilter + ?Sized,
    {
        if !self.alive {
            return TickOutcome::Dead;
        }

        let attached = self
            .grid
            .and_then(|id| grids.get(id).map(|grid| (id, grid)));
        let Some((grid_id, grid)) = attached else {
            return match self.reacquire(grids) {
                Some(id) => TickOutcome::Reacquired(id),
                None => self.delete(DeleteReason::NoGrid, events),
            };
        };

        if self.current_coord != self.last_coord
            && !classify_cell(grid, self.current_coord, filter).is_traversable()
        {
            trace!(
                "{}: step into {} blocked, falling back to {}",
                self.id, self.current_coord, self.last_coord
            );
            self.current_coord = self.last_coord;
            self.blend = 1.0;
        }

        if self.enable_movement {
            self.blend += dt * self.speed;
        }

        let mut outcome = TickOutcome::Moving;
        if self.blend > 1.0 {
            self.blend = (self.blend - 1.0).min(1.0);
            outcome = self.commit(grid_id, grid, filter, events);
            if !self.alive {
                return outcome;
            }
        }

        self.position = interpolate(grid, self.last_coord, self.current_coord, self.blend);
        outcome
    }

    fn commit<G, F>(
        &mut self,
        grid_id: GridId,
        grid: &G,
        filter: &F,
        events: &mut Vec<NavEvent>,
    ) -> TickOutcome
    where
        G: VoxelGrid,
        F: CellFilter + ?Sized,
    {
        let arrival = self.current_coord;
        let neighborhood = Neighborhood::sample(grid, arrival, filter);
        let legal = neighborhood.legal_directions();
        if legal.is_empty() {
            return self.delete(DeleteReason::DeadEnd, events);
        }

        let odds = if self.target_active {
            self.config.change_odds_chasing
        } else {
            self.config.change_odds_idle
        };
        let keepable = self
            .direction
            .filter(|dir| legal.contains(dir) && self.direction_change == DirectionChange::Normal);
        let direction = match keepable {
            Some(dir) if !self.rng.one_in(odds) => dir,
            _ => {
                let dir = self.choose_direction(grid, &neighborhood, &legal);
                self.direction_change = DirectionChange::Normal;
                dir
            }
        };

        self.direction = Some(direction);
        self.last_coord = arrival;
        self.current_coord = arrival.offset(direction);
        self.history.push(self.current_coord);
        trace!("{}: at {arrival}, heading {direction:?}", self.id);

        events.push(NavEvent {
            agent: self.id,
            kind: NavEventKind::Moved {
                grid: grid_id,
                coord: arrival,
            },
        });
        TickOutcome::Stepped
    }

    // -----------------------------------------------------------------------
    // Direction selection
    // -----------------------------------------------------------------------

    fn choose_direction<G: VoxelGrid>(
        &mut self,
        grid: &G,
        neighborhood: &Neighborhood,
        legal: &[Direction],
    ) -> Direction {
        let arrival = neighborhood.center();
        if !self.target_active {
            return self.uniform_direction(legal);
        }

        let from = grid.absolute_position(arrival);
        let heading = self
            .long_range_heading(grid, neighborhood, from)
            .unwrap_or(self.target - from);
        let Some(best) = best_aligned(grid, legal, heading) else {
            return self.uniform_direction(legal);
        };
        if legal.len() > 1 && self.history.contains(arrival.offset(best)) {
            trace!("{}: {best:?} leads back into history", self.id);
            self.avoid_history(legal, arrival, best)
        } else {
            best
        }
    }

    /// Direction toward the next box on a planned path, when the target is
    /// far enough to be worth planning for.
    fn long_range_heading<G: VoxelGrid>(
        &self,
        grid: &G,
        neighborhood: &Neighborhood,
        from: Vec3,
    ) -> Option<Vec3> {
        if !self.enable_pathfinding || (self.target - from).length() <= self.config.far_target_distance
        {
            return None;
        }
        let support = neighborhood.first_support_direction()?;
        let start = grid.box_at(neighborhood.center().offset(support))?;
        let path = plan(grid, start, self.target, self.config.planner_max_iterations);
        let waypoint = path.waypoint()?;
        let bounds = grid.box_info(waypoint)?;
        debug!(
            "{}: planned {} boxes (reached: {}), steering for {waypoint}",
            self.id,
            path.boxes.len(),
            path.reached
        );
        Some(grid.absolute_point(bounds.center()) - from)
    }

    /// Uniform pick among `legal`, history ignored. `legal` is never empty
    /// here.
    fn uniform_direction(&mut self, legal: &[Direction]) -> Direction {
        match self.rng.choose(legal) {
            Some(&dir) => dir,
            None => legal[0],
        }
    }

    /// Uniform pick among `legal` other than `rejected`, preferring cells not
    /// in the history. A lone legal direction is returned as is.
    fn avoid_history(
        &mut self,
        legal: &[Direction],
        from: CellCoord,
        rejected: Direction,
    ) -> Direction {
        let others: DirectionSet = legal
            .iter()
            .copied()
            .filter(|&dir| dir != rejected)
            .collect();
        let fresh: DirectionSet = others
            .iter()
            .copied()
            .filter(|&dir| !self.history.contains(from.offset(dir)))
            .collect();
        let pool = if fresh.is_empty() { &others } else { &fresh };
        match self.rng.choose(pool) {
            Some(&dir) => dir,
            None => legal[0],
        }
    }

    // -----------------------------------------------------------------------
    // Grid loss
    // -----------------------------------------------------------------------

    /// Attach to the grid with a filled cell nearest to the agent, standing
    /// on the face of that cell that looks toward the agent.
    fn reacquire<G: VoxelGrid>(&mut self, grids: &GridSet<G>) -> Option<GridId> {
        let mut radius = self.config.reacquire_radius;
        let mut found = None;
        for (id, grid) in grids.live() {
            let here = grid.coordinate_of(self.position);
            let Some(cell) = grid.find_closest_filled_cell(here, radius) else {
                continue;
            };
            let toward_agent = Direction::from_vector(here.delta(cell)).unwrap_or(Direction::PositiveY);
            found = Some((id, cell.offset(toward_agent)));
            radius = here.chebyshev_distance(cell);
            if radius == 0 {
                break;
            }
        }

        let (id, coord) = found?;
        debug!("{}: re-acquired {id} at {coord}", self.id);
        self.attach(id, coord);
        if let Some(grid) = grids.get(id) {
            self.position = grid.absolute_position(coord);
        }
        Some(id)
    }

    fn attach(&mut self, grid: GridId, coord: CellCoord) {
        self.grid = Some(grid);
        self.last_coord = coord;
        self.current_coord = coord;
        self.blend = 1.0;
        self.history.clear();
    }

    fn delete(&mut self, reason: DeleteReason, events: &mut Vec<NavEvent>) -> TickOutcome {
        info!("{} deleted: {reason} at {}", self.id, self.current_coord);
        self.alive = false;
        events.push(NavEvent {
            agent: self.id,
            kind: NavEventKind::Deleted { reason },
        });
        TickOutcome::Deleted(reason)
    }

    // -----------------------------------------------------------------------
    // Host controls
    // -----------------------------------------------------------------------

    /// Chase a world-space point.
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.target_active = true;
    }

    /// Go back to wandering.
    pub fn clear_target(&mut self) {
        self.target_active = false;
    }

    pub fn set_enable_pathfinding(&mut self, enabled: bool) {
        self.enable_pathfinding = enabled;
    }

    /// A disabled agent holds its blend and never commits.
    pub fn set_enable_movement(&mut self, enabled: bool) {
        self.enable_movement = enabled;
    }

    /// Cells per second. Must be finite and positive; the old speed is
    /// kept otherwise.
    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(NavError::InvalidConfig(format!(
                "speed must be positive, got {speed}"
            )));
        }
        self.speed = speed;
        Ok(())
    }

    /// Make the next commit re-decide its direction (e.g. the agent was hit).
    pub fn force_direction_change(&mut self) {
        self.direction_change = DirectionChange::Forced;
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn grid(&self) -> Option<GridId> {
        self.grid
    }

    pub fn last_coord(&self) -> CellCoord {
        self.last_coord
    }

    pub fn current_coord(&self) -> CellCoord {
        self.current_coord
    }

    pub fn blend(&self) -> f32 {
        self.blend
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// World-space position as of the last tick.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn direction_change(&self) -> DirectionChange {
        self.direction_change
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// The chased point, if any.
    pub fn target(&self) -> Option<Vec3> {
        self.target_active.then_some(self.target)
    }

    pub fn pathfinding_enabled(&self) -> bool {
        self.enable_pathfinding
    }

    pub fn movement_enabled(&self) -> bool {
        self.enable_movement
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// World-space position `blend` of the way from `last` to `current`.
/// `blend` is clamped to `[0, 1]`.
pub fn interpolate<G: VoxelGrid + ?Sized>(
    grid: &G,
    last: CellCoord,
    current: CellCoord,
    blend: f32,
) -> Vec3 {
    grid.absolute_position(last)
        .lerp(grid.absolute_position(current), blend.clamp(0.0, 1.0))
}

/// The legal direction whose world-space step best matches `heading`.
/// Ties go to the earliest direction in `legal`.
fn best_aligned<G: VoxelGrid + ?Sized>(
    grid: &G,
    legal: &[Direction],
    heading: Vec3,
) -> Option<Direction> {
    legal
        .iter()
        .fold(None, |best: Option<(Direction, f32)>, &dir| {
            let dot = grid.absolute_vector(dir).dot(heading);
            match best {
                Some((_, best_dot)) if dot <= best_dot => best,
                _ => Some((dir, dot)),
            }
        })
        .map(|(dir, _)| dir)
}
