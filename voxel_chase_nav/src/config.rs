// Tunable navigation parameters.
//
// Every number the navigator reads lives in `ChaseConfig` rather than in
// the code, and the whole struct can be loaded from JSON so different
// agent types (fast burrowers, slow idle crawlers) are data, not branches.
// Missing fields fall back to `Default` via `#[serde(default)]`, so a
// config file only needs to name what it changes.
//
// See also: `chase.rs`, which copies `speed` and `pathfinding_enabled` into
// each spawned agent and reads the rest on every commit.
//
// **Critical constraint: determinism.** Agents sharing a seed and a world
// only replay identically when they also share a config.

use crate::error::{NavError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseConfig {
    /// Cells traversed per second.
    pub speed: f32,

    /// Number of recently visited cells the oscillation guard remembers.
    pub history_capacity: usize,

    /// Direction-change die size while a target is active: on each commit
    /// the agent re-decides with probability `1 / change_odds_chasing`.
    pub change_odds_chasing: u32,

    /// Same as `change_odds_chasing`, used while idle. Larger means longer
    /// straight runs.
    pub change_odds_idle: u32,

    /// World-space distance beyond which the box planner is consulted.
    pub far_target_distance: f32,

    /// Hard cap on planner node expansions per call.
    pub planner_max_iterations: usize,

    /// Initial cell radius of the search for a new grid after the agent's
    /// grid disappears.
    pub reacquire_radius: u32,

    /// Whether newly spawned agents use the box planner at all.
    pub pathfinding_enabled: bool,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            speed: 8.0,
            history_capacity: 5,
            change_odds_chasing: 2,
            change_odds_idle: 6,
            far_target_distance: 5.0,
            planner_max_iterations: 20,
            reacquire_radius: 10,
            pathfinding_enabled: true,
        }
    }
}

impl ChaseConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ChaseConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would stall or break the tick loop.
    pub fn validate(&self) -> Result<()> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(NavError::InvalidConfig(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        if self.history_capacity == 0 {
            return Err(NavError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }
        if self.change_odds_chasing == 0 || self.change_odds_idle == 0 {
            return Err(NavError::InvalidConfig(
                "direction change odds must be at least 1".into(),
            ));
        }
        if self.planner_max_iterations == 0 {
            return Err(NavError::InvalidConfig(
                "planner_max_iterations must be at least 1".into(),
            ));
        }
        if self.far_target_distance.is_nan() || self.far_target_distance < 0.0 {
            return Err(NavError::InvalidConfig(format!(
                "far_target_distance must be non-negative, got {}",
                self.far_target_distance
            )));
        }
        Ok(())
    }
}
