use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

use crate::world::Position;

/// Rectangle random placements are drawn from. Keeps spawns off the map edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpawnArea {
    pub min_x: i32,
    pub min_y: i32,
    pub width: i32,
    pub height: i32,
}

impl SpawnArea {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        Position::new(
            self.min_x + rng.gen_range(0..self.width.max(1)),
            self.min_y + rng.gen_range(0..self.height.max(1)),
        )
    }
}

impl Default for SpawnArea {
    fn default() -> Self {
        Self {
            min_x: 5,
            min_y: 5,
            width: 70,
            height: 20,
        }
    }
}

/// Region where the coordinator keeps the guardian awake: `x > x_above && y < y_below`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardedRegion {
    pub x_above: i32,
    pub y_below: i32,
}

impl GuardedRegion {
    pub fn contains(&self, pos: Position) -> bool {
        pos.x > self.x_above && pos.y < self.y_below
    }
}

impl Default for GuardedRegion {
    fn default() -> Self {
        Self {
            x_above: 20,
            y_below: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub patroller_start: Position,
    pub patroller_tick_ms: u64,
    pub portal_spawn_interval_ms: u64,
    pub portal_open_ms: u64,
    pub portal_spawn_attempts: u32,
    pub teleport_attempts: u32,
    pub ghost_start: Position,
    pub ghost_tick_ms: u64,
    pub trap_expiry_ms: u64,
    pub guardian_post: Position,
    pub guardian_tick_ms: u64,
    pub guardian_detection_range: i32,
    pub coordinator_period_ms: u64,
    pub ghost_pursuit_x_threshold: i32,
    pub guarded_region: GuardedRegion,
    pub ghost_hide_one_in: u32,
    pub treasure_spawn_one_in: u32,
    pub trap_spawn_one_in: u32,
    pub trap_spawn_radius: i32,
    pub spawn_area: SpawnArea,
    pub monitor_period_ms: u64,
    pub portal_auto_use_delay_ms: u64,
    pub inbox_capacity: usize,
    pub render_queue_capacity: usize,
    pub shutdown_grace_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            patroller_start: Position::new(10, 5),
            patroller_tick_ms: 800,
            portal_spawn_interval_ms: 10_000,
            portal_open_ms: 7_000,
            portal_spawn_attempts: 20,
            teleport_attempts: 10,
            ghost_start: Position::new(15, 15),
            ghost_tick_ms: 1_000,
            trap_expiry_ms: 6_000,
            guardian_post: Position::new(25, 10),
            guardian_tick_ms: 2_000,
            guardian_detection_range: 3,
            coordinator_period_ms: 3_000,
            ghost_pursuit_x_threshold: 30,
            guarded_region: GuardedRegion::default(),
            ghost_hide_one_in: 10,
            treasure_spawn_one_in: 20,
            trap_spawn_one_in: 25,
            trap_spawn_radius: 2,
            spawn_area: SpawnArea::default(),
            monitor_period_ms: 250,
            portal_auto_use_delay_ms: 1_500,
            inbox_capacity: 4,
            render_queue_capacity: 100,
            shutdown_grace_ms: 150,
        }
    }
}

impl SimConfig {
    /// Replaces values that would stall a loop or make a channel unusable
    /// (zero periods, zero capacities, zero odds) with the defaults.
    pub fn validated(mut self) -> Self {
        let defaults = SimConfig::default();
        normalize_non_zero(&mut self.patroller_tick_ms, defaults.patroller_tick_ms);
        normalize_non_zero(
            &mut self.portal_spawn_interval_ms,
            defaults.portal_spawn_interval_ms,
        );
        normalize_non_zero(&mut self.portal_open_ms, defaults.portal_open_ms);
        normalize_non_zero(&mut self.ghost_tick_ms, defaults.ghost_tick_ms);
        normalize_non_zero(&mut self.trap_expiry_ms, defaults.trap_expiry_ms);
        normalize_non_zero(&mut self.guardian_tick_ms, defaults.guardian_tick_ms);
        normalize_non_zero(
            &mut self.coordinator_period_ms,
            defaults.coordinator_period_ms,
        );
        normalize_non_zero(&mut self.monitor_period_ms, defaults.monitor_period_ms);
        normalize_non_zero(&mut self.ghost_hide_one_in, defaults.ghost_hide_one_in);
        normalize_non_zero(
            &mut self.treasure_spawn_one_in,
            defaults.treasure_spawn_one_in,
        );
        normalize_non_zero(&mut self.trap_spawn_one_in, defaults.trap_spawn_one_in);
        normalize_non_zero(&mut self.inbox_capacity, defaults.inbox_capacity);
        normalize_non_zero(
            &mut self.render_queue_capacity,
            defaults.render_queue_capacity,
        );
        if self.spawn_area.width <= 0 || self.spawn_area.height <= 0 {
            self.spawn_area = defaults.spawn_area;
        }
        self.trap_spawn_radius = self.trap_spawn_radius.max(0);
        self.guardian_detection_range = self.guardian_detection_range.max(0);
        self
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn normalize_non_zero<T: Default + PartialEq>(value: &mut T, fallback: T) {
    if *value == T::default() {
        *value = fallback;
    }
}
