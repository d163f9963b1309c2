use nalgebra::Point3;

use crate::config::RecoveryConfig;

/// Low-frequency check that returns an agent to spawn after it falls out of the world.
#[derive(Debug, Clone)]
pub struct OutOfBoundsWatchdog {
    floor_y: f32,
    check_interval: f32,
    since_check: f32,
    spawn: Point3<f32>,
    recoveries: u32,
}

impl OutOfBoundsWatchdog {
    /// `default_spawn` is used unless the config names a spawn position.
    pub fn new(config: &RecoveryConfig, default_spawn: Point3<f32>) -> Self {
        let spawn = config
            .spawn_position
            .map(|[x, y, z]| Point3::new(x, y, z))
            .unwrap_or(default_spawn);
        Self {
            floor_y: config.floor_y,
            check_interval: config.check_interval.max(f32::EPSILON),
            since_check: 0.0,
            spawn,
            recoveries: 0,
        }
    }

    pub fn spawn(&self) -> Point3<f32> {
        self.spawn
    }

    pub fn set_spawn(&mut self, spawn: Point3<f32>) {
        self.spawn = spawn;
    }

    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    /// Advances the check timer. On a due check with `position` below the floor,
    /// returns the spawn point the agent must be teleported to.
    pub fn tick(&mut self, dt: f32, position: Point3<f32>) -> Option<Point3<f32>> {
        self.since_check += dt.max(0.0);
        if self.since_check < self.check_interval {
            return None;
        }
        self.since_check = 0.0;

        if position.y < self.floor_y {
            self.recoveries += 1;
            tracing::info!(
                y = position.y,
                floor_y = self.floor_y,
                recoveries = self.recoveries,
                "agent below floor, returning to spawn"
            );
            Some(self.spawn)
        } else {
            None
        }
    }
}
