use nalgebra::Vector3;
use serde::Serialize;

use super::angle_math::basis_from_yaw;
use super::collaborators::{GroundContact, Intent, MoveOutcome};
use super::constants::movement as movement_consts;
use super::jump::{JumpCoordinator, JumpCycleState};
use super::platform::{PlatformVelocitySample, PlatformVelocityTracker};
use crate::config::MovementConfig;

/// Per-tick movement plan for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionPlan {
    /// Combined displacement handed to the move primitive.
    pub desired: Vector3<f32>,
    pub horizontal: Vector3<f32>,
    pub platform_carry: Vector3<f32>,
    pub new_vertical_velocity: f32,
    /// Ground state used for this tick, after jump-start suppression.
    pub grounded: bool,
    pub jumped: bool,
    pub landed: bool,
}

/// Combines intents, gravity, jump impulse and platform velocity into one
/// displacement per tick. Vertical velocity is the only integrated quantity;
/// horizontal velocity is recomputed from intent every tick.
#[derive(Debug, Clone)]
pub struct MovementIntegrator {
    config: MovementConfig,
    jump: JumpCoordinator,
    platform: PlatformVelocityTracker,
    vertical_velocity: f32,
    grounded: bool,
}

impl MovementIntegrator {
    pub fn new(config: MovementConfig) -> Self {
        let config = config.validated();
        Self {
            jump: JumpCoordinator::new(config.land_detect_delay),
            config,
            platform: PlatformVelocityTracker::new(),
            vertical_velocity: 0.0,
            grounded: false,
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    pub fn grounded(&self) -> bool {
        self.grounded
    }

    pub fn jump_state(&self) -> JumpCycleState {
        self.jump.state()
    }

    pub fn can_jump_again(&self) -> bool {
        self.jump.can_jump()
    }

    pub fn platform_sample(&self) -> PlatformVelocitySample {
        self.platform.sample()
    }

    /// Builds this tick's displacement and advances vertical/jump/platform state.
    ///
    /// `yaw` orients the move intent: intent y walks along the facing, x strafes right.
    pub fn plan(&mut self, intent: &Intent, yaw: f32, contact: GroundContact, dt: f32) -> MotionPlan {
        let dt = dt.max(0.0);
        let contact = if self.jump.suppresses_ground() {
            GroundContact::airborne()
        } else {
            contact
        };
        let grounded = contact.grounded;
        self.grounded = grounded;

        let landed = self.jump.watch_landing(dt, grounded);

        let speed = self.config.walk_speed
            * if intent.sprint_requested {
                self.config.sprint_multiplier
            } else {
                1.0
            };
        let move_vector = intent.clamped_move();
        let (forward, right) = basis_from_yaw(yaw);
        let direction = (forward * move_vector.y + right * move_vector.x)
            .try_normalize(movement_consts::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        let horizontal = direction * speed * dt;

        let platform_carry = self.platform.update(&contact) * dt;

        if grounded {
            self.vertical_velocity = 0.0;
        } else {
            self.vertical_velocity -= self.config.gravity_magnitude * dt;
        }

        let mut jumped = false;
        if intent.jump_requested && grounded && self.jump.try_begin(grounded) {
            self.vertical_velocity = self.config.jump_speed();
            jumped = true;
        }

        let vertical = Vector3::new(0.0, self.vertical_velocity * dt, 0.0);
        MotionPlan {
            desired: horizontal + platform_carry + vertical,
            horizontal,
            platform_carry,
            new_vertical_velocity: self.vertical_velocity,
            grounded,
            jumped,
            landed,
        }
    }

    /// Reconciles vertical velocity with what the move primitive actually applied.
    /// Rising into a ceiling cancels upward velocity; landing cancels downward velocity.
    pub fn resolve_after_move(&mut self, plan: &MotionPlan, outcome: &MoveOutcome) {
        let mut v = self.vertical_velocity;
        if outcome.grounded && v < 0.0 {
            v = 0.0;
        }
        if v > 0.0 && plan.desired.y > 0.0 && outcome.translation.y + movement_consts::EPSILON < plan.desired.y {
            v = 0.0;
        }
        self.vertical_velocity = v;
    }

    /// Clears all carried motion, e.g. after a teleport.
    pub fn reset(&mut self) {
        self.vertical_velocity = 0.0;
        self.grounded = false;
        self.platform.reset();
        self.jump.reset();
    }
}
