use serde::Serialize;

/// Where the agent is in its jump cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpCycleState {
    ReadyToJump,
    AirborneCooldown,
}

/// Debounce guarding one jump per grounded cycle.
///
/// A jump moves the cycle to `AirborneCooldown`; grounded contact only counts as
/// a landing once `land_detect_delay` has elapsed, since the probe still sees the
/// floor during the first ticks of a jump.
#[derive(Debug, Clone)]
pub struct JumpCoordinator {
    state: JumpCycleState,
    land_detect_delay: f32,
    /// Seconds since the jump that started the current cycle.
    airborne_time: f32,
}

impl JumpCoordinator {
    pub fn new(land_detect_delay: f32) -> Self {
        Self {
            state: JumpCycleState::ReadyToJump,
            land_detect_delay: land_detect_delay.max(0.0),
            airborne_time: 0.0,
        }
    }

    pub fn state(&self) -> JumpCycleState {
        self.state
    }

    pub fn can_jump(&self) -> bool {
        self.state == JumpCycleState::ReadyToJump
    }

    /// True while a fresh jump should ignore grounded probes.
    pub fn suppresses_ground(&self) -> bool {
        self.state == JumpCycleState::AirborneCooldown && self.airborne_time < self.land_detect_delay
    }

    /// Accepts a jump when ready and grounded. Returns true when the cycle began.
    pub fn try_begin(&mut self, grounded: bool) -> bool {
        if !grounded || self.state != JumpCycleState::ReadyToJump {
            return false;
        }
        self.state = JumpCycleState::AirborneCooldown;
        self.airborne_time = 0.0;
        true
    }

    /// Advances the cooldown watch. Returns true on the tick a landing is detected.
    pub fn watch_landing(&mut self, dt: f32, grounded: bool) -> bool {
        if self.state != JumpCycleState::AirborneCooldown {
            return false;
        }
        self.airborne_time += dt.max(0.0);
        if grounded && self.airborne_time >= self.land_detect_delay {
            self.state = JumpCycleState::ReadyToJump;
            self.airborne_time = 0.0;
            return true;
        }
        false
    }

    /// Abandons any in-flight cycle without signalling a landing.
    pub fn reset(&mut self) {
        self.state = JumpCycleState::ReadyToJump;
        self.airborne_time = 0.0;
    }
}
