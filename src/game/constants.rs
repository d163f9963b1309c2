//! Locomotion and orientation tuning defaults.
//! Centralizing these keeps config defaults and tests in agreement.

/// Movement constants
pub mod movement {
    /// Walk speed in meters/second
    pub const DEFAULT_WALK_SPEED: f32 = 3.0;

    /// Speed multiplier applied while sprint is held
    pub const DEFAULT_SPRINT_MULTIPLIER: f32 = 2.0;

    /// Apex height of a jump in meters
    pub const DEFAULT_JUMP_HEIGHT: f32 = 1.2;

    /// Downward gravity magnitude in m/s²
    pub const DEFAULT_GRAVITY: f32 = 9.81;

    /// Seconds after a jump before grounded contact counts as a landing.
    /// The probe still sees the floor for the first few ticks of a jump.
    pub const LAND_DETECT_DELAY: f32 = 0.2;

    /// Move intent magnitude above which the agent is considered moving
    pub const MOVE_INTENT_EPSILON: f32 = 0.05;

    /// Fixed timestep for the simulation harness (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 1.0e-4;
}

/// Orientation constants (degrees)
pub mod look {
    /// Lowest pitch (looking up)
    pub const DEFAULT_PITCH_MIN: f32 = -80.0;

    /// Highest pitch (looking down)
    pub const DEFAULT_PITCH_MAX: f32 = 80.0;

    /// Approximate seconds for a damped look to converge
    pub const DEFAULT_CONVERGENCE_TIME: f32 = 0.3;

    /// Initial angular velocity for damped looks (degrees/second)
    pub const DEFAULT_INITIAL_ANGULAR_VELOCITY: f32 = 0.0;

    /// Degrees per second per unit of look input
    pub const DEFAULT_LOOK_SENSITIVITY: f32 = 120.0;

    /// Height of the look origin above the agent position
    pub const DEFAULT_EYE_HEIGHT: f32 = 0.7;

    /// Threshold used by fixed-angle looks when the caller does not pass one
    pub const DEFAULT_FIXED_ANGLE_THRESHOLD: f32 = 0.5;

    /// Finished-task outcomes kept for status queries
    pub const FINISHED_TASK_HISTORY: usize = 16;
}

/// Ground probe constants
pub mod probe {
    /// Probe sphere radius
    pub const DEFAULT_RADIUS: f32 = 0.4;

    /// Extra distance below the capsule that still counts as contact
    pub const DEFAULT_SKIN_WIDTH: f32 = 0.08;
}

/// Out-of-bounds recovery constants
pub mod recovery {
    /// Agents below this height are returned to spawn
    pub const DEFAULT_FLOOR_Y: f32 = -50.0;

    /// Seconds between watchdog checks
    pub const DEFAULT_CHECK_INTERVAL: f32 = 3.0;
}

/// Character body constants used by the rapier world
pub mod body {
    /// Character capsule radius
    pub const CHARACTER_RADIUS: f32 = 0.4;

    /// Character capsule total height
    pub const CHARACTER_HEIGHT: f32 = 1.8;

    /// Character controller autostep max height
    pub const AUTOSTEP_MAX_HEIGHT: f32 = 0.3;

    /// Character controller autostep min width
    pub const AUTOSTEP_MIN_WIDTH: f32 = 0.05;

    /// Character controller snap to ground distance
    pub const SNAP_TO_GROUND: f32 = 0.1;

    /// Skin offset kept between the capsule and obstacles
    pub const CONTROLLER_OFFSET: f32 = 0.02;
}
