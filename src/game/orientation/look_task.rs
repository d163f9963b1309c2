use nalgebra::Point3;

use super::super::angle_math::{wrap_to_180, yaw_pitch_from_direction};
use super::super::collaborators::TargetHandle;
use super::LookRequestError;

/// Caller-supplied overrides for a look request. Unset fields fall back to config defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LookOptions {
    /// Approximate seconds to converge; 0 snaps instantly, negative is rejected.
    pub convergence_time: Option<f32>,
    /// Degrees/second seeded into both yaw and pitch velocity.
    pub initial_angular_velocity: Option<f32>,
    /// Seed from the velocity cached by the last `UntilWithinDegrees` look instead.
    pub inherit_velocity: bool,
}

impl LookOptions {
    pub fn with_convergence_time(mut self, seconds: f32) -> Self {
        self.convergence_time = Some(seconds);
        self
    }

    pub fn with_initial_angular_velocity(mut self, degrees_per_second: f32) -> Self {
        self.initial_angular_velocity = Some(degrees_per_second);
        self
    }

    pub fn inheriting_velocity(mut self) -> Self {
        self.inherit_velocity = true;
        self
    }
}

/// Damping parameters resolved from [`LookOptions`] and config defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damping {
    pub convergence_time: f32,
    pub initial_angular_velocity: f32,
    pub inherit_velocity: bool,
}

/// One unit of orientation work with its own termination policy.
#[derive(Debug, Clone)]
pub enum LookTask {
    /// Track the target until stopped or superseded.
    Permanent { target: TargetHandle, damping: Damping },
    /// Track until yaw and pitch are both within `threshold` degrees.
    UntilWithinDegrees {
        target: TargetHandle,
        threshold: f32,
        damping: Damping,
    },
    /// Track for `seconds`.
    ForDuration {
        target: TargetHandle,
        seconds: f32,
        damping: Damping,
    },
    /// Converge within `threshold`, then keep tracking for `seconds` with the carried velocity.
    ThenForDuration {
        target: TargetHandle,
        threshold: f32,
        seconds: f32,
        damping: Damping,
    },
    ToFixedAngleDamped {
        pitch: f32,
        yaw: f32,
        threshold: f32,
        damping: Damping,
    },
    /// Linear interpolation to a fixed angle over `duration` seconds.
    ToFixedAngleTimed { pitch: f32, yaw: f32, duration: f32 },
}

impl LookTask {
    pub fn kind(&self) -> &'static str {
        match self {
            LookTask::Permanent { .. } => "permanent",
            LookTask::UntilWithinDegrees { .. } => "until_within_degrees",
            LookTask::ForDuration { .. } => "for_duration",
            LookTask::ThenForDuration { .. } => "then_for_duration",
            LookTask::ToFixedAngleDamped { .. } => "fixed_angle_damped",
            LookTask::ToFixedAngleTimed { .. } => "fixed_angle_timed",
        }
    }

    pub fn damping(&self) -> Option<Damping> {
        match self {
            LookTask::Permanent { damping, .. }
            | LookTask::UntilWithinDegrees { damping, .. }
            | LookTask::ForDuration { damping, .. }
            | LookTask::ThenForDuration { damping, .. }
            | LookTask::ToFixedAngleDamped { damping, .. } => Some(*damping),
            LookTask::ToFixedAngleTimed { .. } => None,
        }
    }

    pub(super) fn validate(&self) -> Result<(), LookRequestError> {
        if let Some(damping) = self.damping() {
            if damping.convergence_time.is_nan() || damping.convergence_time < 0.0 {
                return Err(LookRequestError::NegativeConvergenceTime(damping.convergence_time));
            }
        }
        match self {
            LookTask::ForDuration { seconds, .. } | LookTask::ThenForDuration { seconds, .. } => {
                if seconds.is_nan() || *seconds < 0.0 {
                    return Err(LookRequestError::NegativeDuration(*seconds));
                }
            }
            LookTask::ToFixedAngleTimed { duration, .. } => {
                if duration.is_nan() || *duration < 0.0 {
                    return Err(LookRequestError::NegativeDuration(*duration));
                }
            }
            _ => {}
        }
        if let LookTask::ToFixedAngleDamped { pitch, yaw, .. } | LookTask::ToFixedAngleTimed { pitch, yaw, .. } =
            self
        {
            if !pitch.is_finite() || !yaw.is_finite() {
                return Err(LookRequestError::NonFiniteAngle);
            }
        }
        Ok(())
    }

    /// Zero convergence time (or zero duration for timed looks) snaps on start.
    pub(super) fn is_instant(&self) -> bool {
        match self {
            LookTask::ToFixedAngleTimed { duration, .. } => *duration == 0.0,
            _ => self
                .damping()
                .map(|d| d.convergence_time == 0.0)
                .unwrap_or(false),
        }
    }

    /// Target (yaw, pitch) for this tick, or `None` when the target no longer resolves.
    /// A target sitting exactly on the look origin keeps the current angles.
    pub(super) fn target_angles(&self, origin: Point3<f32>, current: (f32, f32)) -> Option<(f32, f32)> {
        let target = match self {
            LookTask::ToFixedAngleDamped { pitch, yaw, .. } | LookTask::ToFixedAngleTimed { pitch, yaw, .. } => {
                return Some((wrap_to_180(*yaw), *pitch));
            }
            LookTask::Permanent { target, .. }
            | LookTask::UntilWithinDegrees { target, .. }
            | LookTask::ForDuration { target, .. }
            | LookTask::ThenForDuration { target, .. } => target,
        };
        let position = target.resolve()?;
        Some(yaw_pitch_from_direction(&(position - origin)).unwrap_or(current))
    }
}

/// Sub-phase of a running task. Only the composite look leaves `Converging`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Phase {
    Converging,
    Holding { elapsed: f32 },
}

/// Mutable per-task progress, reset whenever a task starts.
#[derive(Debug, Clone, Copy)]
pub(super) struct TaskRuntime {
    pub elapsed: f32,
    pub yaw_velocity: f32,
    pub pitch_velocity: f32,
    pub start_yaw: f32,
    pub start_pitch: f32,
    pub phase: Phase,
}

impl TaskRuntime {
    pub fn new(start: (f32, f32), velocity: (f32, f32)) -> Self {
        Self {
            elapsed: 0.0,
            yaw_velocity: velocity.0,
            pitch_velocity: velocity.1,
            start_yaw: start.0,
            start_pitch: start.1,
            phase: Phase::Converging,
        }
    }
}
