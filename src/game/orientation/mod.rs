//! Yaw/pitch ownership and the single active look task.
//!
//! The controller is either idle or running exactly one [`LookTask`]. Starting a
//! task cancels the previous one before any of the new task's logic runs, and
//! every termination snaps the angles exactly onto the final target.

mod look_task;

pub use look_task::{Damping, LookOptions, LookTask};

use nalgebra::Point3;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

use super::angle_math::{
    clamp_pitch, close_enough, damped_approach, linear_approach, normalize_to_180, resolve_continuity,
    wrap_to_180,
};
use super::constants::look as look_consts;
use look_task::{Phase, TaskRuntime};

/// Identifier handed out for every accepted look request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LookTaskId(u64);

impl fmt::Display for LookTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "look#{}", self.0)
    }
}

/// How a look task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookOutcome {
    Completed,
    Cancelled,
    TargetLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookStatus {
    Running,
    Finished(LookOutcome),
    /// Never issued, or aged out of the finished history.
    Unknown,
}

/// Reasons a look request is refused. A refused request leaves yaw, pitch and
/// any running task untouched.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LookRequestError {
    #[error("convergence time must be >= 0, got {0}")]
    NegativeConvergenceTime(f32),
    #[error("duration must be >= 0, got {0}")]
    NegativeDuration(f32),
    #[error("fixed look angles must be finite")]
    NonFiniteAngle,
}

#[derive(Debug, Clone)]
struct ActiveLook {
    id: LookTaskId,
    task: LookTask,
    runtime: TaskRuntime,
}

#[derive(Debug, Clone)]
enum ControllerState {
    Idle,
    Running(ActiveLook),
}

/// Result of advancing the active task by one tick.
enum Step {
    Continue,
    Finish(LookOutcome),
}

#[derive(Debug, Clone)]
pub struct OrientationController {
    yaw: f32,
    pitch: f32,
    pitch_min: f32,
    pitch_max: f32,
    state: ControllerState,
    next_id: u64,
    /// Angular velocity left over from the last `UntilWithinDegrees` convergence.
    cached_velocity: Option<(f32, f32)>,
    history: VecDeque<(LookTaskId, LookOutcome)>,
    /// Terminations not yet collected by the owner.
    finished: Vec<(LookTaskId, LookOutcome)>,
}

impl OrientationController {
    /// `pitch_min` must not exceed `pitch_max`; config validation guarantees this.
    pub fn new(yaw: f32, pitch: f32, pitch_min: f32, pitch_max: f32) -> Self {
        Self {
            yaw: wrap_to_180(yaw),
            pitch: clamp_pitch(pitch, pitch_min, pitch_max),
            pitch_min,
            pitch_max,
            state: ControllerState::Idle,
            next_id: 1,
            cached_velocity: None,
            history: VecDeque::with_capacity(look_consts::FINISHED_TASK_HISTORY),
            finished: Vec::new(),
        }
    }

    /// Current (yaw, pitch) in degrees.
    pub fn yaw_pitch(&self) -> (f32, f32) {
        (self.yaw, self.pitch)
    }

    pub fn pitch_limits(&self) -> (f32, f32) {
        (self.pitch_min, self.pitch_max)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ControllerState::Idle)
    }

    pub fn active_task(&self) -> Option<(LookTaskId, &LookTask)> {
        match &self.state {
            ControllerState::Running(active) => Some((active.id, &active.task)),
            ControllerState::Idle => None,
        }
    }

    pub fn cached_velocity(&self) -> Option<(f32, f32)> {
        self.cached_velocity
    }

    pub fn status(&self, id: LookTaskId) -> LookStatus {
        if let ControllerState::Running(active) = &self.state {
            if active.id == id {
                return LookStatus::Running;
            }
        }
        self.history
            .iter()
            .rev()
            .find(|(finished_id, _)| *finished_id == id)
            .map(|(_, outcome)| LookStatus::Finished(*outcome))
            .unwrap_or(LookStatus::Unknown)
    }

    /// Collects terminations since the last call, oldest first.
    pub fn take_finished(&mut self) -> Vec<(LookTaskId, LookOutcome)> {
        std::mem::take(&mut self.finished)
    }

    /// Starts `task`, superseding any running task.
    ///
    /// Instant tasks (zero convergence time or zero duration) resolve their target
    /// against `origin`, snap, and finish before this returns.
    pub fn start(&mut self, task: LookTask, origin: Point3<f32>) -> Result<LookTaskId, LookRequestError> {
        if let Err(e) = task.validate() {
            tracing::warn!(kind = task.kind(), error = %e, "look request rejected");
            return Err(e);
        }

        self.cancel_active();

        let id = LookTaskId(self.next_id);
        self.next_id += 1;

        if task.is_instant() {
            match task.target_angles(origin, (self.yaw, self.pitch)) {
                Some(target) => {
                    self.snap_to(target);
                    self.finish(id, LookOutcome::Completed);
                }
                None => self.finish(id, LookOutcome::TargetLost),
            }
            tracing::debug!(%id, kind = task.kind(), "instant look resolved on start");
            return Ok(id);
        }

        let velocity = match task.damping() {
            Some(damping) if damping.inherit_velocity => self
                .cached_velocity
                .unwrap_or((damping.initial_angular_velocity, damping.initial_angular_velocity)),
            Some(damping) => (damping.initial_angular_velocity, damping.initial_angular_velocity),
            None => (0.0, 0.0),
        };
        tracing::debug!(%id, kind = task.kind(), "look task started");
        self.state = ControllerState::Running(ActiveLook {
            id,
            task,
            runtime: TaskRuntime::new((self.yaw, self.pitch), velocity),
        });
        Ok(id)
    }

    /// Cancels the running task. Returns false (and does nothing) when idle.
    pub fn stop(&mut self) -> bool {
        if self.is_idle() {
            tracing::debug!("stop requested with no active look task");
            return false;
        }
        self.cancel_active();
        true
    }

    /// Applies free-look deltas in degrees. Ignored while a task owns the orientation.
    pub fn apply_look_delta(&mut self, delta_yaw: f32, delta_pitch: f32) -> bool {
        if !self.is_idle() || !delta_yaw.is_finite() || !delta_pitch.is_finite() {
            return false;
        }
        self.yaw = wrap_to_180(self.yaw + delta_yaw);
        self.pitch = clamp_pitch(self.pitch + delta_pitch, self.pitch_min, self.pitch_max);
        true
    }

    /// Forces the orientation, cancelling any running task.
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.cancel_active();
        self.yaw = wrap_to_180(yaw);
        self.pitch = clamp_pitch(pitch, self.pitch_min, self.pitch_max);
    }

    /// Advances the running task by `dt` seconds, looking from `origin`.
    pub fn advance(&mut self, dt: f32, origin: Point3<f32>) {
        let mut active = match std::mem::replace(&mut self.state, ControllerState::Idle) {
            ControllerState::Running(active) => active,
            ControllerState::Idle => return,
        };

        match self.step(&mut active, dt.max(0.0), origin) {
            Step::Continue => self.state = ControllerState::Running(active),
            Step::Finish(outcome) => self.finish(active.id, outcome),
        }
    }

    fn step(&mut self, active: &mut ActiveLook, dt: f32, origin: Point3<f32>) -> Step {
        let Some((target_yaw, raw_target_pitch)) = active.task.target_angles(origin, (self.yaw, self.pitch))
        else {
            tracing::debug!(id = %active.id, "look target no longer resolves");
            return Step::Finish(LookOutcome::TargetLost);
        };
        let target_pitch = clamp_pitch(raw_target_pitch, self.pitch_min, self.pitch_max);
        let rt = &mut active.runtime;
        rt.elapsed += dt;

        if let LookTask::ToFixedAngleTimed { duration, .. } = active.task {
            let pct = rt.elapsed / duration;
            let start_yaw = resolve_continuity(rt.start_yaw, target_yaw);
            self.yaw = normalize_to_180(linear_approach(start_yaw, target_yaw, pct));
            self.pitch = clamp_pitch(
                linear_approach(rt.start_pitch, target_pitch, pct),
                self.pitch_min,
                self.pitch_max,
            );
            if rt.elapsed >= duration {
                self.snap_to((target_yaw, target_pitch));
                return Step::Finish(LookOutcome::Completed);
            }
            return Step::Continue;
        }

        let Some(damping) = active.task.damping() else {
            return Step::Continue;
        };
        let current_yaw = resolve_continuity(self.yaw, target_yaw);
        let next_yaw = damped_approach(
            current_yaw,
            target_yaw,
            &mut rt.yaw_velocity,
            damping.convergence_time,
            dt,
        );
        let next_pitch = damped_approach(
            self.pitch,
            target_pitch,
            &mut rt.pitch_velocity,
            damping.convergence_time,
            dt,
        );
        self.yaw = normalize_to_180(next_yaw);
        self.pitch = clamp_pitch(next_pitch, self.pitch_min, self.pitch_max);

        let within = |threshold: f32, yaw: f32, pitch: f32| {
            close_enough(resolve_continuity(yaw, target_yaw), target_yaw, threshold)
                && close_enough(pitch, target_pitch, threshold)
        };

        let done = match active.task {
            LookTask::Permanent { .. } => false,
            LookTask::UntilWithinDegrees { threshold, .. } => {
                let reached = within(threshold, self.yaw, self.pitch);
                if reached {
                    self.cached_velocity = Some((rt.yaw_velocity, rt.pitch_velocity));
                }
                reached
            }
            LookTask::ForDuration { seconds, .. } => rt.elapsed >= seconds,
            LookTask::ThenForDuration {
                threshold, seconds, ..
            } => match rt.phase {
                Phase::Converging => {
                    if within(threshold, self.yaw, self.pitch) {
                        // The holding phase keeps rt's velocities as its seed.
                        self.cached_velocity = Some((rt.yaw_velocity, rt.pitch_velocity));
                        rt.phase = Phase::Holding { elapsed: 0.0 };
                    }
                    false
                }
                Phase::Holding { elapsed } => {
                    let elapsed = elapsed + dt;
                    rt.phase = Phase::Holding { elapsed };
                    elapsed >= seconds
                }
            },
            LookTask::ToFixedAngleDamped { threshold, .. } => within(threshold, self.yaw, self.pitch),
            LookTask::ToFixedAngleTimed { .. } => false,
        };

        if done {
            self.snap_to((target_yaw, target_pitch));
            Step::Finish(LookOutcome::Completed)
        } else {
            Step::Continue
        }
    }

    fn snap_to(&mut self, (yaw, pitch): (f32, f32)) {
        self.yaw = wrap_to_180(yaw);
        self.pitch = clamp_pitch(pitch, self.pitch_min, self.pitch_max);
    }

    fn cancel_active(&mut self) {
        if let ControllerState::Running(active) = std::mem::replace(&mut self.state, ControllerState::Idle) {
            tracing::debug!(id = %active.id, "look task cancelled");
            self.finish(active.id, LookOutcome::Cancelled);
        }
    }

    fn finish(&mut self, id: LookTaskId, outcome: LookOutcome) {
        self.state = ControllerState::Idle;
        if self.history.len() == look_consts::FINISHED_TASK_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back((id, outcome));
        self.finished.push((id, outcome));
    }
}
