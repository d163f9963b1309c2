//! The public-facing locomotion unit: movement integration plus orientation control
//! over injected collaborators, advanced by one fixed-order tick at a time.

use nalgebra::{Point3, Vector3};
use serde::Serialize;
use thiserror::Error;

use super::collaborators::{GroundProbe, InputSource, Intent, MoveOutcome, MovePrimitive, TargetHandle};
use super::constants::look as look_consts;
use super::constants::movement as movement_consts;
use super::events::{EventBus, EventObserver, LocomotionEvent, Subscription};
use super::humanoid_movement::{MotionPlan, MovementIntegrator};
use super::jump::JumpCycleState;
use super::orientation::{
    Damping, LookOptions, LookRequestError, LookStatus, LookTask, LookTaskId, OrientationController,
};
use super::platform::PlatformVelocitySample;
use super::watchdog::OutOfBoundsWatchdog;
use crate::config::AgentConfig;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),
}

/// Snapshot of an agent after its last tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgentState {
    pub position: Point3<f32>,
    pub vertical_velocity: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub grounded: bool,
    pub can_jump_again: bool,
    pub jump_state: JumpCycleState,
    pub platform: PlatformVelocitySample,
    pub moving: bool,
}

/// Binds collaborators and configuration. Every collaborator is required.
pub struct LocomotionAgentBuilder {
    config: AgentConfig,
    input: Option<Box<dyn InputSource>>,
    probe: Option<Box<dyn GroundProbe>>,
    mover: Option<Box<dyn MovePrimitive>>,
    yaw: f32,
    pitch: f32,
}

impl LocomotionAgentBuilder {
    pub fn input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    pub fn ground_probe(mut self, probe: impl GroundProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    pub fn move_primitive(mut self, mover: impl MovePrimitive + 'static) -> Self {
        self.mover = Some(Box::new(mover));
        self
    }

    /// Initial facing in degrees.
    pub fn facing(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    pub fn build(self) -> Result<LocomotionAgent, AgentError> {
        let input = self.input.ok_or(AgentError::MissingCollaborator("input source"))?;
        let probe = self.probe.ok_or(AgentError::MissingCollaborator("ground probe"))?;
        let mover = self.mover.ok_or(AgentError::MissingCollaborator("move primitive"))?;

        let config = self.config.validated();
        let movement = MovementIntegrator::new(config.movement.clone());
        let orientation = OrientationController::new(
            self.yaw,
            self.pitch,
            config.movement.pitch_min,
            config.movement.pitch_max,
        );
        let watchdog = OutOfBoundsWatchdog::new(&config.recovery, mover.position());

        Ok(LocomotionAgent {
            config,
            input,
            probe,
            mover,
            movement,
            orientation,
            watchdog,
            events: EventBus::new(),
            enabled: true,
            moving: false,
            last_intent: Intent::idle(),
            last_plan: None,
            last_outcome: None,
        })
    }
}

pub struct LocomotionAgent {
    config: AgentConfig,
    input: Box<dyn InputSource>,
    probe: Box<dyn GroundProbe>,
    mover: Box<dyn MovePrimitive>,
    movement: MovementIntegrator,
    orientation: OrientationController,
    watchdog: OutOfBoundsWatchdog,
    events: EventBus,
    enabled: bool,
    moving: bool,
    last_intent: Intent,
    last_plan: Option<MotionPlan>,
    last_outcome: Option<MoveOutcome>,
}

impl LocomotionAgent {
    pub fn builder(config: AgentConfig) -> LocomotionAgentBuilder {
        LocomotionAgentBuilder {
            config,
            input: None,
            probe: None,
            mover: None,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Runs one tick: sample intents, integrate movement, then late-update orientation.
    /// The out-of-bounds watchdog runs last. Disabled agents do nothing.
    pub fn tick(&mut self, dt: f32) {
        if !self.enabled {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        // 1. Intents
        let intent = self.input.sample(dt);
        self.last_intent = intent;

        // 2. Movement
        let position = self.mover.position();
        let contact = self.probe.probe_ground(
            position,
            self.config.probe.radius,
            self.config.probe.skin_width,
        );
        let (yaw, _) = self.orientation.yaw_pitch();
        let plan = self.movement.plan(&intent, yaw, contact, dt);
        let outcome = self.mover.apply_displacement(plan.desired, dt);
        self.movement.resolve_after_move(&plan, &outcome);
        self.last_plan = Some(plan);
        self.last_outcome = Some(outcome);

        // A held jump can land and relaunch on the same tick; the old cycle closes first.
        if plan.landed {
            self.emit(LocomotionEvent::Land);
        }
        if plan.jumped {
            self.emit(LocomotionEvent::Jump);
        }
        self.update_moving(&intent);

        // 3. Orientation
        if self.orientation.is_idle() {
            let sensitivity = self.config.look.look_sensitivity * dt;
            self.orientation
                .apply_look_delta(intent.look_vector.x * sensitivity, -intent.look_vector.y * sensitivity);
        } else {
            let origin = self.look_origin();
            self.orientation.advance(dt, origin);
        }
        self.flush_look_events();

        // Safety net
        if let Some(spawn) = self.watchdog.tick(dt, self.mover.position()) {
            self.teleport(spawn);
        }
    }

    fn update_moving(&mut self, intent: &Intent) {
        let moving = intent.clamped_move().norm() > movement_consts::MOVE_INTENT_EPSILON;
        if moving != self.moving {
            self.moving = moving;
            self.emit(if moving {
                LocomotionEvent::StartMove
            } else {
                LocomotionEvent::StopMove
            });
        }
    }

    // ------------------------------------------------------------------
    // Look operations
    // ------------------------------------------------------------------

    /// Tracks `target` until stopped or superseded.
    pub fn look_at(&mut self, target: TargetHandle, opts: LookOptions) -> Result<LookTaskId, LookRequestError> {
        let damping = self.damping(&opts);
        self.start_look(LookTask::Permanent { target, damping })
    }

    pub fn look_at_until_within_degrees(
        &mut self,
        target: TargetHandle,
        threshold: f32,
        opts: LookOptions,
    ) -> Result<LookTaskId, LookRequestError> {
        let damping = self.damping(&opts);
        self.start_look(LookTask::UntilWithinDegrees {
            target,
            threshold,
            damping,
        })
    }

    pub fn look_toward_for_duration(
        &mut self,
        target: TargetHandle,
        seconds: f32,
        opts: LookOptions,
    ) -> Result<LookTaskId, LookRequestError> {
        let damping = self.damping(&opts);
        self.start_look(LookTask::ForDuration {
            target,
            seconds,
            damping,
        })
    }

    /// Converges within `threshold`, then keeps tracking for `seconds`.
    pub fn look_at_then_for_duration(
        &mut self,
        target: TargetHandle,
        threshold: f32,
        seconds: f32,
        opts: LookOptions,
    ) -> Result<LookTaskId, LookRequestError> {
        let damping = self.damping(&opts);
        self.start_look(LookTask::ThenForDuration {
            target,
            threshold,
            seconds,
            damping,
        })
    }

    pub fn look_at_fixed_angle(&mut self, pitch: f32, yaw: f32, opts: LookOptions) -> Result<LookTaskId, LookRequestError> {
        self.look_at_fixed_angle_within(pitch, yaw, look_consts::DEFAULT_FIXED_ANGLE_THRESHOLD, opts)
    }

    pub fn look_at_fixed_angle_within(
        &mut self,
        pitch: f32,
        yaw: f32,
        threshold: f32,
        opts: LookOptions,
    ) -> Result<LookTaskId, LookRequestError> {
        let damping = self.damping(&opts);
        self.start_look(LookTask::ToFixedAngleDamped {
            pitch,
            yaw,
            threshold,
            damping,
        })
    }

    /// Interpolates linearly to a fixed angle over `duration` seconds.
    pub fn look_at_fixed_angle_timed(
        &mut self,
        pitch: f32,
        yaw: f32,
        duration: f32,
    ) -> Result<LookTaskId, LookRequestError> {
        self.start_look(LookTask::ToFixedAngleTimed { pitch, yaw, duration })
    }

    /// Cancels the active look. A no-op (returning false) when nothing is running.
    pub fn stop_looking(&mut self) -> bool {
        let stopped = self.orientation.stop();
        self.flush_look_events();
        stopped
    }

    /// Current (yaw, pitch) in degrees.
    pub fn current_yaw_pitch(&self) -> (f32, f32) {
        self.orientation.yaw_pitch()
    }

    pub fn look_status(&self, id: LookTaskId) -> LookStatus {
        self.orientation.status(id)
    }

    pub fn orientation(&self) -> &OrientationController {
        &self.orientation
    }

    fn damping(&self, opts: &LookOptions) -> Damping {
        Damping {
            convergence_time: opts
                .convergence_time
                .unwrap_or(self.config.look.default_convergence_time),
            initial_angular_velocity: opts
                .initial_angular_velocity
                .unwrap_or(self.config.look.default_initial_angular_velocity),
            inherit_velocity: opts.inherit_velocity,
        }
    }

    fn start_look(&mut self, task: LookTask) -> Result<LookTaskId, LookRequestError> {
        let origin = self.look_origin();
        let id = self.orientation.start(task, origin)?;
        self.flush_look_events();
        Ok(id)
    }

    /// Delivers look terminations. While disabled they stay queued until `enable`.
    fn flush_look_events(&mut self) {
        if !self.enabled {
            return;
        }
        for (task, outcome) in self.orientation.take_finished() {
            self.emit(LocomotionEvent::LookFinished { task, outcome });
        }
    }

    // ------------------------------------------------------------------
    // Observers and lifecycle
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, observer: impl EventObserver + 'static) -> Subscription {
        self.events.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.events.unsubscribe(subscription)
    }

    /// Resumes ticking and event delivery, then delivers look terminations held while disabled.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.flush_look_events();
    }

    /// Suspends ticking and event delivery. Subscriptions are kept.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn emit(&mut self, event: LocomotionEvent) {
        if self.enabled {
            self.events.emit(&event);
        }
    }

    // ------------------------------------------------------------------
    // Body
    // ------------------------------------------------------------------

    pub fn position(&self) -> Point3<f32> {
        self.mover.position()
    }

    pub fn look_origin(&self) -> Point3<f32> {
        self.mover.position() + Vector3::y() * self.config.look.eye_height
    }

    /// Moves the body without collision and clears vertical velocity, platform carry
    /// and any in-flight jump cycle.
    pub fn teleport(&mut self, position: Point3<f32>) {
        self.mover.teleport(position);
        self.movement.reset();
    }

    pub fn watchdog(&self) -> &OutOfBoundsWatchdog {
        &self.watchdog
    }

    pub fn set_spawn(&mut self, spawn: Point3<f32>) {
        self.watchdog.set_spawn(spawn);
    }

    pub fn last_intent(&self) -> Intent {
        self.last_intent
    }

    pub fn last_plan(&self) -> Option<&MotionPlan> {
        self.last_plan.as_ref()
    }

    pub fn last_move_outcome(&self) -> Option<&MoveOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn state(&self) -> AgentState {
        let (yaw, pitch) = self.orientation.yaw_pitch();
        AgentState {
            position: self.mover.position(),
            vertical_velocity: self.movement.vertical_velocity(),
            yaw,
            pitch,
            grounded: self.movement.grounded(),
            can_jump_again: self.movement.can_jump_again(),
            jump_state: self.movement.jump_state(),
            platform: self.movement.platform_sample(),
            moving: self.moving,
        }
    }
}
