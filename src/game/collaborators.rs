//! Boundary traits for the services a locomotion agent consumes but does not own:
//! intent sampling, ground probing, collision-aware movement, and look targets.

use nalgebra::{Point3, Vector2, Vector3};
use serde::Serialize;
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Per-tick intents supplied by an [`InputSource`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Intent {
    /// Strafe (x) and forward (y), each in [-1, 1].
    pub move_vector: Vector2<f32>,
    /// Yaw (x) and pitch (y) look input.
    pub look_vector: Vector2<f32>,
    pub jump_requested: bool,
    pub sprint_requested: bool,
}

impl Intent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(x: f32, y: f32) -> Self {
        Self {
            move_vector: Vector2::new(x, y),
            ..Self::default()
        }
    }

    pub fn with_jump(mut self) -> Self {
        self.jump_requested = true;
        self
    }

    pub fn with_sprint(mut self) -> Self {
        self.sprint_requested = true;
        self
    }

    pub fn with_look(mut self, x: f32, y: f32) -> Self {
        self.look_vector = Vector2::new(x, y);
        self
    }

    /// Move vector with each axis clamped to [-1, 1]; non-finite axes read as zero.
    pub fn clamped_move(&self) -> Vector2<f32> {
        let axis = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        Vector2::new(axis(self.move_vector.x), axis(self.move_vector.y))
    }
}

/// Capability interface for anything that drives an agent: players, AI, cutscene scripts.
pub trait InputSource {
    fn sample(&mut self, dt: f32) -> Intent;
}

/// A surface tagged as movable, with the velocity sampled at probe time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovableSurface {
    pub id: u64,
    pub velocity: Vector3<f32>,
}

/// Result of a ground probe.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GroundContact {
    pub grounded: bool,
    /// Present only when grounded on a tagged movable surface.
    pub surface: Option<MovableSurface>,
}

impl GroundContact {
    pub fn airborne() -> Self {
        Self::default()
    }

    pub fn on_static() -> Self {
        Self {
            grounded: true,
            surface: None,
        }
    }

    pub fn on_platform(surface: MovableSurface) -> Self {
        Self {
            grounded: true,
            surface: Some(surface),
        }
    }
}

/// Ground contact query. Implementations report "no collider responded" as airborne.
pub trait GroundProbe {
    fn probe_ground(&mut self, position: Point3<f32>, radius: f32, skin_width: f32) -> GroundContact;
}

/// What the move primitive actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveOutcome {
    pub translation: Vector3<f32>,
    pub grounded: bool,
}

/// Collision-aware movement of the agent's body, which owns the position.
pub trait MovePrimitive {
    fn position(&self) -> Point3<f32>;
    fn apply_displacement(&mut self, displacement: Vector3<f32>, dt: f32) -> MoveOutcome;
    /// Places the body without collision resolution.
    fn teleport(&mut self, position: Point3<f32>);
}

/// Owner of a trackable look target. Dropping the anchor destroys the target
/// and any [`TargetHandle`] pointing at it stops resolving.
#[derive(Debug)]
pub struct TargetAnchor {
    position: Rc<Cell<Point3<f32>>>,
}

impl TargetAnchor {
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position: Rc::new(Cell::new(position)),
        }
    }

    pub fn position(&self) -> Point3<f32> {
        self.position.get()
    }

    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position.set(position);
    }

    pub fn handle(&self) -> TargetHandle {
        TargetHandle(TargetRef::Tracked(Rc::downgrade(&self.position)))
    }
}

#[derive(Debug, Clone)]
enum TargetRef {
    Tracked(Weak<Cell<Point3<f32>>>),
    Point(Point3<f32>),
}

/// Non-owning reference to a look target.
#[derive(Debug, Clone)]
pub struct TargetHandle(TargetRef);

impl TargetHandle {
    /// A target that never moves and never disappears.
    pub fn point(position: Point3<f32>) -> Self {
        Self(TargetRef::Point(position))
    }

    /// Current target position, or `None` once the anchor has been dropped.
    pub fn resolve(&self) -> Option<Point3<f32>> {
        match &self.0 {
            TargetRef::Tracked(weak) => weak.upgrade().map(|cell| cell.get()),
            TargetRef::Point(p) => Some(*p),
        }
    }
}
