use nalgebra::Vector3;
use serde::Serialize;

use super::collaborators::GroundContact;

/// Velocity contributed by movable ground this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlatformVelocitySample {
    /// Valid only while grounded on a movable surface; zero otherwise.
    pub current: Vector3<f32>,
    /// Retained through the air; zeroed only when grounded on a static surface.
    pub last_touched: Vector3<f32>,
    /// Movable surface currently underfoot.
    pub surface: Option<u64>,
}

/// Tracks and retains moving-platform velocity so momentum carries through jumps.
#[derive(Debug, Clone, Default)]
pub struct PlatformVelocityTracker {
    sample: PlatformVelocitySample,
}

impl PlatformVelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&self) -> PlatformVelocitySample {
        self.sample
    }

    /// Velocity that contributes displacement this tick.
    pub fn carry_velocity(&self) -> Vector3<f32> {
        self.sample.last_touched
    }

    /// Folds this tick's ground contact in and returns the carry velocity.
    pub fn update(&mut self, contact: &GroundContact) -> Vector3<f32> {
        match (contact.grounded, contact.surface) {
            (true, Some(surface)) => {
                self.sample.current = surface.velocity;
                self.sample.last_touched = surface.velocity;
                self.sample.surface = Some(surface.id);
            }
            (true, None) => {
                self.sample = PlatformVelocitySample::default();
            }
            (false, _) => {
                self.sample.current = Vector3::zeros();
                self.sample.surface = None;
            }
        }
        self.sample.last_touched
    }

    pub fn reset(&mut self) {
        self.sample = PlatformVelocitySample::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::collaborators::MovableSurface;

    fn platform(velocity: Vector3<f32>) -> GroundContact {
        GroundContact::on_platform(MovableSurface { id: 7, velocity })
    }

    #[test]
    fn test_carry_retained_while_airborne() {
        let mut tracker = PlatformVelocityTracker::new();
        let v = Vector3::new(2.0, 0.0, 0.0);

        assert_eq!(tracker.update(&platform(v)), v);
        assert_eq!(tracker.sample().current, v);
        assert_eq!(tracker.sample().surface, Some(7));

        assert_eq!(tracker.update(&GroundContact::airborne()), v);
        assert_eq!(tracker.sample().current, Vector3::zeros());
        assert_eq!(tracker.sample().last_touched, v);
    }

    #[test]
    fn test_static_ground_clears_carry() {
        let mut tracker = PlatformVelocityTracker::new();
        tracker.update(&platform(Vector3::new(0.0, 0.0, 3.0)));
        tracker.update(&GroundContact::airborne());
        assert_eq!(tracker.update(&GroundContact::on_static()), Vector3::zeros());
        assert_eq!(tracker.sample(), PlatformVelocitySample::default());
    }

    #[test]
    fn test_new_platform_replaces_carry() {
        let mut tracker = PlatformVelocityTracker::new();
        tracker.update(&platform(Vector3::new(1.0, 0.0, 0.0)));
        let v = Vector3::new(0.0, 0.0, -4.0);
        assert_eq!(tracker.update(&platform(v)), v);
    }
}
