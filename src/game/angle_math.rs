//! Degree-based angle helpers shared by every orientation computation.
//!
//! Yaw lives in (-180, 180]. Pitch follows the "positive looks down"
//! convention and is clamped to the configured limits by callers.

use nalgebra::Vector3;

/// Maps an angle in [-360, 360] to (-180, 180] by correcting at most one wrap.
pub fn normalize_to_180(angle: f32) -> f32 {
    if angle > 180.0 {
        angle - 360.0
    } else if angle <= -180.0 {
        angle + 360.0
    } else {
        angle
    }
}

/// Wraps an arbitrary finite angle into (-180, 180].
pub fn wrap_to_180(angle: f32) -> f32 {
    normalize_to_180((angle + 180.0).rem_euclid(360.0) - 180.0)
}

/// Shortest signed rotation from `from` to `to`, in (-180, 180].
pub fn delta_angle(from: f32, to: f32) -> f32 {
    wrap_to_180(to - from)
}

/// Rewrites `current` to its equivalent on the same side of the seam as `target`
/// when the two straddle the -180/180 boundary, so interpolation takes the short way.
///
/// `-179` against a target of `179` becomes `181`; `179` against `-179` becomes `-181`.
pub fn resolve_continuity(current: f32, target: f32) -> f32 {
    let opposite_signs = (current < 0.0 && target > 0.0) || (current > 0.0 && target < 0.0);
    if opposite_signs && current.abs() + target.abs() > 180.0 {
        if current < 0.0 {
            current + 360.0
        } else {
            current - 360.0
        }
    } else {
        current
    }
}

/// Critically damped approach of `current` toward `target` over roughly `smooth_time` seconds.
///
/// `velocity` carries momentum between calls and is updated in place. Callers must
/// reject `smooth_time <= 0` before calling.
pub fn damped_approach(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    debug_assert!(smooth_time > 0.0, "smooth_time must be positive");
    if dt <= 0.0 {
        return current;
    }

    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    // Never overshoot the target.
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}

/// Linear interpolation from `start` to `target` by completion fraction `pct` (clamped to [0, 1]).
pub fn linear_approach(start: f32, target: f32, pct: f32) -> f32 {
    let t = pct.clamp(0.0, 1.0);
    start + (target - start) * t
}

pub fn clamp_pitch(pitch: f32, min: f32, max: f32) -> f32 {
    pitch.max(min).min(max)
}

/// `|a - b| <= |threshold|`
pub fn close_enough(a: f32, b: f32, threshold_degrees: f32) -> bool {
    (a - b).abs() <= threshold_degrees.abs()
}

/// Derives (yaw, pitch) in degrees that face along `direction`.
///
/// Yaw 0 faces +Z and grows toward +X. Pitch is extracted in [0, 360) and
/// folded back to a negative range above 180, so looking up is negative.
/// Returns `None` for a zero-length direction.
pub fn yaw_pitch_from_direction(direction: &Vector3<f32>) -> Option<(f32, f32)> {
    let len = direction.norm();
    if !len.is_finite() || len <= f32::EPSILON {
        return None;
    }
    let d = direction / len;

    let yaw = normalize_to_180(d.x.atan2(d.z).to_degrees());

    let mut pitch = (-d.y).clamp(-1.0, 1.0).asin().to_degrees().rem_euclid(360.0);
    if pitch > 180.0 {
        pitch -= 360.0;
    }
    Some((yaw, pitch))
}

/// Horizontal forward and right unit vectors for a yaw in degrees.
pub fn basis_from_yaw(yaw_degrees: f32) -> (Vector3<f32>, Vector3<f32>) {
    let yaw = yaw_degrees.to_radians();
    let forward = Vector3::new(yaw.sin(), 0.0, yaw.cos());
    let right = Vector3::new(yaw.cos(), 0.0, -yaw.sin());
    (forward, right)
}
