//! Agent configuration parsing from TOML files.
//!
//! Every field has a default, and out-of-range values are corrected with a
//! warning instead of failing: only unreadable or malformed files are errors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::game::constants::{look, movement, probe, recovery};

/// Locomotion tuning section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Walk speed in meters/second
    pub walk_speed: f32,
    pub sprint_multiplier: f32,
    /// Jump apex height in meters
    pub jump_height: f32,
    /// Downward gravity magnitude in m/s²
    pub gravity_magnitude: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
    /// Seconds after a jump before grounded contact counts as landing
    pub land_detect_delay: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: movement::DEFAULT_WALK_SPEED,
            sprint_multiplier: movement::DEFAULT_SPRINT_MULTIPLIER,
            jump_height: movement::DEFAULT_JUMP_HEIGHT,
            gravity_magnitude: movement::DEFAULT_GRAVITY,
            pitch_min: look::DEFAULT_PITCH_MIN,
            pitch_max: look::DEFAULT_PITCH_MAX,
            land_detect_delay: movement::LAND_DETECT_DELAY,
        }
    }
}

impl MovementConfig {
    /// Returns a copy with invalid values corrected. Each correction is logged.
    pub fn validated(mut self) -> Self {
        if !self.walk_speed.is_finite() || self.walk_speed <= 0.0 {
            tracing::warn!(walk_speed = self.walk_speed, "walk_speed must be > 0, clamping to 0");
            self.walk_speed = 0.0;
        }
        if !self.sprint_multiplier.is_finite() || self.sprint_multiplier < 1.0 {
            tracing::warn!(
                sprint_multiplier = self.sprint_multiplier,
                "sprint_multiplier must be >= 1, using 1"
            );
            self.sprint_multiplier = 1.0;
        }
        if !self.jump_height.is_finite() || self.jump_height <= 0.0 {
            tracing::warn!(jump_height = self.jump_height, "jump_height must be > 0, using default");
            self.jump_height = movement::DEFAULT_JUMP_HEIGHT;
        }
        if !self.gravity_magnitude.is_finite() || self.gravity_magnitude <= 0.0 {
            tracing::warn!(
                gravity_magnitude = self.gravity_magnitude,
                "gravity_magnitude must be > 0, using default"
            );
            self.gravity_magnitude = movement::DEFAULT_GRAVITY;
        }
        if !self.pitch_min.is_finite() || !self.pitch_max.is_finite() {
            tracing::warn!("pitch limits must be finite, using defaults");
            self.pitch_min = look::DEFAULT_PITCH_MIN;
            self.pitch_max = look::DEFAULT_PITCH_MAX;
        }
        if self.pitch_min > self.pitch_max {
            tracing::warn!(
                pitch_min = self.pitch_min,
                pitch_max = self.pitch_max,
                "pitch_min exceeds pitch_max, swapping"
            );
            std::mem::swap(&mut self.pitch_min, &mut self.pitch_max);
        }
        if !self.land_detect_delay.is_finite() || self.land_detect_delay < 0.0 {
            tracing::warn!(
                land_detect_delay = self.land_detect_delay,
                "land_detect_delay must be >= 0, using default"
            );
            self.land_detect_delay = movement::LAND_DETECT_DELAY;
        }
        self
    }

    /// Launch speed that reaches `jump_height` under `gravity_magnitude`.
    pub fn jump_speed(&self) -> f32 {
        (2.0 * self.jump_height * self.gravity_magnitude.abs()).sqrt()
    }
}

/// Orientation defaults section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookConfig {
    pub default_convergence_time: f32,
    /// Degrees/second
    pub default_initial_angular_velocity: f32,
    /// Degrees/second per unit of look input
    pub look_sensitivity: f32,
    /// Look origin height above the agent position
    pub eye_height: f32,
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            default_convergence_time: look::DEFAULT_CONVERGENCE_TIME,
            default_initial_angular_velocity: look::DEFAULT_INITIAL_ANGULAR_VELOCITY,
            look_sensitivity: look::DEFAULT_LOOK_SENSITIVITY,
            eye_height: look::DEFAULT_EYE_HEIGHT,
        }
    }
}

impl LookConfig {
    pub fn validated(mut self) -> Self {
        if !self.default_convergence_time.is_finite() || self.default_convergence_time < 0.0 {
            tracing::warn!(
                default_convergence_time = self.default_convergence_time,
                "default_convergence_time must be >= 0, using 0"
            );
            self.default_convergence_time = 0.0;
        }
        if !self.default_initial_angular_velocity.is_finite() {
            tracing::warn!("default_initial_angular_velocity must be finite, using 0");
            self.default_initial_angular_velocity = 0.0;
        }
        if !self.look_sensitivity.is_finite() {
            tracing::warn!("look_sensitivity must be finite, using default");
            self.look_sensitivity = look::DEFAULT_LOOK_SENSITIVITY;
        }
        if !self.eye_height.is_finite() {
            tracing::warn!("eye_height must be finite, using default");
            self.eye_height = look::DEFAULT_EYE_HEIGHT;
        }
        self
    }
}

/// Ground probe section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub radius: f32,
    pub skin_width: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            radius: probe::DEFAULT_RADIUS,
            skin_width: probe::DEFAULT_SKIN_WIDTH,
        }
    }
}

impl ProbeConfig {
    pub fn validated(mut self) -> Self {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            tracing::warn!(radius = self.radius, "probe radius must be > 0, using default");
            self.radius = probe::DEFAULT_RADIUS;
        }
        if !self.skin_width.is_finite() || self.skin_width < 0.0 {
            tracing::warn!(skin_width = self.skin_width, "probe skin_width must be >= 0, using default");
            self.skin_width = probe::DEFAULT_SKIN_WIDTH;
        }
        self
    }
}

/// Out-of-bounds recovery section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Agents below this height are returned to spawn
    pub floor_y: f32,
    /// Seconds between checks
    pub check_interval: f32,
    /// Defaults to the agent's position at construction
    pub spawn_position: Option<[f32; 3]>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            floor_y: recovery::DEFAULT_FLOOR_Y,
            check_interval: recovery::DEFAULT_CHECK_INTERVAL,
            spawn_position: None,
        }
    }
}

impl RecoveryConfig {
    pub fn validated(mut self) -> Self {
        if !self.check_interval.is_finite() || self.check_interval <= 0.0 {
            tracing::warn!(
                check_interval = self.check_interval,
                "recovery check_interval must be > 0, using default"
            );
            self.check_interval = recovery::DEFAULT_CHECK_INTERVAL;
        }
        if !self.floor_y.is_finite() {
            tracing::warn!("recovery floor_y must be finite, using default");
            self.floor_y = recovery::DEFAULT_FLOOR_Y;
        }
        if let Some(spawn) = self.spawn_position {
            if spawn.iter().any(|c| !c.is_finite()) {
                tracing::warn!("recovery spawn_position must be finite, ignoring");
                self.spawn_position = None;
            }
        }
        self
    }
}

/// Full agent configuration, as read from an agent TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub movement: MovementConfig,
    pub look: LookConfig,
    pub probe: ProbeConfig,
    pub recovery: RecoveryConfig,
}

impl AgentConfig {
    /// Load agent configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Corrects every section. Agents call this on construction.
    pub fn validated(self) -> Self {
        Self {
            movement: self.movement.validated(),
            look: self.look.validated(),
            probe: self.probe.validated(),
            recovery: self.recovery.validated(),
        }
    }
}

/// Errors that can occur when loading agent configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = AgentConfig::from_toml_str("").unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.movement.walk_speed, movement::DEFAULT_WALK_SPEED);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [movement]
            walk_speed = 3.0
            sprint_multiplier = 2.0
            jump_height = 3.0
            gravity_magnitude = 9.81
            pitch_min = -60.0
            pitch_max = 70.0

            [look]
            default_convergence_time = 0.5
            default_initial_angular_velocity = 15.0

            [probe]
            radius = 0.3
            skin_width = 0.05

            [recovery]
            floor_y = -20.0
            check_interval = 2.0
            spawn_position = [0.0, 2.0, 0.0]
        "#;
        let config = AgentConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.movement.walk_speed, 3.0);
        assert_eq!(config.movement.pitch_min, -60.0);
        assert_eq!(config.look.default_initial_angular_velocity, 15.0);
        assert_eq!(config.look.eye_height, look::DEFAULT_EYE_HEIGHT);
        assert_eq!(config.probe.radius, 0.3);
        assert_eq!(config.recovery.spawn_position, Some([0.0, 2.0, 0.0]));
    }

    #[test]
    fn test_validation_corrects_invalid_values() {
        let config = AgentConfig {
            movement: MovementConfig {
                walk_speed: -2.0,
                sprint_multiplier: 0.5,
                jump_height: 0.0,
                gravity_magnitude: -9.81,
                pitch_min: 60.0,
                pitch_max: -60.0,
                land_detect_delay: -1.0,
            },
            look: LookConfig {
                default_convergence_time: -0.5,
                ..LookConfig::default()
            },
            probe: ProbeConfig {
                radius: 0.0,
                skin_width: -1.0,
            },
            recovery: RecoveryConfig {
                check_interval: 0.0,
                ..RecoveryConfig::default()
            },
        }
        .validated();

        assert_eq!(config.movement.walk_speed, 0.0);
        assert_eq!(config.movement.sprint_multiplier, 1.0);
        assert_eq!(config.movement.jump_height, movement::DEFAULT_JUMP_HEIGHT);
        assert_eq!(config.movement.gravity_magnitude, movement::DEFAULT_GRAVITY);
        assert_eq!((config.movement.pitch_min, config.movement.pitch_max), (-60.0, 60.0));
        assert_eq!(config.movement.land_detect_delay, movement::LAND_DETECT_DELAY);
        assert_eq!(config.look.default_convergence_time, 0.0);
        assert_eq!(config.probe.radius, probe::DEFAULT_RADIUS);
        assert_eq!(config.probe.skin_width, probe::DEFAULT_SKIN_WIDTH);
        assert_eq!(config.recovery.check_interval, recovery::DEFAULT_CHECK_INTERVAL);
    }

    #[test]
    fn test_jump_speed() {
        let config = MovementConfig {
            jump_height: 3.0,
            gravity_magnitude: 9.81,
            ..MovementConfig::default()
        };
        assert!((config.jump_speed() - 7.672).abs() < 1e-3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AgentConfig::from_file(Path::new("/nonexistent/agent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
