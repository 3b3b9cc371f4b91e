//! Configuration loading for VarunaMission

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{MissionError, Result};
use crate::types::TargetLocation;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct MissionConfig {
    /// Static target-location table ("gate", "pole", "docking")
    pub targets: HashMap<String, TargetLocation>,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub servo: ServoConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

/// Transit-leg and action-client settings
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct NavigationConfig {
    /// Forward speed for path-following transits (m/s)
    #[serde(default = "default_transit_speed")]
    pub transit_speed: f32,

    /// Depth held during transits (meters, negative below surface)
    #[serde(default = "default_search_depth")]
    pub search_depth: f32,

    /// Sphere-of-acceptance radius around a transit goal (meters)
    #[serde(default = "default_acceptance_radius")]
    pub acceptance_radius: f32,

    /// Time to wait for the action server to accept a goal (seconds)
    #[serde(default = "default_server_wait_secs")]
    pub server_wait_secs: f32,

    /// Execution timeout for one navigation goal (seconds)
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: f32,
}

/// Target-search settings
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SearchConfig {
    /// Total time allowed in the search/align loop per target (seconds)
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: f32,

    /// Pacing period between search/track ticks (seconds)
    #[serde(default = "default_sampling_period")]
    pub sampling_period_secs: f32,
}

/// Gains for one PID axis
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PidGainsConfig {
    pub kp: f32,
    #[serde(default)]
    pub ki: f32,
    #[serde(default)]
    pub kd: f32,
    /// Symmetric output saturation (newtons or newton-meters)
    pub max_output: f32,
}

/// Vision-servo chain settings
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ServoConfig {
    /// Depth setpoint held by the heave axis (meters)
    #[serde(default = "default_depth_setpoint")]
    pub depth_setpoint: f32,

    /// Horizontal aim point as a fraction of frame width.
    /// Detector bounding boxes sit off-center, so the aim point is biased
    /// right of the frame midline.
    #[serde(default = "default_center_bias")]
    pub center_bias: f32,

    /// Minimum detector confidence for the visual-servo branch
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Surge setpoint while aligned with the target (m/s)
    #[serde(default = "default_align_speed")]
    pub align_speed: f32,

    /// Surge setpoint while sweeping for the target (m/s)
    #[serde(default = "default_search_speed")]
    pub search_speed: f32,

    #[serde(default = "default_heave_gains")]
    pub heave: PidGainsConfig,
    #[serde(default = "default_sway_gains")]
    pub sway: PidGainsConfig,
    #[serde(default = "default_surge_gains")]
    pub surge: PidGainsConfig,
    #[serde(default = "default_heading_gains")]
    pub heading: PidGainsConfig,
}

/// Process-level settings
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RunnerConfig {
    /// Hold time after an external interrupt before the process exits
    /// (seconds); lets the vehicle coast to rest on zero thrust
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: f32,
}

/// Scripted-simulation settings (only used with `--sim`)
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SimConfig {
    /// Seconds of searching before the simulated detector reports the target
    #[serde(default = "default_detect_after")]
    pub detect_after_secs: f32,

    /// Simulated duration of one navigation leg (seconds)
    #[serde(default = "default_leg_secs")]
    pub leg_secs: f32,

    /// Simulated camera frame width (pixels)
    #[serde(default = "default_frame_w")]
    pub frame_w: f32,

    /// Simulated camera frame height (pixels)
    #[serde(default = "default_frame_h")]
    pub frame_h: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            transit_speed: default_transit_speed(),
            search_depth: default_search_depth(),
            acceptance_radius: default_acceptance_radius(),
            server_wait_secs: default_server_wait_secs(),
            exec_timeout_secs: default_exec_timeout_secs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: default_search_timeout(),
            sampling_period_secs: default_sampling_period(),
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            depth_setpoint: default_depth_setpoint(),
            center_bias: default_center_bias(),
            confidence_threshold: default_confidence_threshold(),
            align_speed: default_align_speed(),
            search_speed: default_search_speed(),
            heave: default_heave_gains(),
            sway: default_sway_gains(),
            surge: default_surge_gains(),
            heading: default_heading_gains(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            detect_after_secs: default_detect_after(),
            leg_secs: default_leg_secs(),
            frame_w: default_frame_w(),
            frame_h: default_frame_h(),
        }
    }
}

// Default value functions
fn default_transit_speed() -> f32 {
    0.3
}
fn default_search_depth() -> f32 {
    -0.5
}
fn default_acceptance_radius() -> f32 {
    0.5
}
fn default_server_wait_secs() -> f32 {
    10.0
}
fn default_exec_timeout_secs() -> f32 {
    90.0
}
fn default_search_timeout() -> f32 {
    30.0
}
fn default_sampling_period() -> f32 {
    0.2
}
fn default_depth_setpoint() -> f32 {
    -0.5
}
fn default_center_bias() -> f32 {
    0.60
}
fn default_confidence_threshold() -> f32 {
    1.0
}
fn default_align_speed() -> f32 {
    0.1
}
fn default_search_speed() -> f32 {
    0.3
}
fn default_heave_gains() -> PidGainsConfig {
    PidGainsConfig {
        kp: 8.0,
        ki: 0.8,
        kd: 2.0,
        max_output: 20.0,
    }
}
fn default_sway_gains() -> PidGainsConfig {
    PidGainsConfig {
        kp: 0.02,
        ki: 0.001,
        kd: 0.005,
        max_output: 10.0,
    }
}
fn default_surge_gains() -> PidGainsConfig {
    PidGainsConfig {
        kp: 40.0,
        ki: 4.0,
        kd: 0.0,
        max_output: 15.0,
    }
}
fn default_heading_gains() -> PidGainsConfig {
    PidGainsConfig {
        kp: 6.0,
        ki: 0.2,
        kd: 1.2,
        max_output: 8.0,
    }
}
fn default_grace_period() -> f32 {
    10.0
}
fn default_detect_after() -> f32 {
    3.0
}
fn default_leg_secs() -> f32 {
    2.0
}
fn default_frame_w() -> f32 {
    640.0
}
fn default_frame_h() -> f32 {
    480.0
}

impl Default for MissionConfig {
    fn default() -> Self {
        // The pool layout of the default mission: gate ahead of the start,
        // pole beyond it, dock back near the origin.
        let mut targets = HashMap::new();
        targets.insert(
            "gate".to_string(),
            TargetLocation {
                x: 14.0,
                y: 2.5,
                depth: -0.5,
                yaw: 0.0,
            },
        );
        targets.insert(
            "pole".to_string(),
            TargetLocation {
                x: 20.0,
                y: -2.0,
                depth: -0.5,
                yaw: 0.0,
            },
        );
        targets.insert(
            "docking".to_string(),
            TargetLocation {
                x: 0.0,
                y: 0.0,
                depth: -0.3,
                yaw: std::f32::consts::PI,
            },
        );

        Self {
            targets,
            navigation: NavigationConfig::default(),
            search: SearchConfig::default(),
            servo: ServoConfig::default(),
            runner: RunnerConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl MissionConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MissionError::Config(format!("Failed to read config file: {}", e)))?;
        let config: MissionConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Look up a named target, failing with a config error if missing.
    pub fn target(&self, name: &str) -> Result<TargetLocation> {
        self.targets
            .get(name)
            .copied()
            .ok_or_else(|| MissionError::Config(format!("Unknown target '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_all_patrol_targets() {
        let config = MissionConfig::default();
        for name in ["gate", "pole", "docking"] {
            assert!(config.target(name).is_ok(), "missing target {}", name);
        }
    }

    #[test]
    fn test_unknown_target_is_config_error() {
        let config = MissionConfig::default();
        assert!(config.target("buoy").is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: MissionConfig = toml::from_str(
            r#"
            [targets.gate]
            x = 10.0
            y = 1.0
            depth = -0.6

            [targets.pole]
            x = 15.0
            y = 0.0

            [targets.docking]
            x = 0.0
            y = 0.0

            [search]
            search_timeout_secs = 12.0
            "#,
        )
        .unwrap();

        assert_eq!(config.search.search_timeout_secs, 12.0);
        // Unspecified sections fall back to defaults
        assert_eq!(config.search.sampling_period_secs, 0.2);
        assert_eq!(config.servo.center_bias, 0.60);
        assert_eq!(config.target("gate").unwrap().depth, -0.6);
        assert_eq!(config.target("pole").unwrap().depth, 0.0);
    }
}
