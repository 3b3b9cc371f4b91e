//! Core data types shared between the mission machine and the control chain.
//!
//! Key types:
//! - [`PerceptionSample`] / [`PoseSample`]: last-write-wins feed snapshots
//! - [`Wrench`]: combined force/torque command published once per control tick
//! - [`TargetLocation`]: named waypoint used as both navigation goal and
//!   alignment reference

use serde::Deserialize;

/// One detection snapshot from the perception feed.
///
/// Pixel coordinates use the camera frame convention: origin top-left,
/// x grows right, y grows down. Negative coordinates are the sentinel for
/// "no detection yet".
#[derive(Clone, Copy, Debug)]
pub struct PerceptionSample {
    /// Detected target center, pixel x (-1.0 until first detection)
    pub pixel_x: f32,
    /// Detected target center, pixel y (-1.0 until first detection)
    pub pixel_y: f32,
    /// Camera frame width in pixels
    pub frame_w: f32,
    /// Camera frame height in pixels
    pub frame_h: f32,
    /// Detector confidence score
    pub confidence: f32,
    /// Estimated range to target (meters)
    pub range: f32,
    /// Sample time in seconds
    pub stamp: f64,
}

impl Default for PerceptionSample {
    fn default() -> Self {
        Self {
            pixel_x: -1.0,
            pixel_y: -1.0,
            frame_w: 0.0,
            frame_h: 0.0,
            confidence: 0.0,
            range: 0.0,
            stamp: 0.0,
        }
    }
}

impl PerceptionSample {
    /// A detection is valid once both pixel coordinates are nonnegative.
    pub fn is_valid(&self) -> bool {
        self.pixel_x >= 0.0 && self.pixel_y >= 0.0
    }
}

/// One vehicle state snapshot from the pose feed.
#[derive(Clone, Copy, Debug, Default)]
pub struct PoseSample {
    /// Position in the odom frame (meters); z is negative below surface
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Orientation as Euler angles (radians)
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    /// Body-frame linear velocity (m/s)
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    /// Sample time in seconds
    pub stamp: f64,
}

/// Combined force/torque command for the thruster manager.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Wrench {
    /// Force: surge (x), sway (y), heave (z), in newtons
    pub force: [f32; 3],
    /// Torque: roll (x), pitch (y), yaw (z), in newton-meters
    pub torque: [f32; 3],
}

impl Wrench {
    /// Zero command, used to stop the vehicle on shutdown.
    pub const ZERO: Wrench = Wrench {
        force: [0.0; 3],
        torque: [0.0; 3],
    };
}

/// Named waypoint from the static target table.
///
/// Serves both as a navigation goal (position + depth) and as the alignment
/// reference TargetTrack steers toward while searching.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct TargetLocation {
    pub x: f32,
    pub y: f32,
    /// Target depth (negative below surface)
    #[serde(default)]
    pub depth: f32,
    /// Approach bearing (radians)
    #[serde(default)]
    pub yaw: f32,
}

/// Dynamic-positioning controller modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DpControlMode {
    OpenLoop,
    PoseHold,
    HeadingHold,
    DepthHeadingHold,
    DepthHold,
    PoseHeadingHold,
}

impl DpControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DpControlMode::OpenLoop => "open-loop",
            DpControlMode::PoseHold => "pose-hold",
            DpControlMode::HeadingHold => "heading-hold",
            DpControlMode::DepthHeadingHold => "depth-heading-hold",
            DpControlMode::DepthHold => "depth-hold",
            DpControlMode::PoseHeadingHold => "pose-heading-hold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_detection_invalid() {
        let sample = PerceptionSample::default();
        assert!(!sample.is_valid());
    }

    #[test]
    fn test_detection_valid() {
        let sample = PerceptionSample {
            pixel_x: 120.0,
            pixel_y: 40.0,
            ..Default::default()
        };
        assert!(sample.is_valid());
    }

    #[test]
    fn test_one_negative_coordinate_invalid() {
        let sample = PerceptionSample {
            pixel_x: 120.0,
            pixel_y: -1.0,
            ..Default::default()
        };
        assert!(!sample.is_valid());
    }
}
