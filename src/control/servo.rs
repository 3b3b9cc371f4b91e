//! Four-axis camera-servo chain.
//!
//! Converts the latest detection and pose snapshot into one combined
//! force/torque command per tick. Depth hold always runs; the horizontal
//! axes branch on whether a confident detection is in view:
//! - detection in view: sway centers the target in the camera frame, surge
//!   creeps forward, heading holds
//! - no detection: surge cruises, heading steers toward the search bearing,
//!   sway is forced to zero

use crate::config::ServoConfig;
use crate::control::pid::Pid;
use crate::types::{PoseSample, Wrench};

/// Normalize angle to [-π, π]
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle;
    while a > std::f32::consts::PI {
        a -= 2.0 * std::f32::consts::PI;
    }
    while a < -std::f32::consts::PI {
        a += 2.0 * std::f32::consts::PI;
    }
    a
}

/// Detection-side inputs for one servo tick.
#[derive(Clone, Copy, Debug)]
pub struct ServoInputs {
    /// Whether the last search tick saw the target
    pub seen: bool,
    pub pixel_x: f32,
    pub frame_w: f32,
    pub confidence: f32,
}

/// The vision-servo controller: one PID per axis.
pub struct CameraServo {
    config: ServoConfig,
    heave: Pid,
    sway: Pid,
    surge: Pid,
    heading: Pid,
}

impl CameraServo {
    pub fn new(config: ServoConfig) -> Self {
        Self {
            heave: Pid::new(config.heave.into()),
            sway: Pid::new(config.sway.into()),
            surge: Pid::new(config.surge.into()),
            heading: Pid::new(config.heading.into()),
            config,
        }
    }

    /// Compute one combined thrust command.
    ///
    /// `search_bearing` is the fixed heading toward the target area, used
    /// whenever no confident detection is in view.
    pub fn tick(&mut self, inputs: &ServoInputs, pose: &PoseSample, search_bearing: f32) -> Wrench {
        let stamp = pose.stamp;

        // Depth hold runs on every tick regardless of detection state.
        let heave = self.heave.update(self.config.depth_setpoint, pose.z, stamp);

        let aligned = inputs.seen && inputs.confidence >= self.config.confidence_threshold;
        let (surge, sway, heading) = if aligned {
            // Aim right of the frame midline: detector boxes are offset and
            // their raw center is not the target center.
            let aim_px = self.config.center_bias * inputs.frame_w;
            let sway = self.sway.update(aim_px, inputs.pixel_x, stamp);
            let surge = self.surge.update(self.config.align_speed, pose.vx, stamp);
            // Heading hold: setpoint is the current heading itself.
            let heading = self.heading.update_error(0.0, stamp);
            (surge, sway, heading)
        } else {
            let surge = self.surge.update(self.config.search_speed, pose.vx, stamp);
            let heading = self
                .heading
                .update_error(normalize_angle(search_bearing - pose.yaw), stamp);
            (surge, 0.0, heading)
        };

        Wrench {
            force: [surge, sway, heave],
            torque: [0.0, 0.0, heading],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn servo() -> CameraServo {
        CameraServo::new(ServoConfig::default())
    }

    fn pose_at_depth(z: f32) -> PoseSample {
        PoseSample {
            z,
            stamp: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_centered_detection_zero_sway() {
        let mut servo = servo();
        let inputs = ServoInputs {
            seen: true,
            pixel_x: 384.0, // 60% of 640: exactly on the aim point
            frame_w: 640.0,
            confidence: 1.5,
        };
        let wrench = servo.tick(&inputs, &pose_at_depth(-0.5), 0.0);
        assert_abs_diff_eq!(wrench.force[1], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_off_center_detection_drives_sway() {
        let mut servo = servo();
        let inputs = ServoInputs {
            seen: true,
            pixel_x: 100.0, // target left of aim point -> positive sway error
            frame_w: 640.0,
            confidence: 1.5,
        };
        let wrench = servo.tick(&inputs, &pose_at_depth(-0.5), 0.0);
        assert!(wrench.force[1] > 0.0);
    }

    #[test]
    fn test_unseen_branch_zero_sway_and_bearing_steer() {
        let mut servo = servo();
        let inputs = ServoInputs {
            seen: false,
            pixel_x: -1.0,
            frame_w: -1.0,
            confidence: 0.0,
        };
        let bearing = 0.5;
        let wrench = servo.tick(&inputs, &pose_at_depth(-0.5), bearing);

        // Sway forced to exactly zero while sweeping
        assert_eq!(wrench.force[1], 0.0);
        // First heading step is pure P on the bearing error
        let cfg = ServoConfig::default();
        assert_abs_diff_eq!(wrench.torque[2], cfg.heading.kp * bearing, epsilon = 1e-4);
        // Surge tracks the faster search cruise speed
        let expected_surge =
            (cfg.surge.kp * cfg.search_speed).clamp(-cfg.surge.max_output, cfg.surge.max_output);
        assert_abs_diff_eq!(wrench.force[0], expected_surge, epsilon = 1e-4);
    }

    #[test]
    fn test_low_confidence_detection_uses_search_branch() {
        let mut servo = servo();
        let inputs = ServoInputs {
            seen: true,
            pixel_x: 100.0,
            frame_w: 640.0,
            confidence: 0.4, // below the 1.0 threshold
        };
        let wrench = servo.tick(&inputs, &pose_at_depth(-0.5), 0.0);
        assert_eq!(wrench.force[1], 0.0);
    }

    #[test]
    fn test_depth_hold_runs_in_both_branches() {
        let mut servo = servo();
        let unseen = ServoInputs {
            seen: false,
            pixel_x: -1.0,
            frame_w: -1.0,
            confidence: 0.0,
        };
        // Vehicle at the surface, setpoint below: heave pushes down
        let wrench = servo.tick(&unseen, &pose_at_depth(0.0), 0.0);
        assert!(wrench.force[2] < 0.0);
    }

    #[test]
    fn test_normalize_angle_wraps() {
        use std::f32::consts::PI;
        assert_abs_diff_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-5);
        assert_abs_diff_eq!(normalize_angle(-3.0 * PI), -PI, epsilon = 1e-5);
        assert_abs_diff_eq!(normalize_angle(0.3), 0.3, epsilon = 1e-6);
    }
}
