//! Feedback control for the vision-servo chain.

pub mod pid;
pub mod servo;

pub use pid::{Pid, PidGains};
pub use servo::{normalize_angle, CameraServo, ServoInputs};
