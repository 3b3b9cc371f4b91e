//! Single-axis PID controller.
//!
//! Each controlled axis (heave, sway, surge, heading) owns an independent
//! instance; integral and derivative state persist for the instance's
//! lifetime. Time deltas come from sample timestamps, not wall clock, so a
//! stale feed slows the controller down instead of spiking the derivative.

use crate::config::PidGainsConfig;

/// Gains and saturation for one axis.
#[derive(Clone, Copy, Debug)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Symmetric output saturation
    pub max_output: f32,
}

impl From<PidGainsConfig> for PidGains {
    fn from(cfg: PidGainsConfig) -> Self {
        Self {
            kp: cfg.kp,
            ki: cfg.ki,
            kd: cfg.kd,
            max_output: cfg.max_output,
        }
    }
}

/// Single-axis PID with anti-windup integral clamping.
#[derive(Debug)]
pub struct Pid {
    gains: PidGains,
    integral: f32,
    prev_error: f32,
    prev_stamp: Option<f64>,
}

impl Pid {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            prev_error: 0.0,
            prev_stamp: None,
        }
    }

    /// One controller step toward `setpoint` given the latest `measurement`.
    pub fn update(&mut self, setpoint: f32, measurement: f32, stamp: f64) -> f32 {
        self.update_error(setpoint - measurement, stamp)
    }

    /// One controller step on a precomputed error term.
    ///
    /// Used directly by the heading axis, which wraps its angular error
    /// before the controller sees it.
    pub fn update_error(&mut self, error: f32, stamp: f64) -> f32 {
        let dt = match self.prev_stamp {
            Some(prev) if stamp > prev => (stamp - prev) as f32,
            // First sample, repeated stamp, or clock jump backward:
            // pure-P response, no integral or derivative contribution.
            _ => 0.0,
        };
        self.prev_stamp = Some(stamp);

        let mut derivative = 0.0;
        if dt > 0.0 {
            self.integral += error * dt;
            if self.gains.ki != 0.0 {
                // Bound the integral term so it can never saturate the
                // output on its own.
                let i_max = self.gains.max_output.abs() / self.gains.ki.abs();
                self.integral = self.integral.clamp(-i_max, i_max);
            }
            derivative = (error - self.prev_error) / dt;
        }
        self.prev_error = error;

        let u = self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        u.clamp(-self.gains.max_output, self.gains.max_output)
    }

    /// Clear accumulated state (integral, derivative history).
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.prev_stamp = None;
    }
}
