//! Scripted vehicle simulation for running the mission without hardware.
//!
//! One thread plays the whole vehicle side of the interfaces: it publishes
//! pose samples, starts reporting the target after a configured delay,
//! answers navigation goals with `succeeded` after a fixed leg duration,
//! and acknowledges control-mode requests. Enough to drive a full patrol
//! end-to-end from the command line.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::clients::{NavOutcome, NavServerEndpoint};
use crate::config::SimConfig;
use crate::shared::CancelToken;
use crate::types::{DpControlMode, PerceptionSample, PoseSample, Wrench};

/// Simulation update period.
const SIM_TICK: Duration = Duration::from_millis(50);

pub struct SimVehicle {
    config: SimConfig,
    perception_tx: Sender<PerceptionSample>,
    pose_tx: Sender<PoseSample>,
    nav: NavServerEndpoint,
    mode_rx: Receiver<DpControlMode>,
    thrust_rx: Receiver<Wrench>,
    cancel: CancelToken,
    /// Deadline of the navigation goal currently "executing"
    active_goal_done: Option<Instant>,
}

impl SimVehicle {
    /// Spawn the simulated vehicle thread.
    pub fn spawn(
        config: SimConfig,
        perception_tx: Sender<PerceptionSample>,
        pose_tx: Sender<PoseSample>,
        nav: NavServerEndpoint,
        mode_rx: Receiver<DpControlMode>,
        thrust_rx: Receiver<Wrench>,
        cancel: CancelToken,
    ) -> JoinHandle<()> {
        let mut sim = Self {
            config,
            perception_tx,
            pose_tx,
            nav,
            mode_rx,
            thrust_rx,
            cancel,
            active_goal_done: None,
        };
        std::thread::Builder::new()
            .name("sim-vehicle".into())
            .spawn(move || sim.run())
            .expect("Failed to spawn simulation thread")
    }

    fn run(&mut self) {
        tracing::info!(
            "Simulated vehicle running: detection after {:.1}s, {:.1}s per leg",
            self.config.detect_after_secs,
            self.config.leg_secs
        );
        let start = Instant::now();

        while !self.cancel.is_cancelled() {
            let t = start.elapsed().as_secs_f64();

            self.publish_pose(t);
            self.publish_perception(t);
            self.service_navigation();
            self.drain_mode_requests();
            self.drain_thrust();

            std::thread::sleep(SIM_TICK);
        }
        tracing::info!("Simulated vehicle stopped");
    }

    fn publish_pose(&self, t: f64) {
        let _ = self.pose_tx.send(PoseSample {
            x: 0.05 * t as f32,
            y: 0.0,
            z: -0.5,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            vx: 0.05,
            vy: 0.0,
            vz: 0.0,
            stamp: t,
        });
    }

    fn publish_perception(&self, t: f64) {
        let sample = if t >= self.config.detect_after_secs as f64 {
            // Target in view, wandering slightly around the aim point
            let wobble = (t * 2.0).sin() as f32 * 12.0;
            PerceptionSample {
                pixel_x: 0.60 * self.config.frame_w + wobble,
                pixel_y: 0.5 * self.config.frame_h,
                frame_w: self.config.frame_w,
                frame_h: self.config.frame_h,
                confidence: 1.4,
                range: 4.0,
                stamp: t,
            }
        } else {
            PerceptionSample {
                stamp: t,
                ..Default::default()
            }
        };
        let _ = self.perception_tx.send(sample);
    }

    fn service_navigation(&mut self) {
        if let Some(done) = self.active_goal_done {
            if Instant::now() >= done {
                self.active_goal_done = None;
                let _ = self.nav.resp_tx.send(NavOutcome::Succeeded);
                tracing::debug!("Sim: navigation goal succeeded");
            }
            return;
        }

        if let Ok(request) = self.nav.req_rx.try_recv() {
            tracing::debug!("Sim: accepted navigation goal {:?}", request);
            self.active_goal_done =
                Some(Instant::now() + Duration::from_secs_f32(self.config.leg_secs));
        }
    }

    fn drain_mode_requests(&self) {
        while let Ok(mode) = self.mode_rx.try_recv() {
            tracing::info!("Sim: control mode acknowledged: {}", mode.as_str());
        }
    }

    fn drain_thrust(&self) {
        while let Ok(wrench) = self.thrust_rx.try_recv() {
            tracing::trace!(
                "Sim: thrust force=({:.2}, {:.2}, {:.2}) yaw={:.2}",
                wrench.force[0],
                wrench.force[1],
                wrench.force[2],
                wrench.torque[2]
            );
        }
    }
}
