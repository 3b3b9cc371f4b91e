//! One vision-servo control tick per execution.
//!
//! Reads the detection recorded by the search state plus the latest pose,
//! runs the camera-servo chain, and publishes a single thrust command. The
//! leaf always succeeds: losing the target is not a failure here, the
//! transition table just loops back to the search state.

use std::sync::Arc;
use std::time::Duration;

use crate::clients::ThrustSink;
use crate::config::{SearchConfig, ServoConfig};
use crate::control::{CameraServo, ServoInputs};
use crate::machine::{ContextKey, MissionContext, Outcome, SearchStatus, State};
use crate::shared::{CancelToken, FeedSet};
use crate::types::TargetLocation;

pub struct TargetTrack {
    /// Target name, for logs only
    target: String,
    /// Target area steered toward while the detector sees nothing
    area: TargetLocation,
    feeds: Arc<FeedSet>,
    thrust: Arc<dyn ThrustSink>,
    servo: CameraServo,
    sampling_period: Duration,
    /// Bearing toward the target area, fixed on the first tick and never
    /// recomputed afterward.
    search_bearing: Option<f32>,
}

impl TargetTrack {
    pub fn new(
        target: &str,
        area: TargetLocation,
        feeds: Arc<FeedSet>,
        thrust: Arc<dyn ThrustSink>,
        servo_config: ServoConfig,
        search_config: &SearchConfig,
    ) -> Self {
        Self {
            target: target.to_string(),
            area,
            feeds,
            thrust,
            servo: CameraServo::new(servo_config),
            sampling_period: Duration::from_secs_f32(search_config.sampling_period_secs),
            search_bearing: None,
        }
    }

    /// The fixed search bearing, once the first tick has computed it.
    pub fn bearing(&self) -> Option<f32> {
        self.search_bearing
    }
}

impl State for TargetTrack {
    fn outcomes(&self) -> &'static [Outcome] {
        &[Outcome::Succeeded, Outcome::Aborted, Outcome::Preempted]
    }

    fn reads(&self) -> &'static [ContextKey] {
        &[
            ContextKey::TargetPixelX,
            ContextKey::TargetFrameWidth,
            ContextKey::SearchStatus,
            ContextKey::SearchConfidence,
        ]
    }

    fn execute(&mut self, ctx: &mut MissionContext, cancel: &CancelToken) -> Outcome {
        cancel.pace(self.sampling_period);

        let pose = self.feeds.pose.load();

        let bearing = *self.search_bearing.get_or_insert_with(|| {
            let bearing = (self.area.y - pose.y).atan2(self.area.x - pose.x);
            tracing::info!(
                "{}: search bearing fixed at {:.1}°",
                self.target,
                bearing.to_degrees()
            );
            bearing
        });

        let inputs = ServoInputs {
            seen: ctx.status == SearchStatus::Found,
            pixel_x: ctx.pixel_x,
            frame_w: ctx.frame_w,
            confidence: ctx.confidence,
        };

        let wrench = self.servo.tick(&inputs, &pose, bearing);
        self.thrust.publish(&wrench);

        Outcome::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::config::ServoConfig;
    use crate::types::{PoseSample, Wrench};
    use approx::assert_abs_diff_eq;

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<Wrench>>,
    }

    impl ThrustSink for RecordingSink {
        fn publish(&self, wrench: &Wrench) {
            self.published.lock().push(*wrench);
        }
    }

    fn fast_search() -> SearchConfig {
        SearchConfig {
            search_timeout_secs: 30.0,
            sampling_period_secs: 0.001,
        }
    }

    fn gate_area() -> TargetLocation {
        TargetLocation {
            x: 14.0,
            y: 2.5,
            depth: -0.5,
            yaw: 0.0,
        }
    }

    fn track_with_sink() -> (TargetTrack, Arc<RecordingSink>) {
        let feeds = FeedSet::new();
        feeds.pose.store(PoseSample {
            z: -0.5,
            stamp: 1.0,
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::default());
        let track = TargetTrack::new(
            "gate",
            gate_area(),
            feeds,
            sink.clone(),
            ServoConfig::default(),
            &fast_search(),
        );
        (track, sink)
    }

    #[test]
    fn test_centered_detection_near_zero_sway() {
        let (mut track, sink) = track_with_sink();
        let mut ctx = MissionContext {
            pixel_x: 384.0,
            frame_w: 640.0,
            status: SearchStatus::Found,
            confidence: 1.5,
        };

        assert_eq!(
            track.execute(&mut ctx, &CancelToken::new()),
            Outcome::Succeeded
        );
        let wrench = sink.published.lock()[0];
        assert_abs_diff_eq!(wrench.force[1], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_unseen_steers_to_bearing_with_zero_sway() {
        let (mut track, sink) = track_with_sink();
        let mut ctx = MissionContext::default();

        track.execute(&mut ctx, &CancelToken::new());

        let expected_bearing = 2.5f32.atan2(14.0);
        assert_abs_diff_eq!(track.bearing().unwrap(), expected_bearing, epsilon = 1e-6);

        let wrench = sink.published.lock()[0];
        assert_eq!(wrench.force[1], 0.0);
        // First heading step is pure P on the bearing error (yaw = 0)
        let cfg = ServoConfig::default();
        assert_abs_diff_eq!(
            wrench.torque[2],
            cfg.heading.kp * expected_bearing,
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_bearing_never_recomputed() {
        let (mut track, _sink) = track_with_sink();
        let mut ctx = MissionContext::default();

        track.execute(&mut ctx, &CancelToken::new());
        let first = track.bearing().unwrap();

        // Vehicle moves; a recomputed bearing would change
        track.feeds.pose.store(PoseSample {
            x: 7.0,
            y: 5.0,
            z: -0.5,
            stamp: 2.0,
            ..Default::default()
        });
        track.execute(&mut ctx, &CancelToken::new());
        assert_eq!(track.bearing().unwrap(), first);
    }

    #[test]
    fn test_always_succeeds_and_publishes_each_tick() {
        let (mut track, sink) = track_with_sink();
        let mut ctx = MissionContext::default();
        let cancel = CancelToken::new();

        for _ in 0..3 {
            assert_eq!(track.execute(&mut ctx, &cancel), Outcome::Succeeded);
        }
        assert_eq!(sink.published.lock().len(), 3);
    }
}
