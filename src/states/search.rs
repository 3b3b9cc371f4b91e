//! Time-bounded target search.
//!
//! Polls the perception slot once per sampling period. A valid detection
//! produces `found` and records the detection in the context for the track
//! states; no detection produces `unseen`. Once the accumulated search time
//! exceeds the timeout the leaf reports how the task went overall: `passed`
//! if the target was ever seen, `missed` if it never was.

use std::sync::Arc;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::machine::{ContextKey, MissionContext, Outcome, SearchStatus, State};
use crate::shared::{CancelToken, FeedSet};

pub struct TargetSearch {
    /// Target name, for logs only
    target: String,
    feeds: Arc<FeedSet>,
    search_timeout: Duration,
    sampling_period: Duration,
    /// Accumulated nominal search time. Lives on the instance, not in the
    /// context: it keeps counting across re-entries from the track states
    /// and resets only when a fresh mission is built.
    elapsed: Duration,
    /// What a timeout reports: `missed` until the first detection, `passed`
    /// from then on, even if the target is lost again later.
    task_status: Outcome,
}

impl TargetSearch {
    pub fn new(target: &str, feeds: Arc<FeedSet>, config: &SearchConfig) -> Self {
        Self {
            target: target.to_string(),
            feeds,
            search_timeout: Duration::from_secs_f32(config.search_timeout_secs),
            sampling_period: Duration::from_secs_f32(config.sampling_period_secs),
            elapsed: Duration::ZERO,
            task_status: Outcome::Missed,
        }
    }
}

impl State for TargetSearch {
    fn outcomes(&self) -> &'static [Outcome] {
        &[
            Outcome::Found,
            Outcome::Unseen,
            Outcome::Passed,
            Outcome::Missed,
        ]
    }

    fn writes(&self) -> &'static [ContextKey] {
        &[
            ContextKey::TargetPixelX,
            ContextKey::TargetFrameWidth,
            ContextKey::SearchStatus,
            ContextKey::SearchConfidence,
        ]
    }

    fn execute(&mut self, ctx: &mut MissionContext, cancel: &CancelToken) -> Outcome {
        cancel.pace(self.sampling_period);
        self.elapsed += self.sampling_period;

        if self.elapsed > self.search_timeout {
            tracing::info!(
                "{} search timed out after {:.1}s: {}",
                self.target,
                self.elapsed.as_secs_f32(),
                self.task_status
            );
            return self.task_status;
        }

        let sample = self.feeds.perception.load();
        if sample.is_valid() {
            tracing::info!(
                "{} found at px ({:.0}, {:.0}), confidence {:.2}",
                self.target,
                sample.pixel_x,
                sample.pixel_y,
                sample.confidence
            );
            ctx.pixel_x = sample.pixel_x;
            ctx.frame_w = sample.frame_w;
            ctx.confidence = sample.confidence;
            ctx.status = SearchStatus::Found;
            self.task_status = Outcome::Passed;
            Outcome::Found
        } else {
            tracing::debug!("{} not found", self.target);
            // Last-known values, sentinels included, so the track state
            // sees exactly what the detector last reported
            ctx.pixel_x = sample.pixel_x;
            ctx.frame_w = sample.frame_w;
            ctx.confidence = sample.confidence;
            ctx.status = SearchStatus::Unseen;
            Outcome::Unseen
        }
    }
}
