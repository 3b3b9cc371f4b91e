//! Process wiring: feed-adapter threads and the mission entry point.
//!
//! The feed adapters bridge the asynchronous perception/pose transport onto
//! the single-slot sample cells; the control thread never blocks on a feed.
//! `run_mission` drives the executor on the calling thread and guarantees a
//! zero thrust command on the way out, whatever the outcome.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::clients::ThrustSink;
use crate::config::MissionConfig;
use crate::error::Result;
use crate::machine::Outcome;
use crate::patrol::{Collaborators, MissionExecutor};
use crate::shared::{CancelToken, FeedSet, SampleSlot};
use crate::types::{PerceptionSample, PoseSample, Wrench};

/// How long a feed adapter sleeps in recv before re-checking cancellation.
const FEED_POLL: Duration = Duration::from_millis(100);

fn feed_loop<T: Copy + Send + 'static>(
    rx: Receiver<T>,
    slot: &SampleSlot<T>,
    cancel: &CancelToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        match rx.recv_timeout(FEED_POLL) {
            Ok(sample) => slot.store(sample),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("Feed closed, adapter exiting");
                break;
            }
        }
    }
}

/// Spawn the perception and pose feed adapters.
pub fn spawn_feed_threads(
    feeds: Arc<FeedSet>,
    perception_rx: Receiver<PerceptionSample>,
    pose_rx: Receiver<PoseSample>,
    cancel: CancelToken,
) -> Vec<JoinHandle<()>> {
    let perception_feeds = Arc::clone(&feeds);
    let perception_cancel = cancel.clone();
    let perception = std::thread::Builder::new()
        .name("perception-feed".into())
        .spawn(move || feed_loop(perception_rx, &perception_feeds.perception, &perception_cancel))
        .expect("Failed to spawn perception feed thread");

    let pose = std::thread::Builder::new()
        .name("pose-feed".into())
        .spawn(move || feed_loop(pose_rx, &feeds.pose, &cancel))
        .expect("Failed to spawn pose feed thread");

    vec![perception, pose]
}

/// Run one mission to a terminal outcome.
///
/// The entry point of the whole system: builds the executor from the static
/// target table and drives it on the calling thread. The thrust sink always
/// receives a final zero command, including on the fatal-defect path.
pub fn run_mission(
    config: &MissionConfig,
    collab: Collaborators,
    cancel: CancelToken,
) -> Result<Outcome> {
    let thrust = Arc::clone(&collab.thrust);
    let mut executor = MissionExecutor::new(config, collab, cancel)?;
    let result = executor.run();
    thrust.publish(&Wrench::ZERO);
    result
}
