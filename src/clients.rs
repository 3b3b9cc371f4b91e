//! Clients for the mission's external collaborators.
//!
//! The transport behind each collaborator is out of scope; the mission sees
//! traits, and the process wires channel-backed implementations to whatever
//! sits on the other side (vehicle bridge or the scripted simulation):
//! - [`NavigationClient`]: blocking action calls bounded by a server-wait
//!   timeout and an execution timeout
//! - [`ControlModeClient`]: fire-and-forget DP mode changes
//! - [`ThrustSink`]: per-tick force/torque publication

use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use thiserror::Error;

use crate::shared::CancelToken;
use crate::types::{DpControlMode, TargetLocation, Wrench};

/// Terminal result of one navigation action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavOutcome {
    Succeeded,
    Aborted,
    Preempted,
}

/// Path-following transit goal: drive toward a target area at a set speed
/// and depth, done when inside the acceptance sphere.
#[derive(Clone, Copy, Debug)]
pub struct TransitGoal {
    pub target: TargetLocation,
    pub speed: f32,
    pub depth: f32,
    pub acceptance_radius: f32,
}

/// Dynamic-positioning waypoint goal for the terminal docking approach.
#[derive(Clone, Copy, Debug)]
pub struct WaypointGoal {
    pub target: TargetLocation,
}

/// Request sent to the navigation action server.
#[derive(Clone, Copy, Debug)]
pub enum NavRequest {
    Transit(TransitGoal),
    Waypoint(WaypointGoal),
}

/// Blocking navigation action interface.
///
/// Implementations must return within the configured timeouts; the mission
/// machine never retries internally (retries are transition-table cycles).
pub trait NavigationClient: Send + Sync {
    fn transit(&self, goal: &TransitGoal, cancel: &CancelToken) -> NavOutcome;
    fn go_to(&self, goal: &WaypointGoal, cancel: &CancelToken) -> NavOutcome;
}

/// Fire-and-forget DP control-mode service.
pub trait ControlModeClient: Send + Sync {
    fn set_mode(&self, mode: DpControlMode) -> Result<(), ModeSendError>;
}

/// Per-tick thrust command sink.
pub trait ThrustSink: Send + Sync {
    fn publish(&self, wrench: &Wrench);
}

/// The control-mode service endpoint is gone (process shutting down or the
/// service crashed). The requesting state logs this and carries on.
#[derive(Clone, Copy, Debug, Error)]
#[error("control mode service unavailable")]
pub struct ModeSendError;

/// Poll granularity while waiting for an action result.
const RESULT_POLL: Duration = Duration::from_millis(50);

/// Channel-backed navigation action client.
///
/// Goal handoff uses a rendezvous channel, so `send_timeout` doubles as the
/// wait-for-server phase; the result wait is bounded by the execution
/// timeout and interruptible through the cancel token.
#[derive(Clone)]
pub struct ChannelNavClient {
    req_tx: Sender<NavRequest>,
    resp_rx: Receiver<NavOutcome>,
    server_wait: Duration,
    exec_timeout: Duration,
}

/// Server-side endpoints for [`ChannelNavClient`].
pub struct NavServerEndpoint {
    pub req_rx: Receiver<NavRequest>,
    pub resp_tx: Sender<NavOutcome>,
}

/// Create a connected navigation client/server pair.
pub fn nav_channel(
    server_wait: Duration,
    exec_timeout: Duration,
) -> (ChannelNavClient, NavServerEndpoint) {
    let (req_tx, req_rx) = bounded(0);
    let (resp_tx, resp_rx) = unbounded();
    (
        ChannelNavClient {
            req_tx,
            resp_rx,
            server_wait,
            exec_timeout,
        },
        NavServerEndpoint { req_rx, resp_tx },
    )
}

impl ChannelNavClient {
    fn execute(&self, request: NavRequest, cancel: &CancelToken) -> NavOutcome {
        // A goal that timed out earlier may still produce a late response;
        // drop anything stale before issuing a new goal.
        while self.resp_rx.try_recv().is_ok() {}

        if self.req_tx.send_timeout(request, self.server_wait).is_err() {
            tracing::warn!(
                "Navigation server did not accept goal within {:?}",
                self.server_wait
            );
            return NavOutcome::Aborted;
        }

        let deadline = Instant::now() + self.exec_timeout;
        loop {
            if cancel.is_cancelled() {
                return NavOutcome::Preempted;
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    "Navigation goal timed out after {:?}, treating as aborted",
                    self.exec_timeout
                );
                return NavOutcome::Aborted;
            }
            match self.resp_rx.recv_timeout(RESULT_POLL.min(deadline - now)) {
                Ok(outcome) => return outcome,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("Navigation server disconnected mid-goal");
                    return NavOutcome::Aborted;
                }
            }
        }
    }
}

impl NavigationClient for ChannelNavClient {
    fn transit(&self, goal: &TransitGoal, cancel: &CancelToken) -> NavOutcome {
        self.execute(NavRequest::Transit(*goal), cancel)
    }

    fn go_to(&self, goal: &WaypointGoal, cancel: &CancelToken) -> NavOutcome {
        self.execute(NavRequest::Waypoint(*goal), cancel)
    }
}

/// Channel-backed control-mode client.
#[derive(Clone)]
pub struct ChannelModeClient {
    tx: Sender<DpControlMode>,
}

/// Create a connected mode client plus the service-side receiver.
pub fn mode_channel() -> (ChannelModeClient, Receiver<DpControlMode>) {
    let (tx, rx) = unbounded();
    (ChannelModeClient { tx }, rx)
}

impl ControlModeClient for ChannelModeClient {
    fn set_mode(&self, mode: DpControlMode) -> Result<(), ModeSendError> {
        self.tx.send(mode).map_err(|_| ModeSendError)
    }
}

impl ThrustSink for Sender<Wrench> {
    fn publish(&self, wrench: &Wrench) {
        // Drop-on-full: the consumer always wants the freshest command, and
        // the control loop must never block on a slow sink.
        let _ = self.try_send(*wrench);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_goal() -> TransitGoal {
        TransitGoal {
            target: TargetLocation {
                x: 14.0,
                y: 2.5,
                depth: -0.5,
                yaw: 0.0,
            },
            speed: 0.3,
            depth: -0.5,
            acceptance_radius: 0.5,
        }
    }

    #[test]
    fn test_no_server_aborts_after_wait() {
        let (client, _endpoint) =
            nav_channel(Duration::from_millis(20), Duration::from_millis(100));
        // Endpoint held but never serviced: the rendezvous send times out.
        let outcome = client.transit(&gate_goal(), &CancelToken::new());
        assert_eq!(outcome, NavOutcome::Aborted);
    }

    #[test]
    fn test_exec_timeout_aborts() {
        let (client, endpoint) =
            nav_channel(Duration::from_millis(100), Duration::from_millis(50));
        let handle = std::thread::spawn(move || {
            // Accept the goal but never answer.
            let _goal = endpoint.req_rx.recv().unwrap();
            std::thread::sleep(Duration::from_millis(200));
        });
        let outcome = client.transit(&gate_goal(), &CancelToken::new());
        assert_eq!(outcome, NavOutcome::Aborted);
        handle.join().unwrap();
    }

    #[test]
    fn test_server_result_forwarded() {
        let (client, endpoint) = nav_channel(Duration::from_secs(1), Duration::from_secs(1));
        let handle = std::thread::spawn(move || {
            let _goal = endpoint.req_rx.recv().unwrap();
            endpoint.resp_tx.send(NavOutcome::Succeeded).unwrap();
        });
        let outcome = client.transit(&gate_goal(), &CancelToken::new());
        assert_eq!(outcome, NavOutcome::Succeeded);
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_preempts_result_wait() {
        let (client, endpoint) = nav_channel(Duration::from_secs(1), Duration::from_secs(10));
        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        let handle = std::thread::spawn(move || {
            let _goal = endpoint.req_rx.recv().unwrap();
            canceller.cancel();
            // Hold the endpoint open so disconnect doesn't race the cancel.
            std::thread::sleep(Duration::from_millis(200));
        });
        let outcome = client.transit(&gate_goal(), &cancel);
        assert_eq!(outcome, NavOutcome::Preempted);
        handle.join().unwrap();
    }

    #[test]
    fn test_mode_client_delivers() {
        let (client, rx) = mode_channel();
        client.set_mode(DpControlMode::PoseHeadingHold).unwrap();
        assert_eq!(rx.recv().unwrap(), DpControlMode::PoseHeadingHold);
    }
}
