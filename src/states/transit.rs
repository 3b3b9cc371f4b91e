//! Navigation legs wrapping the action server.
//!
//! The server is an opaque collaborator: a leg blocks on one goal, bounded
//! by the client's server-wait and execution timeouts, and maps the action
//! result straight onto its outcome set. Recovery from `aborted` or
//! `preempted` is the transition table's business.

use std::sync::Arc;

use crate::clients::{NavOutcome, NavigationClient, TransitGoal, WaypointGoal};
use crate::machine::{MissionContext, Outcome, State};
use crate::shared::CancelToken;

fn nav_outcome(result: NavOutcome) -> Outcome {
    match result {
        NavOutcome::Succeeded => Outcome::Succeeded,
        NavOutcome::Aborted => Outcome::Aborted,
        NavOutcome::Preempted => Outcome::Preempted,
    }
}

/// Path-following transit toward a target area.
pub struct TransitLeg {
    /// Target name, for logs only
    target: String,
    goal: TransitGoal,
    nav: Arc<dyn NavigationClient>,
}

impl TransitLeg {
    pub fn new(target: &str, goal: TransitGoal, nav: Arc<dyn NavigationClient>) -> Self {
        Self {
            target: target.to_string(),
            goal,
            nav,
        }
    }
}

impl State for TransitLeg {
    fn outcomes(&self) -> &'static [Outcome] {
        &[Outcome::Succeeded, Outcome::Aborted, Outcome::Preempted]
    }

    fn execute(&mut self, _ctx: &mut MissionContext, cancel: &CancelToken) -> Outcome {
        tracing::info!(
            "Transit toward '{}' at {:.2} m/s, depth {:.2} m",
            self.target,
            self.goal.speed,
            self.goal.depth
        );
        let result = self.nav.transit(&self.goal, cancel);
        tracing::info!("Transit toward '{}': {:?}", self.target, result);
        nav_outcome(result)
    }
}

/// Terminal dynamic-positioning approach to a waypoint.
pub struct WaypointLeg {
    /// Target name, for logs only
    target: String,
    goal: WaypointGoal,
    nav: Arc<dyn NavigationClient>,
}

impl WaypointLeg {
    pub fn new(target: &str, goal: WaypointGoal, nav: Arc<dyn NavigationClient>) -> Self {
        Self {
            target: target.to_string(),
            goal,
            nav,
        }
    }
}

impl State for WaypointLeg {
    fn outcomes(&self) -> &'static [Outcome] {
        &[Outcome::Succeeded, Outcome::Aborted, Outcome::Preempted]
    }

    fn execute(&mut self, _ctx: &mut MissionContext, cancel: &CancelToken) -> Outcome {
        tracing::info!("DP approach to '{}'", self.target);
        let result = self.nav.go_to(&self.goal, cancel);
        tracing::info!("DP approach to '{}': {:?}", self.target, result);
        nav_outcome(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetLocation;

    struct FixedNav(NavOutcome);

    impl NavigationClient for FixedNav {
        fn transit(&self, _goal: &TransitGoal, _cancel: &CancelToken) -> NavOutcome {
            self.0
        }

        fn go_to(&self, _goal: &WaypointGoal, _cancel: &CancelToken) -> NavOutcome {
            self.0
        }
    }

    fn goal() -> TransitGoal {
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
    fn test_nav_results_map_to_outcomes() {
        let mut ctx = MissionContext::default();
        let cancel = CancelToken::new();

        for (result, outcome) in [
            (NavOutcome::Succeeded, Outcome::Succeeded),
            (NavOutcome::Aborted, Outcome::Aborted),
            (NavOutcome::Preempted, Outcome::Preempted),
        ] {
            let mut leg = TransitLeg::new("gate", goal(), Arc::new(FixedNav(result)));
            assert_eq!(leg.execute(&mut ctx, &cancel), outcome);
        }
    }
}
