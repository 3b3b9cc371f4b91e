//! Pool-patrol mission assembly.
//!
//! Builds the full hierarchical machine from the static target table:
//! transit to the gate, run the search/align composite until the gate is
//! passed or missed, drop to open loop for the pole transit, and finish
//! with the docking composite. Every navigation failure routes to docking;
//! the docking composite's exit labels terminate the patrol.

use std::sync::Arc;

use crate::clients::{ControlModeClient, NavigationClient, ThrustSink, TransitGoal, WaypointGoal};
use crate::config::MissionConfig;
use crate::error::{MissionError, Result};
use crate::machine::{
    MachineBuilder, MissionContext, MissionState, Outcome, StateMachine, Transition,
};
use crate::shared::{CancelToken, FeedSet};
use crate::states::{ControlModeSwitch, TargetSearch, TargetTrack, TransitLeg, WaypointLeg};
use crate::types::DpControlMode;

/// Handles to the external collaborators one mission needs.
pub struct Collaborators {
    pub feeds: Arc<FeedSet>,
    pub nav: Arc<dyn NavigationClient>,
    pub mode: Arc<dyn ControlModeClient>,
    pub thrust: Arc<dyn ThrustSink>,
}

impl Clone for Collaborators {
    fn clone(&self) -> Self {
        Self {
            feeds: Arc::clone(&self.feeds),
            nav: Arc::clone(&self.nav),
            mode: Arc::clone(&self.mode),
            thrust: Arc::clone(&self.thrust),
        }
    }
}

fn transit_goal(config: &MissionConfig, target: &str) -> Result<TransitGoal> {
    Ok(TransitGoal {
        target: config.target(target)?,
        speed: config.navigation.transit_speed,
        depth: config.navigation.search_depth,
        acceptance_radius: config.navigation.acceptance_radius,
    })
}

/// Search/align composite for one target area.
///
/// Scanning loops through the two track states (camera centering after a
/// detection, broaden-search steering after a miss) until the search leaf
/// converts its timeout into a terminal `passed` or `missed`.
pub fn search_align_machine(
    target: &str,
    config: &MissionConfig,
    collab: &Collaborators,
) -> Result<StateMachine> {
    let area = config.target(target)?;

    let track = || {
        TargetTrack::new(
            target,
            area,
            Arc::clone(&collab.feeds),
            Arc::clone(&collab.thrust),
            config.servo,
            &config.search,
        )
    };

    let machine = MachineBuilder::new(&format!("{}_tasks", target), "SCANNING_OBJECTS")
        .state(
            "SCANNING_OBJECTS",
            MissionState::Search(TargetSearch::new(
                target,
                Arc::clone(&collab.feeds),
                &config.search,
            )),
            &[
                (Outcome::Found, Transition::To("CAMERA_CENTERING")),
                (Outcome::Unseen, Transition::To("BROADEN_SEARCH")),
                (Outcome::Passed, Transition::Exit(Outcome::Passed)),
                (Outcome::Missed, Transition::Exit(Outcome::Missed)),
            ],
        )
        .state(
            "CAMERA_CENTERING",
            MissionState::Track(track()),
            &[
                (Outcome::Succeeded, Transition::To("SCANNING_OBJECTS")),
                (Outcome::Aborted, Transition::Exit(Outcome::Aborted)),
                (Outcome::Preempted, Transition::Exit(Outcome::Preempted)),
            ],
        )
        .state(
            "BROADEN_SEARCH",
            MissionState::Track(track()),
            &[
                (Outcome::Succeeded, Transition::To("SCANNING_OBJECTS")),
                (Outcome::Aborted, Transition::Exit(Outcome::Aborted)),
                (Outcome::Preempted, Transition::Exit(Outcome::Preempted)),
            ],
        )
        .build()?;

    Ok(machine)
}

/// Docking composite: return transit, DP mode switch, terminal approach.
///
/// A preempted return transit retries the leg; everything else exits with
/// the corresponding label.
pub fn docking_machine(config: &MissionConfig, collab: &Collaborators) -> Result<StateMachine> {
    let machine = MachineBuilder::new("docking", "RETURN_TO_DOCK")
        .state(
            "RETURN_TO_DOCK",
            MissionState::Transit(TransitLeg::new(
                "docking",
                transit_goal(config, "docking")?,
                Arc::clone(&collab.nav),
            )),
            &[
                (Outcome::Succeeded, Transition::To("DOCKING_SECTOR")),
                (Outcome::Aborted, Transition::Exit(Outcome::Aborted)),
                (Outcome::Preempted, Transition::To("RETURN_TO_DOCK")),
            ],
        )
        .state(
            "DOCKING_SECTOR",
            MissionState::ModeSwitch(ControlModeSwitch::new(
                DpControlMode::PoseHeadingHold,
                Arc::clone(&collab.mode),
            )),
            &[
                (Outcome::Succeeded, Transition::To("DOCKING_PROCEDURE")),
                (Outcome::Aborted, Transition::Exit(Outcome::Aborted)),
                (Outcome::Preempted, Transition::Exit(Outcome::Preempted)),
            ],
        )
        .state(
            "DOCKING_PROCEDURE",
            MissionState::Waypoint(WaypointLeg::new(
                "docking",
                WaypointGoal {
                    target: config.target("docking")?,
                },
                Arc::clone(&collab.nav),
            )),
            &[
                (Outcome::Succeeded, Transition::Exit(Outcome::Succeeded)),
                (Outcome::Aborted, Transition::Exit(Outcome::Aborted)),
                (Outcome::Preempted, Transition::Exit(Outcome::Preempted)),
            ],
        )
        .build()?;

    Ok(machine)
}

/// The full pool-patrol machine.
pub fn pool_patrol_machine(config: &MissionConfig, collab: &Collaborators) -> Result<StateMachine> {
    let to_docking = |outcome| (outcome, Transition::To("DOCKING"));

    let machine = MachineBuilder::new("pool_patrol", "TRANSIT_TO_GATE")
        .state(
            "TRANSIT_TO_GATE",
            MissionState::Transit(TransitLeg::new(
                "gate",
                transit_goal(config, "gate")?,
                Arc::clone(&collab.nav),
            )),
            &[
                (Outcome::Succeeded, Transition::To("GATE_SEARCH")),
                to_docking(Outcome::Aborted),
                to_docking(Outcome::Preempted),
            ],
        )
        .state(
            "GATE_SEARCH",
            MissionState::Machine(search_align_machine("gate", config, collab)?),
            &[
                (Outcome::Passed, Transition::To("GATE_PASSED")),
                to_docking(Outcome::Missed),
                to_docking(Outcome::Aborted),
                to_docking(Outcome::Preempted),
            ],
        )
        .state(
            "GATE_PASSED",
            MissionState::ModeSwitch(ControlModeSwitch::new(
                DpControlMode::OpenLoop,
                Arc::clone(&collab.mode),
            )),
            &[
                (Outcome::Succeeded, Transition::To("TRANSIT_TO_POLE")),
                to_docking(Outcome::Aborted),
                to_docking(Outcome::Preempted),
            ],
        )
        .state(
            "TRANSIT_TO_POLE",
            MissionState::Transit(TransitLeg::new(
                "pole",
                transit_goal(config, "pole")?,
                Arc::clone(&collab.nav),
            )),
            &[
                to_docking(Outcome::Succeeded),
                to_docking(Outcome::Aborted),
                to_docking(Outcome::Preempted),
            ],
        )
        .state(
            "DOCKING",
            MissionState::Machine(docking_machine(config, collab)?),
            &[
                (Outcome::Succeeded, Transition::Exit(Outcome::Succeeded)),
                (Outcome::Aborted, Transition::Exit(Outcome::Aborted)),
                (Outcome::Preempted, Transition::Exit(Outcome::Preempted)),
            ],
        )
        .build()?;

    Ok(machine)
}

/// Top-level mission driver.
///
/// Owns the patrol machine, the shared context, and a second docking
/// machine held in reserve: a contract violation anywhere in the patrol is
/// the one fatal error class, and the vehicle is sent down the safe docking
/// path before the defect propagates to the caller.
pub struct MissionExecutor {
    patrol: StateMachine,
    safe_path: StateMachine,
    context: MissionContext,
    cancel: CancelToken,
}

impl MissionExecutor {
    pub fn new(
        config: &MissionConfig,
        collab: Collaborators,
        cancel: CancelToken,
    ) -> Result<Self> {
        Ok(Self {
            patrol: pool_patrol_machine(config, &collab)?,
            safe_path: docking_machine(config, &collab)?,
            context: MissionContext::default(),
            cancel,
        })
    }

    /// Run the patrol to a terminal outcome.
    pub fn run(&mut self) -> Result<Outcome> {
        tracing::info!("Pool patrol starting");
        match self.patrol.run(&mut self.context, &self.cancel) {
            Ok(outcome) => {
                tracing::info!("Pool patrol finished: {}", outcome);
                Ok(outcome)
            }
            Err(defect) => {
                tracing::error!("Mission defect: {}; diverting to docking", defect);
                match self.safe_path.run(&mut self.context, &self.cancel) {
                    Ok(outcome) => tracing::warn!("Safe docking path finished: {}", outcome),
                    Err(e) => tracing::error!("Safe docking path also failed: {}", e),
                }
                Err(MissionError::ContractViolation(defect))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::clients::{ModeSendError, NavOutcome};
    use crate::types::{DpControlMode, Wrench};

    struct AckMode;

    impl ControlModeClient for AckMode {
        fn set_mode(&self, _mode: DpControlMode) -> std::result::Result<(), ModeSendError> {
            Ok(())
        }
    }

    struct NullSink;

    impl ThrustSink for NullSink {
        fn publish(&self, _wrench: &Wrench) {}
    }

    struct AlwaysSucceed;

    impl NavigationClient for AlwaysSucceed {
        fn transit(&self, _goal: &TransitGoal, _cancel: &CancelToken) -> NavOutcome {
            NavOutcome::Succeeded
        }

        fn go_to(&self, _goal: &WaypointGoal, _cancel: &CancelToken) -> NavOutcome {
            NavOutcome::Succeeded
        }
    }

    fn collaborators() -> Collaborators {
        Collaborators {
            feeds: FeedSet::new(),
            nav: Arc::new(AlwaysSucceed),
            mode: Arc::new(AckMode),
            thrust: Arc::new(NullSink),
        }
    }

    #[test]
    fn test_patrol_machine_builds() {
        let config = MissionConfig::default();
        let machine = pool_patrol_machine(&config, &collaborators()).unwrap();
        assert_eq!(machine.name(), "pool_patrol");
        // Terminal labels come from the docking composite
        for label in [Outcome::Succeeded, Outcome::Aborted, Outcome::Preempted] {
            assert!(machine.outcome_set().contains(&label));
        }
    }

    #[test]
    fn test_gate_machine_exposes_search_terminals() {
        let config = MissionConfig::default();
        let machine = search_align_machine("gate", &config, &collaborators()).unwrap();
        assert!(machine.outcome_set().contains(&Outcome::Passed));
        assert!(machine.outcome_set().contains(&Outcome::Missed));
        // 'found' and 'unseen' are internal cycles, never exposed upward
        assert!(!machine.outcome_set().contains(&Outcome::Found));
        assert!(!machine.outcome_set().contains(&Outcome::Unseen));
    }

    #[test]
    fn test_missing_target_fails_construction() {
        let mut config = MissionConfig::default();
        config.targets.remove("pole");
        assert!(pool_patrol_machine(&config, &collaborators()).is_err());
    }
}
