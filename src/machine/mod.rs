//! Hierarchical mission state machine.
//!
//! A machine is a closed set of named states, a transition table validated
//! at construction, and an entry state. Machines nest: a whole machine is
//! itself a state whose outcome set is its exit labels, so the run loop is
//! identical at every nesting level.

pub mod context;
pub mod transition;

pub use context::{ContextKey, ContextValue, MissionContext, SearchStatus};
pub use transition::{MachineBuilder, MachineError, Transition};

use context::RemapTable;
use transition::{Next, TransitionTable};

use crate::shared::CancelToken;
use crate::states::{ControlModeSwitch, TargetSearch, TargetTrack, TransitLeg, WaypointLeg};

/// Finite outcome symbols returned by state executions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Succeeded,
    Aborted,
    Preempted,
    Found,
    Unseen,
    Passed,
    Missed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Aborted => "aborted",
            Outcome::Preempted => "preempted",
            Outcome::Found => "found",
            Outcome::Unseen => "unseen",
            Outcome::Passed => "passed",
            Outcome::Missed => "missed",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract implemented by every leaf state.
///
/// `execute` must return one symbol from `outcomes()`; anything else is a
/// contract violation the running machine reports as fatal. Side effects
/// are limited to declared context keys and the external collaborators the
/// leaf owns. Leaves never retry internally.
pub trait State {
    fn outcomes(&self) -> &'static [Outcome];

    /// Context keys this state reads.
    fn reads(&self) -> &'static [ContextKey] {
        &[]
    }

    /// Context keys this state writes.
    fn writes(&self) -> &'static [ContextKey] {
        &[]
    }

    fn execute(&mut self, ctx: &mut MissionContext, cancel: &CancelToken) -> Outcome;
}

/// Closed set of state implementations a mission can be assembled from.
///
/// Keeping the set closed means a machine's shape is fully known at
/// construction: the builder can see every child's outcome set and context
/// keys, and misspelled wiring cannot survive to the run loop.
pub enum MissionState {
    Search(TargetSearch),
    Track(TargetTrack),
    ModeSwitch(ControlModeSwitch),
    Transit(TransitLeg),
    Waypoint(WaypointLeg),
    Machine(StateMachine),
    #[cfg(test)]
    Faulty(testutil::FaultyState),
}

impl MissionState {
    /// The outcome set the parent machine must cover.
    pub fn outcomes(&self) -> &[Outcome] {
        match self {
            MissionState::Search(s) => s.outcomes(),
            MissionState::Track(s) => s.outcomes(),
            MissionState::ModeSwitch(s) => s.outcomes(),
            MissionState::Transit(s) => s.outcomes(),
            MissionState::Waypoint(s) => s.outcomes(),
            MissionState::Machine(m) => &m.outcomes,
            #[cfg(test)]
            MissionState::Faulty(s) => s.outcomes(),
        }
    }

    /// All context keys this state touches (reads and writes).
    pub fn context_keys(&self) -> Vec<ContextKey> {
        let (reads, writes) = match self {
            MissionState::Search(s) => (s.reads(), s.writes()),
            MissionState::Track(s) => (s.reads(), s.writes()),
            MissionState::ModeSwitch(s) => (s.reads(), s.writes()),
            MissionState::Transit(s) => (s.reads(), s.writes()),
            MissionState::Waypoint(s) => (s.reads(), s.writes()),
            MissionState::Machine(m) => return m.keys.clone(),
            #[cfg(test)]
            MissionState::Faulty(s) => (s.reads(), s.writes()),
        };
        let mut keys: Vec<ContextKey> = reads.to_vec();
        for key in writes {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
        keys
    }

    fn run(&mut self, ctx: &mut MissionContext, cancel: &CancelToken) -> Result<Outcome, MachineError> {
        match self {
            MissionState::Search(s) => Ok(s.execute(ctx, cancel)),
            MissionState::Track(s) => Ok(s.execute(ctx, cancel)),
            MissionState::ModeSwitch(s) => Ok(s.execute(ctx, cancel)),
            MissionState::Transit(s) => Ok(s.execute(ctx, cancel)),
            MissionState::Waypoint(s) => Ok(s.execute(ctx, cancel)),
            MissionState::Machine(m) => m.run(ctx, cancel),
            #[cfg(test)]
            MissionState::Faulty(s) => Ok(s.execute(ctx, cancel)),
        }
    }
}

/// A validated, runnable (possibly nested) state machine.
pub struct StateMachine {
    pub(crate) name: String,
    pub(crate) entry: usize,
    pub(crate) names: Vec<String>,
    pub(crate) states: Vec<MissionState>,
    pub(crate) table: TransitionTable,
    /// Exit labels = the outcome set this machine exposes upward
    pub(crate) outcomes: Vec<Outcome>,
    /// Context keys declared by the children (plus rename sources)
    pub(crate) keys: Vec<ContextKey>,
    pub(crate) remap: RemapTable,
}

impl StateMachine {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The exit labels this machine can produce.
    pub fn outcome_set(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Drive states until an exit label is reached.
    ///
    /// Identical at every nesting level. Cancellation is checked before and
    /// after each execution and exits `preempted` straight up through every
    /// level, bypassing the tables. The only `Err` is a contract violation:
    /// a state returning an outcome outside its declared set, or a table
    /// lookup failing despite construction-time validation.
    pub fn run(
        &mut self,
        ctx: &mut MissionContext,
        cancel: &CancelToken,
    ) -> Result<Outcome, MachineError> {
        self.remap.apply_inbound(ctx);

        let mut current = self.entry;
        loop {
            if cancel.is_cancelled() {
                return Ok(Outcome::Preempted);
            }

            let outcome = self.states[current].run(ctx, cancel)?;

            if cancel.is_cancelled() {
                return Ok(Outcome::Preempted);
            }

            if !self.states[current].outcomes().contains(&outcome) {
                return Err(MachineError::ContractViolation {
                    machine: self.name.clone(),
                    state: self.names[current].clone(),
                    outcome,
                });
            }

            match self.table.next(current, outcome) {
                Some(Next::State(next)) => {
                    tracing::debug!(
                        "{}: {} --{}--> {}",
                        self.name,
                        self.names[current],
                        outcome,
                        self.names[next]
                    );
                    current = next;
                }
                Some(Next::Exit(label)) => {
                    tracing::info!("{}: exiting with '{}'", self.name, label);
                    self.remap.apply_outbound(ctx);
                    return Ok(label);
                }
                None => {
                    return Err(MachineError::MissingTransition {
                        machine: self.name.clone(),
                        state: self.names[current].clone(),
                        outcome,
                    });
                }
            }
        }
    }
}
