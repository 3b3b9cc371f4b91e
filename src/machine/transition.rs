//! Transition tables and the validating machine builder.
//!
//! Every defect a transition table can carry is rejected when the machine
//! is built: an uncovered (state, outcome) pair, a transition on an outcome
//! the state never declares, a misspelled next-state or entry-state name,
//! or a rename target the child machine does not declare. The run loop
//! never discovers wiring problems.

use std::collections::HashMap;

use thiserror::Error;

use super::context::{ContextKey, Remap, RemapTable};
use super::{MissionState, Outcome, StateMachine};

/// Where a (state, outcome) pair leads, as written by mission assembly code.
#[derive(Clone, Debug)]
pub enum Transition {
    /// Continue with the named sibling state
    To(&'static str),
    /// Leave the machine with this exit label
    Exit(Outcome),
}

/// Resolved transition target.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Next {
    State(usize),
    Exit(Outcome),
}

/// Resolved (state, outcome) -> target mapping.
#[derive(Debug, Default)]
pub struct TransitionTable {
    entries: HashMap<(usize, Outcome), Next>,
}

impl TransitionTable {
    pub(crate) fn next(&self, state: usize, outcome: Outcome) -> Option<Next> {
        self.entries.get(&(state, outcome)).copied()
    }
}

/// Construction-time and contract defects. The only fatal error class: every
/// environment-origin condition is an ordinary outcome symbol instead.
#[derive(Error, Debug)]
pub enum MachineError {
    #[error("machine '{machine}': duplicate state '{state}'")]
    DuplicateState { machine: String, state: String },

    #[error("machine '{machine}': entry state '{entry}' does not exist")]
    UnknownEntry { machine: String, entry: String },

    #[error("machine '{machine}': state '{state}' routes '{outcome}' to unknown state '{target}'")]
    UnknownTarget {
        machine: String,
        state: String,
        outcome: Outcome,
        target: String,
    },

    #[error("machine '{machine}': state '{state}' has no transition for declared outcome '{outcome}'")]
    MissingTransition {
        machine: String,
        state: String,
        outcome: Outcome,
    },

    #[error("machine '{machine}': state '{state}' wires undeclared outcome '{outcome}'")]
    UndeclaredOutcome {
        machine: String,
        state: String,
        outcome: Outcome,
    },

    #[error("machine '{machine}': rename target {inner:?} is not declared by any child state")]
    RemapUndeclared { machine: String, inner: ContextKey },

    #[error("machine '{machine}': rename {outer:?} -> {inner:?} crosses value types")]
    RemapTypeMismatch {
        machine: String,
        outer: ContextKey,
        inner: ContextKey,
    },

    #[error("machine '{machine}': state '{state}' returned undeclared outcome '{outcome}'")]
    ContractViolation {
        machine: String,
        state: String,
        outcome: Outcome,
    },
}

/// Builder assembling one (possibly nested) state machine.
pub struct MachineBuilder {
    name: String,
    entry: &'static str,
    states: Vec<(String, MissionState, Vec<(Outcome, Transition)>)>,
    remaps: Vec<Remap>,
}

impl MachineBuilder {
    pub fn new(name: &str, entry: &'static str) -> Self {
        Self {
            name: name.to_string(),
            entry,
            states: Vec::new(),
            remaps: Vec::new(),
        }
    }

    /// Add a named state with its complete outcome wiring.
    pub fn state(
        mut self,
        name: &str,
        state: MissionState,
        transitions: &[(Outcome, Transition)],
    ) -> Self {
        self.states
            .push((name.to_string(), state, transitions.to_vec()));
        self
    }

    /// Rename a parent-scope context key into this machine's scope.
    pub fn remap(mut self, outer: ContextKey, inner: ContextKey) -> Self {
        self.remaps.push(Remap { outer, inner });
        self
    }

    /// Validate the wiring and produce a runnable machine.
    pub fn build(self) -> Result<StateMachine, MachineError> {
        let machine = self.name;

        let mut index = HashMap::new();
        for (i, (name, _, _)) in self.states.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(MachineError::DuplicateState {
                    machine: machine.clone(),
                    state: name.clone(),
                });
            }
        }

        let entry = *index
            .get(self.entry)
            .ok_or_else(|| MachineError::UnknownEntry {
                machine: machine.clone(),
                entry: self.entry.to_string(),
            })?;

        let mut table = TransitionTable::default();
        let mut exits = Vec::new();
        for (i, (name, state, transitions)) in self.states.iter().enumerate() {
            let declared = state.outcomes();

            for (outcome, transition) in transitions {
                if !declared.contains(outcome) {
                    return Err(MachineError::UndeclaredOutcome {
                        machine: machine.clone(),
                        state: name.clone(),
                        outcome: *outcome,
                    });
                }
                let next = match transition {
                    Transition::To(target) => {
                        let target_idx =
                            *index.get(*target).ok_or_else(|| MachineError::UnknownTarget {
                                machine: machine.clone(),
                                state: name.clone(),
                                outcome: *outcome,
                                target: target.to_string(),
                            })?;
                        Next::State(target_idx)
                    }
                    Transition::Exit(label) => {
                        if !exits.contains(label) {
                            exits.push(*label);
                        }
                        Next::Exit(*label)
                    }
                };
                table.entries.insert((i, *outcome), next);
            }

            for outcome in declared {
                if !table.entries.contains_key(&(i, *outcome)) {
                    return Err(MachineError::MissingTransition {
                        machine: machine.clone(),
                        state: name.clone(),
                        outcome: *outcome,
                    });
                }
            }
        }

        // Child-scope key set for rename validation
        let mut keys: Vec<ContextKey> = Vec::new();
        for (_, state, _) in &self.states {
            for key in state.context_keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        for remap in &self.remaps {
            if !keys.contains(&remap.inner) {
                return Err(MachineError::RemapUndeclared {
                    machine: machine.clone(),
                    inner: remap.inner,
                });
            }
            if remap.outer.kind() != remap.inner.kind() {
                return Err(MachineError::RemapTypeMismatch {
                    machine: machine.clone(),
                    outer: remap.outer,
                    inner: remap.inner,
                });
            }
            if !keys.contains(&remap.outer) {
                keys.push(remap.outer);
            }
        }

        Ok(StateMachine {
            name: machine,
            entry,
            names: self.states.iter().map(|(n, _, _)| n.clone()).collect(),
            states: self.states.into_iter().map(|(_, s, _)| s).collect(),
            table,
            outcomes: exits,
            keys,
            remap: RemapTable {
                entries: self.remaps,
            },
        })
    }
}
