//! Error types for VarunaMission

use thiserror::Error;

use crate::machine::MachineError;

/// VarunaMission error type
#[derive(Error, Debug)]
pub enum MissionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mission construction error: {0}")]
    Machine(#[from] MachineError),

    #[error("Mission aborted on contract violation: {0}")]
    ContractViolation(MachineError),
}

impl From<toml::de::Error> for MissionError {
    fn from(e: toml::de::Error) -> Self {
        MissionError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MissionError>;
