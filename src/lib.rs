//! VarunaMission - Mission controller for the Varuna AUV
//!
//! Sequences a pool patrol (transit, vision-guided search and alignment,
//! docking) as a hierarchical state machine, and turns asynchronous
//! perception and pose samples into per-tick thrust commands through a
//! four-axis PID chain.
//!
//! ## Architecture
//!
//! - **Control thread**: drives the mission machine sequentially; exactly
//!   one state executes at a time
//! - **Feed adapters**: copy asynchronous perception/pose samples into
//!   single-slot cells read by the control loop (last-write-wins)
//! - **External collaborators**: navigation action server, DP control-mode
//!   service and thrust sink, reached through channel-backed clients

pub mod clients;
pub mod config;
pub mod control;
pub mod error;
pub mod machine;
pub mod patrol;
pub mod runner;
pub mod shared;
pub mod sim;
pub mod states;
pub mod types;

pub use config::MissionConfig;
pub use error::{MissionError, Result};
pub use machine::{MachineBuilder, MachineError, MissionContext, Outcome};
pub use patrol::{Collaborators, MissionExecutor};
pub use shared::{CancelToken, FeedSet};
