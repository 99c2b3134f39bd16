//! Playback orchestration state machine

mod engine;
mod state;

pub use engine::{Orchestrator, OrchestratorEvent, OrchestratorHandle};
pub use state::{KioskState, OrchestratorSettings};
