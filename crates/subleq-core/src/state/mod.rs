//! Execution-state model for the instruction cycle.

/// Run-state machine primitives.
pub mod run_state;

pub use run_state::RunState;
