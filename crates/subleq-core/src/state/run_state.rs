use crate::Fault;

/// Execution-state machine for host-observable engine control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// A SUBLEQ step branched to the halt sentinel.
    Halted,
    /// The keystroke producer crossed the interrupt threshold.
    Terminated,
    /// A fault is latched; no further progress is possible.
    Faulted(Fault),
}

#[cfg(test)]
mod tests {
    use super::RunState;

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
    }
}
