//! Public host-facing API contracts for embedding the engine.

use crate::Fault;

/// Default first cell of the debug dump window.
pub const DEFAULT_DUMP_START: i32 = 0x00_BA00;

/// Default number of cells in the debug dump window.
pub const DEFAULT_DUMP_LEN: usize = 0x100;

/// Memory window printed when a dump is requested from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DumpWindow {
    /// First cell of the window.
    pub start: i32,
    /// Number of cells, rounded up to whole 16-cell rows when printed.
    pub len: usize,
}

impl Default for DumpWindow {
    fn default() -> Self {
        Self {
            start: DEFAULT_DUMP_START,
            len: DEFAULT_DUMP_LEN,
        }
    }
}

/// Engine policy switches.
///
/// The defaults reproduce the strict machine variant; [`EngineConfig::lenient`]
/// reproduces the variant without negative-operand faults or device-range
/// write protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EngineConfig {
    /// Fault when operand `a` or `b` is negative outside the port sentinels.
    pub negative_operand_faults: bool,
    /// Discard SUBLEQ stores into the device region.
    pub protect_device_range: bool,
    /// Emit [`TraceEvent`]s to the installed sink.
    pub tracing_enabled: bool,
    /// Window printed on a dump request.
    pub dump_window: DumpWindow,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            negative_operand_faults: true,
            protect_device_range: true,
            tracing_enabled: false,
            dump_window: DumpWindow::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration matching the lenient machine variant.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            negative_operand_faults: false,
            protect_device_range: false,
            ..Self::default()
        }
    }
}

/// Which path of the instruction cycle an instruction took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionKind {
    /// `b` was the I/O port: one byte went to the output device.
    ConsoleWrite,
    /// `a` was the I/O port: one byte (or the no-key marker) was read.
    KeyboardRead,
    /// `a` was the interrupt port: the interrupt flag was sampled.
    InterruptCheck,
    /// Ordinary subtract-and-branch.
    Subleq,
}

/// Output status from one instruction-cycle attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// Instruction retired; execution continues at `next_pc`.
    Retired {
        /// Path the instruction took.
        kind: InstructionKind,
        /// Program counter for the next fetch.
        next_pc: i32,
    },
    /// A SUBLEQ step branched to the halt sentinel.
    Halted,
    /// The terminate flag stopped the loop before this cycle.
    Terminated,
}

/// Aggregated outcome from running multiple steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of retired instructions during this call.
    pub steps: u64,
    /// Last step-level status observed before returning.
    pub final_step: StepOutcome,
}

impl RunOutcome {
    /// True when the run ended in a clean halt.
    #[must_use]
    pub const fn halted(&self) -> bool {
        matches!(self.final_step, StepOutcome::Halted)
    }

    /// True when the run ended because of the terminate flag.
    #[must_use]
    pub const fn terminated(&self) -> bool {
        matches!(self.final_step, StepOutcome::Terminated)
    }
}

/// Trace events emitted at step boundaries when tracing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Operands fetched, before any check or side effect.
    InstructionStart {
        /// Program counter of the triple.
        pc: i32,
        /// First operand.
        a: i32,
        /// Second operand.
        b: i32,
        /// Branch target.
        c: i32,
    },
    /// Instruction retired.
    InstructionRetired {
        /// Program counter of the triple.
        pc: i32,
        /// Path the instruction took.
        kind: InstructionKind,
    },
    /// Engine halted cleanly.
    Halted {
        /// Program counter of the halting triple.
        pc: i32,
    },
    /// Fault raised.
    FaultRaised {
        /// Fault that stopped the engine.
        fault: Fault,
    },
}

/// Sink trait for trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}
