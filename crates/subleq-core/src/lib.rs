//! Execution core for a 24-bit SUBLEQ one-instruction computer.

/// Flat cell memory, address map, and 24-bit arithmetic.
pub mod memory;
pub use memory::{
    decode_memory_region, sub_wrapped, to_signed24, Memory, MemoryRegion, ADDRESS_LIMIT,
    DEVICE_BASE, IDENTITY_TABLE_LEN, INTERRUPT_PORT, IO_PORT, MAX_WORD, MEMORY_CELLS, MIN_WORD,
    NO_KEY, SIGN_BIT, WORD_MASK, WORD_MODULUS,
};

/// Keystroke ring buffer shared with the input thread.
pub mod keyboard;
pub use keyboard::{
    CaptureConfig, Keyboard, OverflowPolicy, DEFAULT_CAPACITY, DEFAULT_TERMINATE_THRESHOLD,
    DUMP_BYTE, INTERRUPT_BYTE, LENIENT_TERMINATE_THRESHOLD,
};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    DumpWindow, EngineConfig, InstructionKind, RunOutcome, StepOutcome, TraceEvent, TraceSink,
    DEFAULT_DUMP_LEN, DEFAULT_DUMP_START,
};

/// Execution-state model.
pub mod state;
pub use state::RunState;

/// Fault taxonomy for the instruction cycle.
pub mod fault;
pub use fault::{Fault, Operand, RunError};

/// Memory dump formatting.
pub mod diag;
pub use diag::{write_dump, DUMP_ROW_CELLS};

/// Program image parsing and loading.
pub mod image;
pub use image::{LoadError, ProgramImage};

/// Instruction cycle.
pub mod execute;
pub use execute::{Engine, INSTRUCTION_CELLS};

#[cfg(test)]
use rstest as _;
