use std::fmt;

use thiserror::Error;

/// Operand slot of an instruction triple that triggered an operand fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operand {
    /// First operand (`a`, the subtrahend address).
    A,
    /// Second operand (`b`, the destination address).
    B,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("a"),
            Self::B => f.write_str("b"),
        }
    }
}

/// Fatal conditions raised by the instruction cycle.
///
/// Every fault is terminal: the engine latches it and refuses to step again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// The program counter was outside `[0, 2^24)` before a fetch.
    #[error("[pc] out of bounds error (pc={pc:#X})")]
    PcOutOfRange {
        /// Offending program counter.
        pc: i32,
    },
    /// Operand `a` or `b` was at or above `2^24`.
    #[error("[{operand}] out of bounds error at pc {pc:06X} (value {value:#X})")]
    OperandOutOfRange {
        /// Which operand overflowed.
        operand: Operand,
        /// Program counter of the faulting instruction.
        pc: i32,
        /// Raw operand value.
        value: i32,
    },
    /// Operand `a` or `b` was negative and negative-operand faults are enabled.
    #[error("[{operand}] negative error at pc {pc:06X} (value {value})")]
    NegativeOperand {
        /// Which operand was negative.
        operand: Operand,
        /// Program counter of the faulting instruction.
        pc: i32,
        /// Raw operand value.
        value: i32,
    },
    /// A memory cell outside the address space was read or written.
    #[error("memory access out of bounds at address {addr:#X}")]
    AddressOutOfRange {
        /// Offending address.
        addr: i32,
    },
}

/// Error returned by the stepping APIs.
#[derive(Debug, Error)]
pub enum RunError {
    /// The instruction cycle faulted.
    #[error(transparent)]
    Fault(#[from] Fault),
    /// Writing to the output device failed.
    #[error("output device error: {0}")]
    Output(#[from] std::io::Error),
}

impl RunError {
    /// Returns the engine fault, if this error is one.
    #[must_use]
    pub const fn fault(&self) -> Option<Fault> {
        match self {
            Self::Fault(fault) => Some(*fault),
            Self::Output(_) => None,
        }
    }
}
