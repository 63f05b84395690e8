//! Error taxonomy for the console.

use thiserror::Error;

/// Failures that can occur while executing a single 6507 instruction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    /// The opcode table slot at `pc` has no executor registered.
    #[error("invalid opcode {opcode:#04X} at PC={pc:#06X}")]
    InvalidOpcode { opcode: u8, pc: u16 },

    /// An executor detected a failure partway through running. None of the
    /// documented opcodes implemented here can actually produce this (every
    /// arithmetic/logical operation is total over 8-bit inputs); it exists so
    /// the error surface matches the documented taxonomy and stays
    /// extensible without a breaking change.
    #[error("execution fault running instruction at PC={pc:#06X}: {reason}")]
    ExecutionFault { pc: u16, reason: &'static str },
}

/// Top-level error type surfaced by the console.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Atari2600Error {
    #[error(transparent)]
    Cpu(#[from] CpuError),
}
