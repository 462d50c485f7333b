//! Execution-time errors (§7, *execution* category).

use std::fmt;

use crate::memory::BadAddress;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecError {
    /// Load/store or instruction fetch outside the four known regions.
    BadMemoryAccess(u32),
    /// `regs[$v0]` did not match any entry in the syscall table.
    UndefinedSyscall(u32),
    /// The fetched word did not decode to a supported opcode/funct.
    UnsupportedEncoding(u32),
    /// `goto` target was misaligned, outside the text segment, or ahead of `pc`.
    InvalidGoto(u32),
    /// Division by zero (undefined by the specification; surfaced rather than panicking).
    DivisionByZero,
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExecError::BadMemoryAccess(addr) => {
                write!(f, "memory access outside known regions at {:#010x}", addr)
            }
            ExecError::UndefinedSyscall(v0) => write!(f, "undefined syscall {}", v0),
            ExecError::UnsupportedEncoding(word) => {
                write!(f, "unsupported decoded opcode/funct: {:#010x}", word)
            }
            ExecError::InvalidGoto(addr) => write!(f, "invalid goto address {:#010x}", addr),
            ExecError::DivisionByZero => write!(f, "division by zero"),
        }
    }
}

impl std::error::Error for ExecError {}

impl From<BadAddress> for ExecError {
    fn from(err: BadAddress) -> ExecError {
        ExecError::BadMemoryAccess(err.0)
    }
}
