//! Top-level error type tying the assembler's and the core machine's errors
//! together at the CLI boundary (§7).

use std::fmt;

#[derive(Debug)]
pub enum Error {
    Assemble(masm::Error),
    Exec { line: Option<u32>, source: mips_vm::ExecError },
    Memory(mips_vm::BadAddress),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Assemble(e) => write!(f, "{}", e),
            Error::Exec { line: Some(line), source } => write!(f, "line {}: {}", line, source),
            Error::Exec { line: None, source } => write!(f, "{}", source),
            Error::Memory(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<masm::Error> for Error {
    fn from(e: masm::Error) -> Error {
        Error::Assemble(e)
    }
}

impl From<mips_vm::BadAddress> for Error {
    fn from(e: mips_vm::BadAddress) -> Error {
        Error::Memory(e)
    }
}

impl From<mips_vm::ExecError> for Error {
    fn from(e: mips_vm::ExecError) -> Error {
        Error::Exec { line: None, source: e }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}
