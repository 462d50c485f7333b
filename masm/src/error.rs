//! Assembler errors (§7, *assembly* category): malformed source and
//! unresolved symbols, each carrying the source line they were found on.

use std::fmt;
use std::num::ParseIntError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    UnknownMnemonic(String),
    UnknownDirective(String),
    UnknownRegister(String),
    MalformedOperand(String),
    WrongOperandCount { mnemonic: String, expected: usize, found: usize },
    ParseInt(String),
    UnterminatedString,
}

impl From<ParseIntError> for ParseError {
    fn from(err: ParseIntError) -> ParseError {
        ParseError::ParseInt(err.to_string())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::UnknownMnemonic(m) => write!(f, "unknown mnemonic '{}'", m),
            ParseError::UnknownDirective(d) => write!(f, "unknown directive '{}'", d),
            ParseError::UnknownRegister(r) => write!(f, "unknown register '{}'", r),
            ParseError::MalformedOperand(s) => write!(f, "malformed operand '{}'", s),
            ParseError::WrongOperandCount { mnemonic, expected, found } => write!(
                f,
                "'{}' expects {} operand(s), found {}",
                mnemonic, expected, found
            ),
            ParseError::ParseInt(msg) => write!(f, "invalid integer literal: {}", msg),
            ParseError::UnterminatedString => write!(f, "unterminated string literal"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssembleError {
    UndefinedLabel(String),
    DuplicateLabel(String),
    BranchOutOfRange(String),
    DataTooLarge,
    TextTooLarge,
    EntrypointAlreadySet,
    EntrypointMissing,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssembleError::UndefinedLabel(l) => write!(f, "undefined label '{}'", l),
            AssembleError::DuplicateLabel(l) => write!(f, "label '{}' defined more than once", l),
            AssembleError::BranchOutOfRange(l) => {
                write!(f, "branch to '{}' is out of range for a 16-bit offset", l)
            }
            AssembleError::DataTooLarge => write!(f, "data segment exceeds its fixed capacity"),
            AssembleError::TextTooLarge => write!(f, "text segment exceeds its fixed capacity"),
            AssembleError::EntrypointAlreadySet => write!(f, "entrypoint set more than once via .globl"),
            AssembleError::EntrypointMissing => write!(f, "no entrypoint was set via .globl"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    Parse { line: u32, source: ParseError },
    Assemble { line: u32, source: AssembleError },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse { line, source } => write!(f, "line {}: {}", line, source),
            Error::Assemble { line, source } => write!(f, "line {}: {}", line, source),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
