//! A MIPS-I 32-bit instruction-subset simulator: assembler, encoder, decoder
//! and execution engine.
//!
//! This crate implements the core machine (registers, memory, instruction
//! encoding and execution); see the `masm` crate for the assembler front end
//! and `msim` for the interactive/batch CLI built on top of both.

extern crate num;
#[macro_use]
extern crate num_derive;

pub mod codec;
pub mod constants;
pub mod engine;
pub mod error;
pub mod kind;
pub mod memory;
pub mod register;

pub use codec::{branch_offset, decode, encode_i, encode_j, encode_r, Decoded};
pub use engine::{Processor, StdIo, StepResult, SyscallIo};
pub use error::ExecError;
pub use kind::{Format, Kind, RegisterId};
pub use memory::{AddressSpace, BadAddress, Memory, Region, Storage};
pub use register::Register;
