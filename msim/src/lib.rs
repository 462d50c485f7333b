//! Interactive and batch command-line driver (§4.7/§4.8) for the MIPS-I
//! simulator built from [`mips_vm`] (the core machine) and [`masm`] (the
//! assembler front end).

pub mod batch;
pub mod error;
pub mod interpreter;

pub use batch::run as run_batch;
pub use error::Error;
pub use interpreter::Interpreter;
