//! Batch mode (§4.7): assembles a whole source file in two passes, loads the
//! result into a fresh [`Processor`], and runs it to completion, annotating
//! any execution error with the source line it came from via the assembler's
//! [`masm::SourceMap`].

use mips_vm::{constants, Processor, StepResult, SyscallIo};

use crate::error::Error;

fn line_for(pc: u32, source_map: &masm::SourceMap) -> Option<u32> {
    if pc < constants::TEXT_START {
        return None;
    }
    let index = ((pc - constants::TEXT_START) / constants::WORD_BYTES) as usize;
    source_map.get(index).map(|item| item.line)
}

/// Assembles and runs `source` to completion, returning the final processor
/// state so the caller can inspect registers/memory after exit.
pub fn run(source: &str, io: &mut dyn SyscallIo) -> Result<Processor, Error> {
    let (program, _symbols, source_map) = masm::assemble(source)?;

    let mut proc = Processor::new();
    for (i, word) in program.text.iter().enumerate() {
        proc.space
            .set_text_word(constants::TEXT_START + i as u32 * constants::WORD_BYTES, *word)?;
    }
    for (i, byte) in program.data.iter().enumerate() {
        proc.space.write(constants::DATA_START + i as u32, 1, *byte as u32)?;
    }
    proc.pc = program.entrypoint;

    loop {
        let pc = proc.pc;
        match proc.step(io) {
            Ok(StepResult::Running) => continue,
            Ok(StepResult::Halted) => return Ok(proc),
            Err(source) => {
                return Err(Error::Exec { line: line_for(pc, &source_map), source });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct NullIo;
    impl SyscallIo for NullIo {
        fn print_int(&mut self, _value: i32) {}
        fn print_str(&mut self, _s: &str) {}
        fn print_char(&mut self, _c: u8) {}
        fn read_int(&mut self) -> i32 {
            0
        }
        fn read_line(&mut self, _max_len: usize) -> String {
            String::new()
        }
    }

    #[test]
    fn runs_to_completion_and_halts() {
        let source = ".text\n.globl main\nmain:\nli $v0, 10\nsyscall\n";
        let proc = run(source, &mut NullIo::default()).unwrap();
        assert!(!proc.running);
    }

    #[test]
    fn loop_to_zero_then_exits() {
        let source = ".text\n.globl main\nmain:\nli $t0, 3\ntop:\naddi $t0, $t0, -1\nbne $t0, $zero, top\nli $v0, 10\nsyscall\n";
        let proc = run(source, &mut NullIo::default()).unwrap();
        assert_eq!(proc.register(mips_vm::RegisterId::T0).i(), 0);
    }

    #[test]
    fn execution_error_is_annotated_with_source_line() {
        let source = ".text\n.globl main\nmain:\ndiv $t0, $zero\n";
        let err = run(source, &mut NullIo::default()).unwrap_err();
        match err {
            Error::Exec { line: Some(4), .. } => {}
            other => panic!("expected annotated division error, got {:?}", other),
        }
    }
}
