//! Interactive mode (§4.7): assembles and executes one source line at a
//! time. Each line's words are appended to the text segment and run
//! immediately; when a branch or jump sends control somewhere other than
//! straight past the line just written, the interpreter keeps stepping
//! through whatever is already stored there until control naturally returns,
//! which is what makes backward jumps replay prior instructions.

use std::fmt::Write as _;

use mips_vm::{constants, ExecError, Processor, RegisterId, StepResult, SyscallIo};
use masm::{parse_line, Body, SymbolTable};

use crate::error::Error;

pub struct Interpreter {
    pub proc: Processor,
    pub symbols: SymbolTable,
    write_pc: u32,
    next_line: u32,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter {
            proc: Processor::new(),
            symbols: SymbolTable::new(),
            write_pc: constants::TEXT_START,
            next_line: 1,
        }
    }

    /// Steps from `start` until control naturally advances to `start + 4`,
    /// replaying any earlier instructions a branch or jump lands on along
    /// the way. Returns `true` if the program halted.
    fn execute_atom(&mut self, start: u32, io: &mut dyn SyscallIo) -> Result<bool, Error> {
        let target = start.wrapping_add(constants::WORD_BYTES);
        let mut pc = start;
        loop {
            self.proc.pc = pc;
            if self.proc.step(io)? == StepResult::Halted {
                return Ok(true);
            }
            pc = self.proc.pc;
            if pc == target {
                return Ok(false);
            }
        }
    }

    /// Feeds one line of user input. Returns `true` if the program halted as
    /// a result.
    pub fn feed_line(&mut self, line: &str, io: &mut dyn SyscallIo) -> Result<bool, Error> {
        let line_no = self.next_line;
        self.next_line += 1;

        let parsed = parse_line(line).map_err(|source| masm::Error::Parse { line: line_no, source })?;

        if let Some(Body::Directive { name, args }) = &parsed.body {
            if name == "globl" {
                let label = args.first().cloned().ok_or_else(|| {
                    Error::from(masm::Error::Parse {
                        line: line_no,
                        source: masm::ParseError::WrongOperandCount {
                            mnemonic: ".globl".to_owned(),
                            expected: 1,
                            found: 0,
                        },
                    })
                })?;
                self.symbols
                    .set_entrypoint(&label)
                    .map_err(|source| masm::Error::Assemble { line: line_no, source })?;
                return Ok(false);
            }
        }

        if parsed.body.is_none() && parsed.label.is_none() {
            return Ok(false);
        }

        let start = self.write_pc;
        let words = masm::instructions::assemble_one(line_no, start, &parsed, &mut self.symbols)?;
        for (i, word) in words.iter().enumerate() {
            self.proc
                .space
                .set_text_word(start + i as u32 * constants::WORD_BYTES, *word)?;
        }
        self.write_pc = start + words.len() as u32 * constants::WORD_BYTES;

        let mut pc = start;
        for _ in &words {
            if self.execute_atom(pc, io)? {
                return Ok(true);
            }
            pc += constants::WORD_BYTES;
        }
        Ok(false)
    }

    /// `goto <addr>` (§4.8 CLI surface): replays previously-written text
    /// starting at `addr` until control returns to the interpreter's current
    /// pc, without appending anything new.
    pub fn goto(&mut self, addr: u32, io: &mut dyn SyscallIo) -> Result<(), Error> {
        if addr % constants::WORD_BYTES != 0 || addr < constants::TEXT_START || addr >= self.write_pc {
            return Err(Error::Exec { line: None, source: ExecError::InvalidGoto(addr) });
        }
        let original = self.proc.pc;
        let mut pc = addr;
        loop {
            self.proc.pc = pc;
            if self.proc.step(io)? == StepResult::Halted {
                return Ok(());
            }
            pc = self.proc.pc;
            if pc == original {
                return Ok(());
            }
        }
    }

    pub fn format_registers(&self) -> String {
        let mut out = String::new();
        for index in 0..constants::REGISTER_COUNT as u32 {
            let id = RegisterId::from_index(index).expect("index in range");
            let _ = writeln!(out, "{:<5} = {}", format!("{:?}", id), self.proc.register(id).i());
        }
        let _ = writeln!(out, "hi = {}, lo = {}", self.proc.hi(), self.proc.lo());
        let _ = writeln!(out, "pc = {:#010x}", self.proc.pc);
        out
    }

    pub fn format_labels(&self) -> String {
        let mut labels: Vec<(&str, u32)> = self.symbols.iter().collect();
        labels.sort_by_key(|(_, addr)| *addr);
        let mut out = String::new();
        for (name, addr) in labels {
            let _ = writeln!(out, "{:#010x}  {}", addr, name);
        }
        out
    }

    pub fn format_data(&self) -> String {
        let mut out = String::new();
        let bytes = self.proc.space.data().data();
        for (i, chunk) in bytes.chunks(16).enumerate() {
            if chunk.iter().all(|b| *b == 0) {
                continue;
            }
            let _ = write!(out, "{:#010x}  ", constants::DATA_START + (i as u32) * 16);
            for byte in chunk {
                let _ = write!(out, "{:02x} ", byte);
            }
            let _ = writeln!(out);
        }
        out
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}
