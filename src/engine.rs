//! Execution Engine (§4.7): dispatches a decoded instruction word against the
//! register file, HI/LO, memory and program counter.

use std::num::Wrapping;

use crate::codec::{self, Decoded};
use crate::constants;
use crate::error::ExecError;
use crate::kind::{Kind, RegisterId};
use crate::memory::{AddressSpace, Storage};
use crate::register::Register;

/// The I/O seam syscalls 1, 4, 5, 8 and 11 go through, kept separate from the
/// engine's register/memory state so it can be driven by an in-memory double
/// in tests instead of real process stdio.
pub trait SyscallIo {
    fn print_int(&mut self, value: i32);
    fn print_str(&mut self, s: &str);
    fn print_char(&mut self, c: u8);
    fn read_int(&mut self) -> i32;
    fn read_line(&mut self, max_len: usize) -> String;
}

/// `SyscallIo` backed by the process's own stdin/stdout.
#[derive(Default)]
pub struct StdIo;

impl SyscallIo for StdIo {
    fn print_int(&mut self, value: i32) {
        print!("{}", value);
    }

    fn print_str(&mut self, s: &str) {
        print!("{}", s);
    }

    fn print_char(&mut self, c: u8) {
        print!("{}", c as char);
    }

    fn read_int(&mut self) -> i32 {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).unwrap_or(0);
        line.trim().parse().unwrap_or(0)
    }

    fn read_line(&mut self, max_len: usize) -> String {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).unwrap_or(0);
        line.truncate(max_len);
        line
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepResult {
    Running,
    Halted,
}

/// The machine: register file, HI/LO, program counter, heap cursor and the
/// four fixed memory regions.
#[derive(Debug)]
pub struct Processor {
    registers: [Register; constants::REGISTER_COUNT],
    hi: u32,
    lo: u32,
    pub pc: u32,
    pub heap_ptr: u32,
    pub running: bool,
    pub space: AddressSpace,
}

impl Processor {
    pub fn new() -> Processor {
        let mut registers = [Register::default(); constants::REGISTER_COUNT];
        registers[RegisterId::SP.index()].set_u(constants::STACK_POINTER_INIT);

        Processor {
            registers,
            hi: 0,
            lo: 0,
            pc: constants::TEXT_START,
            heap_ptr: constants::HEAP_START,
            running: true,
            space: AddressSpace::new(),
        }
    }

    pub fn register(&self, id: RegisterId) -> Register {
        self.registers[id.index()]
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    /// Writes `value` to `id`. Register 0 is not special-cased (§4.7).
    pub fn set_register(&mut self, id: RegisterId, value: Register) {
        self.registers[id.index()] = value;
    }

    fn set_i(&mut self, id: RegisterId, value: Wrapping<i32>) {
        let mut r = Register::default();
        r.set_i(value.0);
        self.set_register(id, r);
    }

    fn set_u(&mut self, id: RegisterId, value: Wrapping<u32>) {
        let mut r = Register::default();
        r.set_u(value.0);
        self.set_register(id, r);
    }

    fn i(&self, id: RegisterId) -> Wrapping<i32> {
        Wrapping(self.register(id).i())
    }

    fn u(&self, id: RegisterId) -> Wrapping<u32> {
        Wrapping(self.register(id).u())
    }

    fn set_if(&mut self, id: RegisterId, condition: bool) {
        self.set_u(id, Wrapping(condition as u32));
    }

    /// Fetches, decodes and executes the instruction at `pc`, advancing `pc`.
    pub fn step(&mut self, io: &mut dyn SyscallIo) -> Result<StepResult, ExecError> {
        let word = self.space.text_word(self.pc)?;
        let decoded = codec::decode(word).map_err(|e| ExecError::UnsupportedEncoding(e.word))?;

        let mut next_pc = self.pc.wrapping_add(constants::WORD_BYTES);
        self.execute(&decoded, &mut next_pc, io)?;
        self.pc = next_pc;

        Ok(if self.running {
            StepResult::Running
        } else {
            StepResult::Halted
        })
    }

    pub fn run(&mut self, io: &mut dyn SyscallIo) -> Result<(), ExecError> {
        while self.running {
            self.step(io)?;
        }
        Ok(())
    }

    fn execute(
        &mut self,
        d: &Decoded,
        next_pc: &mut u32,
        io: &mut dyn SyscallIo,
    ) -> Result<(), ExecError> {
        use Kind::*;

        let rs_i = self.i(d.rs);
        let rt_i = self.i(d.rt);
        let rs_u = self.u(d.rs);
        let rt_u = self.u(d.rt);
        let imm = Wrapping(d.immediate as i32);
        let imm_u = Wrapping(d.immediate as u16 as u32);

        match d.kind {
            ADD | ADDU => self.set_i(d.rd, rs_i + rt_i),
            SUB | SUBU => self.set_i(d.rd, rs_i - rt_i),
            AND => self.set_i(d.rd, rs_i & rt_i),
            OR => self.set_i(d.rd, rs_i | rt_i),
            XOR => self.set_i(d.rd, rs_i ^ rt_i),
            NOR => self.set_i(d.rd, !(rs_i | rt_i)),
            SLT => self.set_if(d.rd, rs_i < rt_i),
            SLTU => self.set_if(d.rd, rs_u < rt_u),
            SEQ => self.set_if(d.rd, rs_i == rt_i),

            // Ambiguity (b): srl/srlv are logical, sra/srav are arithmetic —
            // implemented as genuinely distinct operations.
            SLL => self.set_i(d.rd, Wrapping(rt_i.0 << d.shamt)),
            SRL => self.set_u(d.rd, Wrapping(rt_u.0 >> d.shamt)),
            SRA => self.set_i(d.rd, Wrapping(rt_i.0 >> d.shamt)),
            SLLV => self.set_i(d.rd, Wrapping(rt_i.0 << (rs_u.0 & 0x1F))),
            SRLV => self.set_u(d.rd, Wrapping(rt_u.0 >> (rs_u.0 & 0x1F))),
            SRAV => self.set_i(d.rd, Wrapping(rt_i.0 >> (rs_u.0 & 0x1F))),

            JR => *next_pc = rs_u.0,
            JALR => {
                self.set_u(RegisterId::RA, Wrapping(*next_pc));
                *next_pc = rs_u.0;
            }

            DIV => self.div_signed(rs_i, rt_i)?,
            DIVU => self.div_unsigned(rs_u, rt_u)?,
            MULT => {
                let product = i64::from(rs_i.0) * i64::from(rt_i.0);
                self.lo = product as u32;
                self.hi = (product >> 32) as u32;
            }
            MULTU => {
                let product = u64::from(rs_u.0) * u64::from(rt_u.0);
                self.lo = product as u32;
                self.hi = (product >> 32) as u32;
            }
            MFHI => self.set_u(d.rd, Wrapping(self.hi)),
            MFLO => self.set_u(d.rd, Wrapping(self.lo)),
            // Ambiguity (d): source register comes from the `rd` bit position.
            MTHI => self.hi = self.u(d.rd).0,
            MTLO => self.lo = self.u(d.rd).0,

            SYSCALL => self.syscall(io)?,

            ADDI | ADDIU => self.set_i(d.rt, rs_i + imm),
            ANDI => self.set_i(d.rt, Wrapping(rs_i.0 & imm_u.0 as i32)),
            ORI => self.set_i(d.rt, Wrapping(rs_i.0 | imm_u.0 as i32)),
            XORI => self.set_i(d.rt, Wrapping(rs_i.0 ^ imm_u.0 as i32)),
            SLTI => self.set_if(d.rt, rs_i < imm),
            SLTIU => self.set_if(d.rt, rs_u < Wrapping(imm.0 as u32)),
            LUI => self.set_u(d.rt, Wrapping(imm_u.0 << 16)),

            LW => {
                let addr = (rs_i + imm).0 as u32;
                let value = self.space.read(addr, 4)?;
                self.set_u(d.rt, Wrapping(value));
            }
            LH => {
                let addr = (rs_i + imm).0 as u32;
                let value = self.space.read(addr, 2)? as u16 as i16;
                self.set_i(d.rt, Wrapping(value as i32));
            }
            LHU => {
                let addr = (rs_i + imm).0 as u32;
                let value = self.space.read(addr, 2)?;
                self.set_u(d.rt, Wrapping(value));
            }
            LB => {
                let addr = (rs_i + imm).0 as u32;
                let value = self.space.read(addr, 1)? as u8 as i8;
                self.set_i(d.rt, Wrapping(value as i32));
            }
            LBU => {
                let addr = (rs_i + imm).0 as u32;
                let value = self.space.read(addr, 1)?;
                self.set_u(d.rt, Wrapping(value));
            }
            SW => {
                let addr = (rs_i + imm).0 as u32;
                self.space.write(addr, 4, rt_u.0)?;
            }
            SH => {
                let addr = (rs_i + imm).0 as u32;
                self.space.write(addr, 2, rt_u.0 & 0xFFFF)?;
            }
            SB => {
                let addr = (rs_i + imm).0 as u32;
                self.space.write(addr, 1, rt_u.0 & 0xFF)?;
            }
            SC => {
                let addr = (rs_i + imm).0 as u32;
                self.space.write(addr, 1, rt_u.0 & 0x1)?;
            }

            BEQ => self.branch(rs_i == rt_i, d.immediate, next_pc),
            BNE => self.branch(rs_i != rt_i, d.immediate, next_pc),
            BGTZ => self.branch(rs_i.0 > 0, d.immediate, next_pc),
            BLEZ => self.branch(rs_i.0 <= 0, d.immediate, next_pc),
            BGEZ => self.branch(rs_i.0 >= 0, d.immediate, next_pc),
            BLTZ => self.branch(rs_i.0 < 0, d.immediate, next_pc),

            J => *next_pc = d.address << 2,
            JAL => {
                self.set_u(RegisterId::RA, Wrapping(*next_pc));
                *next_pc = d.address << 2;
            }
        }

        Ok(())
    }

    fn branch(&self, taken: bool, offset: i16, next_pc: &mut u32) {
        if taken {
            *next_pc = (self.pc as i64 + ((offset as i64) << 2)) as u32;
        }
    }

    fn div_signed(&mut self, dividend: Wrapping<i32>, divisor: Wrapping<i32>) -> Result<(), ExecError> {
        if divisor.0 == 0 {
            return Err(ExecError::DivisionByZero);
        }
        self.lo = (dividend / divisor).0 as u32;
        self.hi = (dividend % divisor).0 as u32;
        Ok(())
    }

    fn div_unsigned(&mut self, dividend: Wrapping<u32>, divisor: Wrapping<u32>) -> Result<(), ExecError> {
        if divisor.0 == 0 {
            return Err(ExecError::DivisionByZero);
        }
        self.lo = (dividend / divisor).0;
        self.hi = (dividend % divisor).0;
        Ok(())
    }

    fn syscall(&mut self, io: &mut dyn SyscallIo) -> Result<(), ExecError> {
        let v0 = self.register(RegisterId::V0).u();
        match v0 {
            1 => io.print_int(self.register(RegisterId::A0).i()),
            4 => {
                let mut addr = self.register(RegisterId::A0).u();
                let mut s = String::new();
                loop {
                    let byte = self.space.read(addr, 1)? as u8;
                    if byte == 0 {
                        break;
                    }
                    s.push(byte as char);
                    addr += 1;
                }
                io.print_str(&s);
            }
            5 => {
                let value = io.read_int();
                self.set_i(RegisterId::V0, Wrapping(value));
            }
            8 => {
                let addr = self.register(RegisterId::A0).u();
                let max_len = self.register(RegisterId::A1).u() as usize;
                let line = io.read_line(max_len.saturating_sub(1));
                let mut i = 0u32;
                for byte in line.bytes() {
                    self.space.write(addr + i, 1, byte as u32)?;
                    i += 1;
                }
                self.space.write(addr + i, 1, 0)?;
            }
            9 => {
                let amount = self.register(RegisterId::A0).u();
                self.set_u(RegisterId::V0, Wrapping(self.heap_ptr));
                self.heap_ptr += amount;
            }
            10 => {
                self.running = false;
                io.print_str("Simulator exiting...\n");
            }
            11 => io.print_char(self.register(RegisterId::A0).u() as u8),
            other => return Err(ExecError::UndefinedSyscall(other)),
        }
        Ok(())
    }
}

impl Default for Processor {
    fn default() -> Processor {
        Processor::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_i, encode_j, encode_r};
    use crate::kind::RegisterId::*;

    #[derive(Default)]
    struct RecordingIo {
        output: String,
        inputs: Vec<i32>,
    }

    impl SyscallIo for RecordingIo {
        fn print_int(&mut self, value: i32) {
            self.output.push_str(&value.to_string());
        }
        fn print_str(&mut self, s: &str) {
            self.output.push_str(s);
        }
        fn print_char(&mut self, c: u8) {
            self.output.push(c as char);
        }
        fn read_int(&mut self) -> i32 {
            self.inputs.pop().unwrap_or(0)
        }
        fn read_line(&mut self, _max_len: usize) -> String {
            String::new()
        }
    }

    fn load(space: &mut AddressSpace, words: &[u32]) {
        for (i, word) in words.iter().enumerate() {
            space
                .set_text_word(constants::TEXT_START + i as u32 * 4, *word)
                .unwrap();
        }
    }

    #[test]
    fn scenario_add() {
        let mut proc = Processor::new();
        load(
            &mut proc.space,
            &[
                encode_i(Kind::ADDI, ZERO, T0, 5),
                encode_i(Kind::ADDI, ZERO, T1, 7),
                encode_r(Kind::ADD, T0, T1, T2, 0),
            ],
        );
        let mut io = RecordingIo::default();
        proc.step(&mut io).unwrap();
        proc.step(&mut io).unwrap();
        proc.step(&mut io).unwrap();
        assert_eq!(proc.register(T2).i(), 12);
    }

    #[test]
    fn scenario_halt_via_syscall() {
        let mut proc = Processor::new();
        load(
            &mut proc.space,
            &[encode_i(Kind::ADDI, ZERO, V0, 10), encode_r(Kind::SYSCALL, ZERO, ZERO, ZERO, 0)],
        );
        let mut io = RecordingIo::default();
        proc.run(&mut io).unwrap();
        assert!(!proc.running);
        assert_eq!(io.output, "Simulator exiting...\n");
    }

    #[test]
    fn scenario_branch_taken() {
        let mut proc = Processor::new();
        let beq_pc = constants::TEXT_START + 8;
        let target = constants::TEXT_START + 16;
        let offset = codec::branch_offset(beq_pc, target).unwrap();
        load(
            &mut proc.space,
            &[
                encode_i(Kind::ADDI, ZERO, T0, 1),
                encode_i(Kind::ADDI, ZERO, T1, 1),
                encode_i(Kind::BEQ, T0, T1, offset),
                encode_i(Kind::ADDI, ZERO, T2, 99),
                encode_i(Kind::ADDI, ZERO, T2, 7),
            ],
        );
        let mut io = RecordingIo::default();
        for _ in 0..4 {
            proc.step(&mut io).unwrap();
        }
        assert_eq!(proc.register(T2).i(), 7);
    }

    #[test]
    fn scenario_sbrk() {
        let mut proc = Processor::new();
        load(
            &mut proc.space,
            &[
                encode_i(Kind::ADDI, ZERO, V0, 9),
                encode_i(Kind::ADDI, ZERO, A0, 16),
                encode_r(Kind::SYSCALL, ZERO, ZERO, ZERO, 0),
            ],
        );
        let mut io = RecordingIo::default();
        proc.step(&mut io).unwrap();
        proc.step(&mut io).unwrap();
        proc.step(&mut io).unwrap();
        assert_eq!(proc.register(V0).u(), constants::HEAP_START);
        assert_eq!(proc.heap_ptr, constants::HEAP_START + 0x10);
    }

    #[test]
    fn scenario_big_endian_store() {
        let mut proc = Processor::new();
        let mut base = Register::default();
        base.set_u(constants::DATA_START);
        proc.set_register(GP, base);
        load(
            &mut proc.space,
            &[
                encode_i(Kind::LUI, ZERO, T0, 0x1234),
                encode_i(Kind::ORI, T0, T0, 0x5678_u16 as i16),
                encode_i(Kind::SW, GP, T0, 0),
            ],
        );
        let mut io = RecordingIo::default();
        for _ in 0..3 {
            proc.step(&mut io).unwrap();
        }
        assert_eq!(
            proc.space.data().borrow_slice(0, 4).unwrap(),
            &[0x12, 0x34, 0x56, 0x78]
        );
    }

    #[test]
    fn register_zero_is_observable() {
        let mut proc = Processor::new();
        load(&mut proc.space, &[encode_i(Kind::ADDI, ZERO, ZERO, 5)]);
        let mut io = RecordingIo::default();
        proc.step(&mut io).unwrap();
        assert_eq!(proc.register(ZERO).i(), 5);
    }

    #[test]
    fn jump_uses_low_26_bits() {
        let mut proc = Processor::new();
        load(&mut proc.space, &[encode_j(Kind::J, constants::TEXT_START >> 2)]);
        let mut io = RecordingIo::default();
        proc.step(&mut io).unwrap();
        assert_eq!(proc.pc, constants::TEXT_START);
    }

    #[test]
    fn srl_is_logical_sra_is_arithmetic() {
        let mut proc = Processor::new();
        let mut neg_one = Register::default();
        neg_one.set_i(-1);
        proc.set_register(T0, neg_one);
        load(
            &mut proc.space,
            &[
                encode_r(Kind::SRL, ZERO, T0, T1, 1),
                encode_r(Kind::SRA, ZERO, T0, T2, 1),
            ],
        );
        let mut io = RecordingIo::default();
        proc.step(&mut io).unwrap();
        proc.step(&mut io).unwrap();
        assert_eq!(proc.register(T1).u(), 0x7FFF_FFFF);
        assert_eq!(proc.register(T2).i(), -1);
    }

    #[test]
    fn mthi_mtlo_source_from_rd_position() {
        let mut proc = Processor::new();
        let mut value = Register::default();
        value.set_u(42);
        proc.set_register(T3, value);
        load(&mut proc.space, &[encode_r(Kind::MTHI, ZERO, ZERO, T3, 0)]);
        let mut io = RecordingIo::default();
        proc.step(&mut io).unwrap();
        assert_eq!(proc.hi, 42);
    }

    #[test]
    fn division_by_zero_is_reported() {
        let mut proc = Processor::new();
        load(&mut proc.space, &[encode_r(Kind::DIV, T0, T1, ZERO, 0)]);
        let mut io = RecordingIo::default();
        assert_eq!(proc.step(&mut io), Err(ExecError::DivisionByZero));
    }
}
