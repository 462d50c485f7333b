//! The MIPS-I instruction subset: register names, instruction kinds, and the
//! opcode/funct tables that the encoder and decoder both consult.

use num_derive::{FromPrimitive, ToPrimitive};
use util::{EnumFromStr, InteropGetName};
use util_derive::{EnumFromStr, InteropGetName};

/// One of the 32 general-purpose registers, by MIPS convention name.
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive, InteropGetName, EnumFromStr,
)]
pub enum RegisterId {
    ZERO,
    AT,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    T8,
    T9,
    K0,
    K1,
    GP,
    SP,
    FP,
    RA,
}

impl RegisterId {
    pub fn from_index(index: u32) -> Option<RegisterId> {
        num::FromPrimitive::from_u32(index)
    }

    pub fn index(self) -> usize {
        num::ToPrimitive::to_u32(&self).unwrap() as usize
    }
}

/// One of the three MIPS-I instruction word layouts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Format {
    R,
    I,
    J,
}

/// The instruction kinds this machine understands, independent of encoding.
///
/// Variant names spell the mnemonic in upper case so that [`EnumFromStr`]
/// doubles as a mnemonic table lookup.
#[derive(Clone, Copy, PartialEq, Eq, Debug, InteropGetName, EnumFromStr)]
#[allow(clippy::upper_case_acronyms)]
pub enum Kind {
    ADD,
    ADDU,
    SUB,
    SUBU,
    AND,
    OR,
    XOR,
    NOR,
    SLT,
    SLTU,
    SEQ,
    SLL,
    SRL,
    SRA,
    SLLV,
    SRLV,
    SRAV,
    JR,
    JALR,
    DIV,
    DIVU,
    MULT,
    MULTU,
    MFHI,
    MFLO,
    MTHI,
    MTLO,
    SYSCALL,

    ADDI,
    ADDIU,
    ANDI,
    ORI,
    XORI,
    SLTI,
    SLTIU,
    LUI,
    LW,
    LB,
    LBU,
    LH,
    LHU,
    SW,
    SH,
    SB,
    SC,
    BEQ,
    BNE,
    BGTZ,
    BLEZ,
    BGEZ,
    BLTZ,

    J,
    JAL,
}

impl Kind {
    pub fn format(self) -> Format {
        use Kind::*;
        match self {
            ADD | ADDU | SUB | SUBU | AND | OR | XOR | NOR | SLT | SLTU | SEQ | SLL | SRL
            | SRA | SLLV | SRLV | SRAV | JR | JALR | DIV | DIVU | MULT | MULTU | MFHI | MFLO
            | MTHI | MTLO | SYSCALL => Format::R,
            J | JAL => Format::J,
            _ => Format::I,
        }
    }

    /// `funct` field for R-format kinds.
    pub fn funct(self) -> Option<u32> {
        use Kind::*;
        Some(match self {
            ADD => 0x20,
            ADDU => 0x21,
            SUB => 0x22,
            SUBU => 0x23,
            AND => 0x24,
            OR => 0x25,
            XOR => 0x26,
            NOR => 0x27,
            SLT => 0x2A,
            SLTU => 0x2B,
            SLL => 0x00,
            SRL => 0x02,
            SRA => 0x03,
            SLLV => 0x04,
            SRLV => 0x06,
            SRAV => 0x07,
            JR => 0x08,
            JALR => 0x09,
            DIV => 0x1A,
            DIVU => 0x1B,
            MULT => 0x18,
            MULTU => 0x19,
            MFHI => 0x10,
            MFLO => 0x12,
            MTHI => 0x11,
            MTLO => 0x13,
            SYSCALL => 0x0C,
            SEQ => 0x28,
            _ => return None,
        })
    }

    pub fn from_funct(funct: u32) -> Option<Kind> {
        use Kind::*;
        Some(match funct {
            0x20 => ADD,
            0x21 => ADDU,
            0x22 => SUB,
            0x23 => SUBU,
            0x24 => AND,
            0x25 => OR,
            0x26 => XOR,
            0x27 => NOR,
            0x2A => SLT,
            0x2B => SLTU,
            0x00 => SLL,
            0x02 => SRL,
            0x03 => SRA,
            0x04 => SLLV,
            0x06 => SRLV,
            0x07 => SRAV,
            0x08 => JR,
            0x09 => JALR,
            0x1A => DIV,
            0x1B => DIVU,
            0x18 => MULT,
            0x19 => MULTU,
            0x10 => MFHI,
            0x12 => MFLO,
            0x11 => MTHI,
            0x13 => MTLO,
            0x0C => SYSCALL,
            0x28 => SEQ,
            _ => return None,
        })
    }

    /// `opcode` field for non-R-format kinds (R-format kinds all share opcode 0).
    pub fn opcode(self) -> u32 {
        use Kind::*;
        match self {
            ADDI => 0x08,
            ADDIU => 0x09,
            ANDI => 0x0C,
            ORI => 0x0D,
            XORI => 0x0E,
            SLTI => 0x0A,
            SLTIU => 0x0B,
            LUI => 0x0F,
            LW => 0x23,
            LB => 0x20,
            LBU => 0x24,
            LH => 0x21,
            LHU => 0x25,
            SW => 0x2B,
            SH => 0x29,
            SB => 0x28,
            SC => 0x38,
            BEQ => 0x04,
            BNE => 0x05,
            BLEZ => 0x06,
            BGTZ => 0x07,
            BLTZ => 0x16,
            BGEZ => 0x17,
            J => 0x02,
            JAL => 0x03,
            _ => 0,
        }
    }

    pub fn from_opcode(opcode: u32) -> Option<Kind> {
        use Kind::*;
        Some(match opcode {
            0x08 => ADDI,
            0x09 => ADDIU,
            0x0C => ANDI,
            0x0D => ORI,
            0x0E => XORI,
            0x0A => SLTI,
            0x0B => SLTIU,
            0x0F => LUI,
            0x23 => LW,
            0x20 => LB,
            0x24 => LBU,
            0x21 => LH,
            0x25 => LHU,
            0x2B => SW,
            0x29 => SH,
            0x28 => SB,
            0x38 => SC,
            0x04 => BEQ,
            0x05 => BNE,
            0x06 => BLEZ,
            0x07 => BGTZ,
            0x16 => BLTZ,
            0x17 => BGEZ,
            0x02 => J,
            0x03 => JAL,
            _ => return None,
        })
    }

    /// Mnemonic as it appears in assembly source (lower case).
    pub fn mnemonic(self) -> String {
        format!("{:?}", self).to_ascii_lowercase()
    }
}
