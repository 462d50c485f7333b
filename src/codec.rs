//! Encoder (§4.5) and decoder (§4.6): the two halves of the bit-level contract
//! that both the assembler and the execution engine rely on.

use crate::constants::*;
use crate::kind::{Format, Kind, RegisterId};

fn reg(id: RegisterId) -> u32 {
    id.index() as u32
}

/// Builds an R-format word: `opcode(0) | rs | rt | rd | shamt | funct`.
///
/// The three register slots are named by bit position, not by role — callers
/// decide which MIPS operand (source, target, shift-amount source, ...) goes
/// into which slot, since several instructions (`mthi`/`mtlo` notably) bind a
/// slot to a non-obvious operand. See DESIGN.md for the `mthi`/`mtlo` case.
pub fn encode_r(kind: Kind, rs: RegisterId, rt: RegisterId, rd: RegisterId, shamt: u32) -> u32 {
    let funct = kind.funct().expect("encode_r called with non-R kind");
    (reg(rs) << RS_OFFSET & RS_MASK)
        | (reg(rt) << RT_OFFSET & RT_MASK)
        | (reg(rd) << RD_OFFSET & RD_MASK)
        | ((shamt << SHAMT_OFFSET) & SHAMT_MASK)
        | (funct & FUNCT_MASK)
}

/// Builds an I-format word: `opcode | rs | rt | immediate`.
pub fn encode_i(kind: Kind, rs: RegisterId, rt: RegisterId, immediate: i16) -> u32 {
    (kind.opcode() << OPCODE_OFFSET & OPCODE_MASK)
        | (reg(rs) << RS_OFFSET & RS_MASK)
        | (reg(rt) << RT_OFFSET & RT_MASK)
        | ((immediate as u16 as u32) & IMMEDIATE_MASK)
}

/// Builds a J-format word: `opcode | address[26]`.
///
/// `address` is the pre-shifted 26-bit jump target (i.e. `target_addr >> 2`).
pub fn encode_j(kind: Kind, address: u32) -> u32 {
    (kind.opcode() << OPCODE_OFFSET & OPCODE_MASK) | (address & ADDRESS_MASK)
}

/// Encodes a branch whose target is `target_addr`, executed from `pc`.
///
/// Implements ambiguity resolution (c) from DESIGN.md: the signed word
/// distance is computed first, then truncated to `i16`. Returns `None` if the
/// distance does not fit (branch target out of single-word range).
pub fn branch_offset(pc: u32, target_addr: u32) -> Option<i16> {
    let distance = (target_addr as i64 - pc as i64) >> 2;
    if distance < i16::MIN as i64 || distance > i16::MAX as i64 {
        None
    } else {
        Some(distance as i16)
    }
}

/// A decoded instruction word: the kind plus every field position, populated
/// regardless of whether the kind actually uses that field.
#[derive(Clone, Copy, Debug)]
pub struct Decoded {
    pub kind: Kind,
    pub rs: RegisterId,
    pub rt: RegisterId,
    pub rd: RegisterId,
    pub shamt: u32,
    pub immediate: i16,
    /// Pre-shifted 26-bit jump target (J-format only).
    pub address: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeError {
    pub word: u32,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "unsupported target encoding: {:#010x}", self.word)
    }
}

impl std::error::Error for DecodeError {}

/// Inverts the encoder: classifies `word` by `opcode` (and `funct` when
/// `opcode == 0`) and extracts every field position.
pub fn decode(word: u32) -> Result<Decoded, DecodeError> {
    let opcode = (word & OPCODE_MASK) >> OPCODE_OFFSET;
    let rs_bits = (word & RS_MASK) >> RS_OFFSET;
    let rt_bits = (word & RT_MASK) >> RT_OFFSET;
    let rd_bits = (word & RD_MASK) >> RD_OFFSET;
    let shamt = (word & SHAMT_MASK) >> SHAMT_OFFSET;
    let funct = word & FUNCT_MASK;

    let kind = if opcode == 0 {
        Kind::from_funct(funct)
    } else {
        Kind::from_opcode(opcode)
    }
    .ok_or(DecodeError { word })?;

    let rs = RegisterId::from_index(rs_bits).ok_or(DecodeError { word })?;
    let rt = RegisterId::from_index(rt_bits).ok_or(DecodeError { word })?;
    let rd = RegisterId::from_index(rd_bits).ok_or(DecodeError { word })?;

    let immediate = (word & IMMEDIATE_MASK) as u16 as i16;
    let address = word & ADDRESS_MASK;

    debug_assert_eq!(kind.format() == Format::J, matches!(kind, Kind::J | Kind::JAL));

    Ok(Decoded {
        kind,
        rs,
        rt,
        rd,
        shamt,
        immediate,
        address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::RegisterId::*;

    #[test]
    fn round_trip_r_type() {
        let word = encode_r(Kind::ADD, T0, T1, T2, 0);
        let decoded = decode(word).unwrap();
        assert_eq!(decoded.kind, Kind::ADD);
        assert_eq!(decoded.rs, T0);
        assert_eq!(decoded.rt, T1);
        assert_eq!(decoded.rd, T2);
    }

    #[test]
    fn round_trip_shift_immediate() {
        let word = encode_r(Kind::SLL, ZERO, T1, T0, 4);
        let decoded = decode(word).unwrap();
        assert_eq!(decoded.kind, Kind::SLL);
        assert_eq!(decoded.shamt, 4);
        assert_eq!(decoded.rt, T1);
        assert_eq!(decoded.rd, T0);
    }

    #[test]
    fn round_trip_i_type() {
        let word = encode_i(Kind::ADDI, T1, T0, -4);
        let decoded = decode(word).unwrap();
        assert_eq!(decoded.kind, Kind::ADDI);
        assert_eq!(decoded.rs, T1);
        assert_eq!(decoded.rt, T0);
        assert_eq!(decoded.immediate, -4);
    }

    #[test]
    fn round_trip_j_type() {
        let word = encode_j(Kind::J, 0x1234);
        let decoded = decode(word).unwrap();
        assert_eq!(decoded.kind, Kind::J);
        assert_eq!(decoded.address, 0x1234);
    }

    #[test]
    fn unsupported_funct_is_rejected() {
        let word = 0x3F; // opcode 0, funct 0x3F is unused
        assert!(decode(word).is_err());
    }

    #[test]
    fn branch_offset_round_trips() {
        let pc = TEXT_START;
        let target = TEXT_START - 8;
        let offset = branch_offset(pc, target).unwrap();
        assert_eq!(offset, -2);
        assert_eq!((pc as i64 + ((offset as i64) << 2)) as u32, target);
    }

    #[test]
    fn mthi_mtlo_bind_source_to_rd_slot() {
        // Ambiguity (d): mthi/mtlo take their source register from the `rd`
        // bit position, not `rs`.
        let word = encode_r(Kind::MTHI, ZERO, ZERO, T3, 0);
        let decoded = decode(word).unwrap();
        assert_eq!(decoded.rd, T3);
    }
}
