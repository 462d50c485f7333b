//! Pseudo Expander (§4.4): rewrites pseudoinstructions into 1-3 base
//! instructions ahead of encoding, using `$at` as scratch per convention.

use mips_vm::RegisterId;

use crate::error::ParseError;
use crate::lexer::Operand;

pub struct Expanded {
    pub mnemonic: &'static str,
    pub operands: Vec<Operand>,
}

/// Distinguishes the two callers of [`expand`]: interactive mode may elide
/// the `lui` half of `li` when the value fits in 16 bits, while batch mode
/// must always emit the full two-word form so pass-1 pc accounting matches
/// (§4.4).
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Batch,
}

fn fits_u16(value: i32) -> bool {
    (0..=0xFFFF).contains(&value)
}

/// Returns `Some(expansion)` if `mnemonic` is a pseudoinstruction, `None` if
/// it should be encoded directly.
pub fn expand(mnemonic: &str, operands: &[Operand], mode: Mode) -> Option<Result<Vec<Expanded>, ParseError>> {
    let at = Operand::Register(RegisterId::AT);
    let zero = Operand::Register(RegisterId::ZERO);

    Some(Ok(match (mnemonic, operands) {
        ("MOVE", [rd, rs]) => vec![Expanded {
            mnemonic: "ADD",
            operands: vec![rd.clone(), rs.clone(), zero],
        }],

        ("LI", [rd, Operand::Immediate(value)]) if mode == Mode::Interactive && fits_u16(*value) => {
            vec![Expanded {
                mnemonic: "ORI",
                operands: vec![rd.clone(), zero, Operand::Immediate(*value)],
            }]
        }
        // Two-word form: `lui` first since this machine's `lui` overwrites
        // the full register rather than merging into it (see DESIGN.md), so
        // `ori` must come second to fill in the low bits.
        ("LI", [rd, Operand::Immediate(value)]) => vec![
            Expanded {
                mnemonic: "LUI",
                operands: vec![rd.clone(), Operand::Immediate(*value >> 16)],
            },
            Expanded {
                mnemonic: "ORI",
                operands: vec![rd.clone(), rd.clone(), Operand::Immediate(*value & 0xFFFF)],
            },
        ],

        ("LA", [rd, Operand::Symbol(label)]) => vec![
            Expanded {
                mnemonic: "LUI",
                operands: vec![rd.clone(), Operand::SymbolHigh(label.clone())],
            },
            Expanded {
                mnemonic: "ORI",
                operands: vec![rd.clone(), rd.clone(), Operand::SymbolLow(label.clone())],
            },
        ],

        ("LW", [rd, Operand::Symbol(label)]) => vec![
            Expanded {
                mnemonic: "LUI",
                operands: vec![at.clone(), Operand::SymbolHigh(label.clone())],
            },
            Expanded {
                mnemonic: "ORI",
                operands: vec![at.clone(), at.clone(), Operand::SymbolLow(label.clone())],
            },
            Expanded {
                mnemonic: "LW",
                operands: vec![rd.clone(), Operand::Indexed { offset: 0, base: RegisterId::AT }],
            },
        ],

        ("BLT", [rs, rt, label @ Operand::Symbol(_)]) => vec![
            Expanded { mnemonic: "SLT", operands: vec![at.clone(), rs.clone(), rt.clone()] },
            Expanded { mnemonic: "BNE", operands: vec![at, zero, label.clone()] },
        ],
        ("BLE", [rs, rt, label @ Operand::Symbol(_)]) => vec![
            Expanded { mnemonic: "SLT", operands: vec![at.clone(), rt.clone(), rs.clone()] },
            Expanded { mnemonic: "BEQ", operands: vec![at, zero, label.clone()] },
        ],
        ("BGT", [rs, rt, label @ Operand::Symbol(_)]) => vec![
            Expanded { mnemonic: "SLT", operands: vec![at.clone(), rt.clone(), rs.clone()] },
            Expanded { mnemonic: "BNE", operands: vec![at, zero, label.clone()] },
        ],
        ("BGE", [rs, rt, label @ Operand::Symbol(_)]) => vec![
            Expanded { mnemonic: "SLT", operands: vec![at.clone(), rs.clone(), rt.clone()] },
            Expanded { mnemonic: "BEQ", operands: vec![at, zero, label.clone()] },
        ],

        _ if matches!(mnemonic, "MOVE" | "LI" | "LA" | "LW" | "BLT" | "BLE" | "BGT" | "BGE") => {
            return Some(Err(ParseError::WrongOperandCount {
                mnemonic: mnemonic.to_owned(),
                expected: 2,
                found: operands.len(),
            }))
        }

        _ => return None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mips_vm::RegisterId::*;

    #[test]
    fn li_small_value_is_one_instruction_in_interactive_mode() {
        let expanded = expand("LI", &[Operand::Register(T0), Operand::Immediate(5)], Mode::Interactive)
            .unwrap()
            .unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].mnemonic, "ORI");
    }

    #[test]
    fn li_small_value_is_still_two_instructions_in_batch_mode() {
        let expanded = expand("LI", &[Operand::Register(T0), Operand::Immediate(5)], Mode::Batch)
            .unwrap()
            .unwrap();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].mnemonic, "LUI");
        assert_eq!(expanded[1].mnemonic, "ORI");
    }

    #[test]
    fn li_negative_value_is_two_instructions() {
        let expanded = expand("LI", &[Operand::Register(T0), Operand::Immediate(-1)], Mode::Interactive)
            .unwrap()
            .unwrap();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].mnemonic, "LUI");
        assert_eq!(expanded[1].mnemonic, "ORI");
    }

    #[test]
    fn li_large_value_is_two_instructions() {
        let expanded = expand(
            "LI",
            &[Operand::Register(T0), Operand::Immediate(0x0001_0000)],
            Mode::Interactive,
        )
        .unwrap()
        .unwrap();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].mnemonic, "LUI");
        assert_eq!(expanded[1].mnemonic, "ORI");
    }

    #[test]
    fn blt_expands_to_slt_and_bne() {
        let expanded = expand(
            "BLT",
            &[Operand::Register(T0), Operand::Register(T1), Operand::Symbol("end".to_owned())],
            Mode::Batch,
        )
        .unwrap()
        .unwrap();
        assert_eq!(expanded[0].mnemonic, "SLT");
        assert_eq!(expanded[1].mnemonic, "BNE");
    }

    #[test]
    fn non_pseudo_mnemonic_is_not_expanded() {
        assert!(expand("ADD", &[], Mode::Batch).is_none());
    }
}
