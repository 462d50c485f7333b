//! Two-pass instruction assembly (§4.7/§9): pass one walks the text section
//! assigning each expanded instruction an address and defining labels; pass
//! two resolves every symbol reference and encodes the final word.

use mips_vm::{branch_offset, encode_i, encode_j, encode_r, constants, Format, Kind, RegisterId};

use crate::error::{AssembleError, Error, ParseError};
use crate::labels::SymbolTable;
use crate::lexer::{Body, Operand, ParsedLine};
use crate::pseudo::{self, Mode};
use crate::source_map::{SourceMap, SourceMapItem};

struct Pending {
    address: u32,
    line: u32,
    mnemonic: String,
    operands: Vec<Operand>,
}

fn parse_error(line: u32, source: ParseError) -> Error {
    Error::Parse { line, source }
}

fn assemble_error(line: u32, source: AssembleError) -> Error {
    Error::Assemble { line, source }
}

fn operand_at<'a>(line: u32, mnemonic: &str, ops: &'a [Operand], index: usize) -> Result<&'a Operand, Error> {
    ops.get(index).ok_or_else(|| {
        parse_error(
            line,
            ParseError::WrongOperandCount { mnemonic: mnemonic.to_owned(), expected: index + 1, found: ops.len() },
        )
    })
}

fn as_register(line: u32, operand: &Operand) -> Result<RegisterId, Error> {
    match operand {
        Operand::Register(id) => Ok(*id),
        other => Err(parse_error(line, ParseError::MalformedOperand(format!("{:?}", other)))),
    }
}

fn as_immediate(line: u32, operand: &Operand) -> Result<i32, Error> {
    match operand {
        Operand::Immediate(value) => Ok(*value),
        other => Err(parse_error(line, ParseError::MalformedOperand(format!("{:?}", other)))),
    }
}

fn as_indexed(line: u32, operand: &Operand) -> Result<(i32, RegisterId), Error> {
    match operand {
        Operand::Indexed { offset, base } => Ok((*offset, *base)),
        other => Err(parse_error(line, ParseError::MalformedOperand(format!("{:?}", other)))),
    }
}

fn resolve_symbolic_immediate(
    line: u32,
    operand: &Operand,
    symbols: &SymbolTable,
) -> Result<i16, Error> {
    match operand {
        Operand::Immediate(value) => Ok(*value as i16),
        Operand::SymbolHigh(label) => {
            let address = symbols.lookup(label).map_err(|e| assemble_error(line, e))?;
            Ok((address >> 16) as i16)
        }
        Operand::SymbolLow(label) => {
            let address = symbols.lookup(label).map_err(|e| assemble_error(line, e))?;
            Ok((address & 0xFFFF) as i16)
        }
        other => Err(parse_error(line, ParseError::MalformedOperand(format!("{:?}", other)))),
    }
}

fn resolve_branch_target(
    line: u32,
    operand: &Operand,
    pc: u32,
    symbols: &SymbolTable,
) -> Result<i16, Error> {
    let target = match operand {
        Operand::Symbol(label) => symbols.lookup(label).map_err(|e| assemble_error(line, e))?,
        Operand::Immediate(value) => *value as u32,
        other => return Err(parse_error(line, ParseError::MalformedOperand(format!("{:?}", other)))),
    };
    branch_offset(pc, target)
        .ok_or_else(|| assemble_error(line, AssembleError::BranchOutOfRange(format!("{:?}", operand))))
}

fn resolve_jump_target(line: u32, operand: &Operand, symbols: &SymbolTable) -> Result<u32, Error> {
    let target = match operand {
        Operand::Symbol(label) => symbols.lookup(label).map_err(|e| assemble_error(line, e))?,
        Operand::Immediate(value) => *value as u32,
        other => return Err(parse_error(line, ParseError::MalformedOperand(format!("{:?}", other)))),
    };
    Ok(target >> 2)
}

/// Expands pseudoinstructions and assigns addresses, defining every text
/// label along the way. Returns the flattened list of real instructions
/// still waiting on symbol resolution.
fn lay_out(lines: &[(u32, ParsedLine)], symbols: &mut SymbolTable) -> Result<Vec<Pending>, Error> {
    let mut pending = Vec::new();
    let mut address = constants::TEXT_START;

    for (line_no, parsed) in lines {
        if let Some(label) = &parsed.label {
            symbols.define(label, address).map_err(|e| assemble_error(*line_no, e))?;
        }

        let (mnemonic, operands) = match &parsed.body {
            Some(Body::Instruction { mnemonic, operands }) => (mnemonic.clone(), operands.clone()),
            Some(Body::Directive { name, .. }) => {
                return Err(parse_error(*line_no, ParseError::UnknownDirective(name.clone())))
            }
            None => continue,
        };

        let atoms = match pseudo::expand(&mnemonic, &operands, Mode::Batch) {
            Some(result) => result
                .map_err(|e| parse_error(*line_no, e))?
                .into_iter()
                .map(|e| (e.mnemonic.to_owned(), e.operands))
                .collect(),
            None => vec![(mnemonic, operands)],
        };

        for (mnemonic, operands) in atoms {
            pending.push(Pending { address, line: *line_no, mnemonic, operands });
            address += constants::WORD_BYTES;
            if address >= constants::TEXT_START + constants::TEXT_BYTES {
                return Err(assemble_error(*line_no, AssembleError::TextTooLarge));
            }
        }
    }

    Ok(pending)
}

fn encode_one(p: &Pending, symbols: &SymbolTable) -> Result<u32, Error> {
    let kind: Kind = p
        .mnemonic
        .parse()
        .map_err(|_| parse_error(p.line, ParseError::UnknownMnemonic(p.mnemonic.clone())))?;

    use Kind::*;
    let ops = &p.operands;
    let line = p.line;

    let m = &p.mnemonic;
    let op = |i: usize| operand_at(line, m, ops, i);

    Ok(match kind.format() {
        Format::R => match kind {
            ADD | ADDU | SUB | SUBU | AND | OR | XOR | NOR | SLT | SLTU | SEQ => encode_r(
                kind,
                as_register(line, op(1)?)?,
                as_register(line, op(2)?)?,
                as_register(line, op(0)?)?,
                0,
            ),
            SLL | SRL | SRA => encode_r(
                kind,
                RegisterId::ZERO,
                as_register(line, op(1)?)?,
                as_register(line, op(0)?)?,
                as_immediate(line, op(2)?)? as u32 & 0x1F,
            ),
            SLLV | SRLV | SRAV => encode_r(
                kind,
                as_register(line, op(2)?)?,
                as_register(line, op(1)?)?,
                as_register(line, op(0)?)?,
                0,
            ),
            JR | JALR => encode_r(kind, as_register(line, op(0)?)?, RegisterId::ZERO, RegisterId::ZERO, 0),
            DIV | DIVU | MULT | MULTU => {
                encode_r(kind, as_register(line, op(0)?)?, as_register(line, op(1)?)?, RegisterId::ZERO, 0)
            }
            MFHI | MFLO => encode_r(kind, RegisterId::ZERO, RegisterId::ZERO, as_register(line, op(0)?)?, 0),
            // Ambiguity (d): the mthi/mtlo source register lands in the rd slot.
            MTHI | MTLO => encode_r(kind, RegisterId::ZERO, RegisterId::ZERO, as_register(line, op(0)?)?, 0),
            SYSCALL => encode_r(kind, RegisterId::ZERO, RegisterId::ZERO, RegisterId::ZERO, 0),
            _ => unreachable!("non-R kind classified as R format"),
        },
        Format::I => match kind {
            ADDI | ADDIU | ANDI | ORI | XORI | SLTI | SLTIU => encode_i(
                kind,
                as_register(line, op(1)?)?,
                as_register(line, op(0)?)?,
                resolve_symbolic_immediate(line, op(2)?, symbols)?,
            ),
            LUI => encode_i(
                kind,
                RegisterId::ZERO,
                as_register(line, op(0)?)?,
                resolve_symbolic_immediate(line, op(1)?, symbols)?,
            ),
            LW | LB | LBU | LH | LHU | SW | SH | SB | SC => {
                let (offset, base) = as_indexed(line, op(1)?)?;
                encode_i(kind, base, as_register(line, op(0)?)?, offset as i16)
            }
            BEQ | BNE => {
                let rs = as_register(line, op(0)?)?;
                let rt = as_register(line, op(1)?)?;
                let offset = resolve_branch_target(line, op(2)?, p.address, symbols)?;
                encode_i(kind, rs, rt, offset)
            }
            BGTZ | BLEZ | BGEZ | BLTZ => {
                let rs = as_register(line, op(0)?)?;
                let offset = resolve_branch_target(line, op(1)?, p.address, symbols)?;
                encode_i(kind, rs, RegisterId::ZERO, offset)
            }
            _ => unreachable!("non-I kind classified as I format"),
        },
        Format::J => encode_j(kind, resolve_jump_target(line, op(0)?, symbols)?),
    })
}

pub fn assemble_text(lines: &[(u32, ParsedLine)], symbols: &mut SymbolTable) -> Result<(Vec<u32>, SourceMap), Error> {
    let pending = lay_out(lines, symbols)?;
    let mut words = Vec::with_capacity(pending.len());
    let mut source_map = Vec::with_capacity(pending.len());

    for p in &pending {
        words.push(encode_one(p, symbols)?);
        source_map.push(SourceMapItem { line: p.line });
    }

    Ok((words, source_map))
}

/// Encodes one already-parsed line standalone: used by interpreter mode,
/// where each line is expanded and encoded as it is entered rather than in
/// the two-pass batch pipeline. Defines `parsed.label` at `address` if
/// present; every referenced symbol (including the line's own label) must
/// already be resolvable, so backward jumps work but forward ones must be
/// handled by the caller's replay mechanism.
pub fn assemble_one(
    line_no: u32,
    address: u32,
    parsed: &ParsedLine,
    symbols: &mut SymbolTable,
) -> Result<Vec<u32>, Error> {
    if let Some(label) = &parsed.label {
        symbols.define(label, address).map_err(|e| assemble_error(line_no, e))?;
    }

    let (mnemonic, operands) = match &parsed.body {
        Some(Body::Instruction { mnemonic, operands }) => (mnemonic.clone(), operands.clone()),
        Some(Body::Directive { name, .. }) => {
            return Err(parse_error(line_no, ParseError::UnknownDirective(name.clone())))
        }
        None => return Ok(Vec::new()),
    };

    let atoms: Vec<(String, Vec<Operand>)> = match pseudo::expand(&mnemonic, &operands, Mode::Interactive) {
        Some(result) => result
            .map_err(|e| parse_error(line_no, e))?
            .into_iter()
            .map(|e| (e.mnemonic.to_owned(), e.operands))
            .collect(),
        None => vec![(mnemonic, operands)],
    };

    let mut words = Vec::with_capacity(atoms.len());
    let mut pc = address;
    for (mnemonic, operands) in atoms {
        let pending = Pending { address: pc, line: line_no, mnemonic, operands };
        words.push(encode_one(&pending, symbols)?);
        pc += constants::WORD_BYTES;
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::parse_line;

    fn numbered(source: &str) -> Vec<(u32, ParsedLine)> {
        source
            .lines()
            .enumerate()
            .map(|(i, line)| (i as u32 + 1, parse_line(line).unwrap()))
            .collect()
    }

    #[test]
    fn forward_branch_resolves() {
        let lines = numbered("beq $t0, $t1, end\naddi $t2, $zero, 1\nend: addi $t3, $zero, 2\n");
        let mut symbols = SymbolTable::new();
        let (words, map) = assemble_text(&lines, &mut symbols).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn backward_loop_label() {
        let lines = numbered("top: addi $t0, $t0, -1\nbne $t0, $zero, top\n");
        let mut symbols = SymbolTable::new();
        let (words, _) = assemble_text(&lines, &mut symbols).unwrap();
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn undefined_label_is_reported() {
        let lines = numbered("j missing\n");
        let mut symbols = SymbolTable::new();
        assert!(assemble_text(&lines, &mut symbols).is_err());
    }
}
