//! Lexer (§4.1): splits one source line into an optional label, and either a
//! directive or an instruction with its operands. The source language is
//! line-oriented (one statement per line, `#` starts a comment), so a small
//! hand-rolled splitter covers it without pulling in a PEG grammar.

use crate::error::ParseError;
use crate::int_util::parse_i32;
use mips_vm::RegisterId;

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Register(RegisterId),
    Immediate(i32),
    Symbol(String),
    Indexed { offset: i32, base: RegisterId },
    /// Upper 16 bits of a label's address, produced by pseudo-expansion (§4.4).
    SymbolHigh(String),
    /// Lower 16 bits of a label's address, produced by pseudo-expansion (§4.4).
    SymbolLow(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Directive { name: String, args: Vec<String> },
    Instruction { mnemonic: String, operands: Vec<Operand> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedLine {
    pub label: Option<String>,
    pub body: Option<Body>,
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(index) => &line[..index],
        None => line,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '.'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse_register(token: &str) -> Result<RegisterId, ParseError> {
    let name = token
        .strip_prefix('$')
        .ok_or_else(|| ParseError::UnknownRegister(token.to_owned()))?;
    if let Ok(index) = name.parse::<u8>() {
        return RegisterId::from_index(index as u32).ok_or_else(|| ParseError::UnknownRegister(token.to_owned()));
    }
    name.to_ascii_uppercase()
        .parse()
        .map_err(|_| ParseError::UnknownRegister(token.to_owned()))
}

fn parse_char_literal(token: &str) -> Result<i32, ParseError> {
    let inner = token
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(|| ParseError::MalformedOperand(token.to_owned()))?;
    let value = match inner {
        "\\n" => b'\n',
        "\\t" => b'\t',
        "\\v" => 0x0B,
        "\\0" => 0,
        "\\\\" => b'\\',
        "\\'" => b'\'',
        single if single.chars().count() == 1 => single.as_bytes()[0],
        _ => return Err(ParseError::MalformedOperand(token.to_owned())),
    };
    Ok(value as i32)
}

fn parse_operand(token: &str) -> Result<Operand, ParseError> {
    let token = token.trim();
    if token.starts_with('$') {
        return Ok(Operand::Register(parse_register(token)?));
    }
    if token.starts_with('\'') {
        return Ok(Operand::Immediate(parse_char_literal(token)?));
    }
    if let Some(lparen) = token.find('(') {
        let rparen = token
            .strip_suffix(')')
            .ok_or_else(|| ParseError::MalformedOperand(token.to_owned()))?;
        let offset_text = &token[..lparen];
        let base_text = &rparen[lparen + 1..];
        let offset = if offset_text.is_empty() {
            0
        } else {
            parse_i32(offset_text)?
        };
        let base = parse_register(base_text)?;
        return Ok(Operand::Indexed { offset, base });
    }
    let first = token.chars().next().ok_or(ParseError::MalformedOperand(String::new()))?;
    if first.is_ascii_digit() || (first == '-' && token.len() > 1) {
        return Ok(Operand::Immediate(parse_i32(token)?));
    }
    if is_ident_start(first) {
        return Ok(Operand::Symbol(token.to_owned()));
    }
    Err(ParseError::MalformedOperand(token.to_owned()))
}

fn split_operands(text: &str) -> Vec<String> {
    let mut operands = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                operands.push(current.trim().to_owned());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        operands.push(current.trim().to_owned());
    }
    operands
}

/// Parses one physical source line, stripping comments and an optional
/// leading `label:` before classifying the remainder as a directive
/// (leading `.`) or an instruction (`mnemonic operand[, operand]*`).
pub fn parse_line(line: &str) -> Result<ParsedLine, ParseError> {
    let line = strip_comment(line).trim();
    if line.is_empty() {
        return Ok(ParsedLine { label: None, body: None });
    }

    let (label, rest) = match line.find(':') {
        Some(index) => {
            let candidate = line[..index].trim();
            let valid = !candidate.is_empty()
                && candidate.chars().next().map(is_ident_start).unwrap_or(false)
                && candidate.chars().all(is_ident_continue);
            if valid {
                (Some(candidate.to_owned()), line[index + 1..].trim())
            } else {
                (None, line)
            }
        }
        None => (None, line),
    };

    if rest.is_empty() {
        return Ok(ParsedLine { label, body: None });
    }

    let (head, tail) = match rest.find(char::is_whitespace) {
        Some(index) => (&rest[..index], rest[index..].trim()),
        None => (rest, ""),
    };

    let body = if let Some(name) = head.strip_prefix('.') {
        Body::Directive {
            name: name.to_ascii_lowercase(),
            args: split_operands(tail),
        }
    } else {
        let operands = split_operands(tail)
            .iter()
            .map(|token| parse_operand(token))
            .collect::<Result<Vec<_>, _>>()?;
        Body::Instruction {
            mnemonic: head.to_ascii_uppercase(),
            operands,
        }
    };

    Ok(ParsedLine { label, body: Some(body) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mips_vm::RegisterId::*;

    #[test]
    fn label_and_instruction() {
        let parsed = parse_line("loop: addi $t0, $t0, -1  # decrement").unwrap();
        assert_eq!(parsed.label, Some("loop".to_owned()));
        match parsed.body.unwrap() {
            Body::Instruction { mnemonic, operands } => {
                assert_eq!(mnemonic, "ADDI");
                assert_eq!(
                    operands,
                    vec![Operand::Register(T0), Operand::Register(T0), Operand::Immediate(-1)]
                );
            }
            _ => panic!("expected instruction"),
        }
    }

    #[test]
    fn indexed_memory_operand() {
        let parsed = parse_line("lw $t1, -4($sp)").unwrap();
        match parsed.body.unwrap() {
            Body::Instruction { operands, .. } => {
                assert_eq!(operands[1], Operand::Indexed { offset: -4, base: SP });
            }
            _ => panic!("expected instruction"),
        }
    }

    #[test]
    fn directive_line() {
        let parsed = parse_line(".word 1, -2, 0xFF").unwrap();
        match parsed.body.unwrap() {
            Body::Directive { name, args } => {
                assert_eq!(name, "word");
                assert_eq!(args, vec!["1", "-2", "0xFF"]);
            }
            _ => panic!("expected directive"),
        }
    }

    #[test]
    fn comment_only_line_is_empty() {
        let parsed = parse_line("   # nothing here").unwrap();
        assert_eq!(parsed, ParsedLine { label: None, body: None });
    }

    #[test]
    fn char_literal_operand() {
        let parsed = parse_line("li $a0, '\\n'").unwrap();
        match parsed.body.unwrap() {
            Body::Instruction { operands, .. } => {
                assert_eq!(operands[1], Operand::Immediate(b'\n' as i32));
            }
            _ => panic!("expected instruction"),
        }
    }

    #[test]
    fn vertical_tab_char_literal() {
        let parsed = parse_line("li $a0, '\\v'").unwrap();
        match parsed.body.unwrap() {
            Body::Instruction { operands, .. } => {
                assert_eq!(operands[1], Operand::Immediate(0x0B));
            }
            _ => panic!("expected instruction"),
        }
    }

    #[test]
    fn bare_numeric_register() {
        let parsed = parse_line("addi $0, $0, 1").unwrap();
        match parsed.body.unwrap() {
            Body::Instruction { operands, .. } => {
                assert_eq!(operands[0], Operand::Register(ZERO));
            }
            _ => panic!("expected instruction"),
        }
    }
}
