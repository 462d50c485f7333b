//! Data-Segment Writer (§4.3): lays out `.word`/`.half`/`.byte`/`.space`/
//! `.ascii` directives into the flat byte buffer that becomes the data
//! region's initial contents, big-endian per ambiguity resolution (a).

use byteorder::ByteOrder;
use util::Endian;

use crate::error::{AssembleError, ParseError};
use crate::int_util::parse_int;

/// Decodes the escapes recognized inside a `.ascii`/`.asciiz` string literal
/// (§4.3): `\0`, `\\`, `\v`, `\n`, `\t`, `\"`.
fn unescape(literal: &str) -> Result<Vec<u8>, ParseError> {
    let mut out = Vec::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c as u8);
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| ParseError::MalformedOperand(literal.to_owned()))?;
        out.push(match escaped {
            '0' => 0,
            '\\' => b'\\',
            'v' => 0x0B,
            'n' => b'\n',
            't' => b'\t',
            '"' => b'"',
            _ => return Err(ParseError::MalformedOperand(literal.to_owned())),
        });
    }
    Ok(out)
}

pub fn write_element(buffer: &mut Vec<u8>, name: &str, args: &[String]) -> Result<(), ParseError> {
    match name {
        "word" => {
            for arg in args {
                let value = parse_int(arg)?;
                let mut bytes = [0u8; 4];
                Endian::write_u32(&mut bytes, value as u32);
                buffer.extend_from_slice(&bytes);
            }
        }
        "half" => {
            for arg in args {
                let value = parse_int(arg)?;
                let mut bytes = [0u8; 2];
                Endian::write_u16(&mut bytes, value as u16);
                buffer.extend_from_slice(&bytes);
            }
        }
        "byte" => {
            for arg in args {
                let value = parse_int(arg)?;
                buffer.push(value as u8);
            }
        }
        "space" => {
            let size = args
                .first()
                .ok_or_else(|| ParseError::MalformedOperand(".space needs a size".to_owned()))?;
            let size = parse_int(size)? as usize;
            buffer.resize(buffer.len() + size, 0);
        }
        "ascii" | "asciiz" => {
            let literal = args
                .first()
                .ok_or_else(|| ParseError::MalformedOperand(".ascii needs a string".to_owned()))?;
            let unquoted = literal
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .ok_or(ParseError::UnterminatedString)?;
            buffer.extend_from_slice(&unescape(unquoted)?);
            if name == "asciiz" {
                buffer.push(0);
            }
        }
        other => return Err(ParseError::UnknownDirective(other.to_owned())),
    }
    Ok(())
}

pub fn check_capacity(len: usize, capacity: u32) -> Result<(), AssembleError> {
    if len as u64 > capacity as u64 {
        Err(AssembleError::DataTooLarge)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_is_big_endian() {
        let mut buffer = Vec::new();
        write_element(&mut buffer, "word", &["0x12345678".to_owned()]).unwrap();
        assert_eq!(buffer, vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn half_is_big_endian() {
        let mut buffer = Vec::new();
        write_element(&mut buffer, "half", &["0x1234".to_owned()]).unwrap();
        assert_eq!(buffer, vec![0x12, 0x34]);
    }

    #[test]
    fn space_zero_fills() {
        let mut buffer = Vec::new();
        write_element(&mut buffer, "space", &["4".to_owned()]).unwrap();
        assert_eq!(buffer, vec![0, 0, 0, 0]);
    }

    #[test]
    fn ascii_without_terminator() {
        let mut buffer = Vec::new();
        write_element(&mut buffer, "ascii", &["\"hi\"".to_owned()]).unwrap();
        assert_eq!(buffer, b"hi");
    }

    #[test]
    fn asciiz_decodes_newline_escape() {
        let mut buffer = Vec::new();
        write_element(&mut buffer, "asciiz", &["\"Hi\\n\"".to_owned()]).unwrap();
        assert_eq!(buffer, vec![b'H', b'i', b'\n', 0]);
    }
}
