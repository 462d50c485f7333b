//! Assembler front end for the MIPS-I instruction subset implemented by the
//! [mips_vm] crate.
//!
//! A source file has a `.data` section (processed by [`data`]) followed by a
//! `.text` section (processed by [`instructions`]); both are optional, and
//! whichever section directive appears most recently determines where
//! following lines land. [`assemble`] runs the whole two-pass batch pipeline;
//! [`instructions::assemble_one`] supports the interpreter's line-at-a-time
//! mode instead.

pub mod data;
pub mod error;
pub mod instructions;
pub mod int_util;
pub mod labels;
pub mod lexer;
pub mod pseudo;
pub mod source_map;

use mips_vm::constants;

pub use error::{AssembleError, Error, ParseError, Result};
pub use labels::SymbolTable;
pub use lexer::{parse_line, Body, Operand, ParsedLine};
pub use source_map::{SourceMap, SourceMapItem};

/// The assembled program: the data segment's initial bytes, the text
/// segment's encoded words, and the `.globl` entrypoint address, ready to be
/// loaded into an [`mips_vm::AddressSpace`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub data: Vec<u8>,
    pub text: Vec<u32>,
    pub entrypoint: u32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Data,
    Text,
}

/// Assembles a complete source file in batch mode (§4.7): both passes run to
/// completion, so labels may be referenced before they are defined.
pub fn assemble(source: &str) -> Result<(Program, SymbolTable, SourceMap)> {
    let mut symbols = SymbolTable::new();
    let mut data_lines = Vec::new();
    let mut text_lines = Vec::new();
    let mut section = None;

    for (index, raw_line) in source.lines().enumerate() {
        let line_no = index as u32 + 1;
        let parsed =
            parse_line(raw_line).map_err(|source| Error::Parse { line: line_no, source })?;

        match &parsed.body {
            Some(Body::Directive { name, .. }) if name == "data" => {
                section = Some(Section::Data);
                continue;
            }
            Some(Body::Directive { name, .. }) if name == "text" => {
                section = Some(Section::Text);
                continue;
            }
            Some(Body::Directive { name, args }) if name == "globl" => {
                let label = args
                    .first()
                    .ok_or_else(|| Error::Parse {
                        line: line_no,
                        source: ParseError::WrongOperandCount {
                            mnemonic: ".globl".to_owned(),
                            expected: 1,
                            found: 0,
                        },
                    })?;
                symbols
                    .set_entrypoint(label)
                    .map_err(|source| Error::Assemble { line: line_no, source })?;
                continue;
            }
            _ => {}
        }

        match section {
            Some(Section::Data) => data_lines.push((line_no, parsed)),
            Some(Section::Text) => text_lines.push((line_no, parsed)),
            None => continue,
        }
    }

    let mut data_bytes = Vec::new();
    for (line_no, parsed) in &data_lines {
        if let Some(label) = &parsed.label {
            symbols
                .define(label, constants::DATA_START + data_bytes.len() as u32)
                .map_err(|source| Error::Assemble { line: *line_no, source })?;
        }
        if let Some(Body::Directive { name, args }) = &parsed.body {
            data::write_element(&mut data_bytes, name, args)
                .map_err(|source| Error::Parse { line: *line_no, source })?;
        }
    }
    data::check_capacity(data_bytes.len(), constants::DATA_BYTES)
        .map_err(|source| Error::Assemble { line: 0, source })?;

    let (text, source_map) = instructions::assemble_text(&text_lines, &mut symbols)?;
    let entrypoint = symbols.entrypoint().map_err(|source| Error::Assemble { line: 0, source })?;

    Ok((Program { data: data_bytes, text, entrypoint }, symbols, source_map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_data_and_text_sections() {
        let source = ".data\ngreeting: .word 42\n.text\n.globl main\nmain: lw $t0, greeting\nj end\nend: syscall\n";
        let (program, symbols, source_map) = assemble(source).unwrap();
        assert_eq!(program.data, vec![0, 0, 0, 42]);
        assert_eq!(program.text.len(), 4);
        assert_eq!(source_map.len(), 4);
        assert_eq!(symbols.lookup("greeting").unwrap(), constants::DATA_START);
        assert_eq!(program.entrypoint, constants::TEXT_START);
    }

    #[test]
    fn unresolved_label_surfaces_as_error() {
        let source = ".data\n.text\n.globl main\nmain: j nowhere\n";
        assert!(assemble(source).is_err());
    }

    #[test]
    fn missing_entrypoint_is_an_error() {
        let source = ".data\n.text\nmain: syscall\n";
        assert!(assemble(source).is_err());
    }
}
