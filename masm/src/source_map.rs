//! Side table (§4.8/§7) associating each assembled text word with the source
//! line it came from, for error annotation in batch mode.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceMapItem {
    pub line: u32,
}

pub type SourceMap = Vec<SourceMapItem>;
