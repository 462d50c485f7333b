use std::{error::Error, fmt};

/// Byte order used for the data segment and for decoding loaded/stored words.
///
/// The simulator stores multi-byte values big-endian: the most significant
/// byte lives at the lowest address.
pub type Endian = byteorder::BigEndian;

pub trait InteropGetName {
    fn interop_name(&self) -> &'static [u8];
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ParseEnumError {
    pub value: String,
    pub enum_name: &'static str,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Failed to parse \"{}\" as {}.",
            &self.value, &self.enum_name
        )
    }
}

impl Error for ParseEnumError {
    fn description(&self) -> &str {
        "Failed to parse enum."
    }
}

pub trait EnumFromStr: Sized {
    fn from_str(s: &str) -> Result<Self, ParseEnumError>;
}
