use std::fmt;
use std::str::FromStr;

/// Which characters terminate a line.
///
/// The discriminants form a bitmask: bit 0 stands for `\r`, bit 1 for `\n`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum LineEnding {
    /// `\r`
    Cr = 1,
    /// `\n`
    #[default]
    Lf = 2,
    /// `\r\n`, a `\r` on its own never ends a line
    CrLf = 3,
    /// either `\r` or `\n`, to recover from files with mixed line endings
    Both = 7,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown line ending {0:?}, expected one of CR, LF, CRLF or Both")]
pub struct UnknownLineEnding(pub String);

impl LineEnding {
    pub const fn bits(self) -> u8 {
        self as u8
    }

    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(LineEnding::Cr),
            2 => Some(LineEnding::Lf),
            3 => Some(LineEnding::CrLf),
            7 => Some(LineEnding::Both),
            _ => None,
        }
    }

    /// Whether a `\r` terminates a line without looking any further.
    pub(crate) fn ends_on_cr(self) -> bool {
        self.bits() & LineEnding::Cr.bits() != 0 && self != LineEnding::CrLf
    }

    /// Whether a `\n` terminates a line, given whether the character before it was a `\r`.
    pub(crate) fn ends_on_lf(self, after_cr: bool) -> bool {
        self.bits() & LineEnding::Lf.bits() != 0 && (self != LineEnding::CrLf || after_cr)
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineEnding::Cr => "CR",
            LineEnding::Lf => "LF",
            LineEnding::CrLf => "CRLF",
            LineEnding::Both => "Both",
        })
    }
}

impl FromStr for LineEnding {
    type Err = UnknownLineEnding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            LineEnding::Cr,
            LineEnding::Lf,
            LineEnding::CrLf,
            LineEnding::Both,
        ]
        .into_iter()
        .find(|le| le.to_string().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| UnknownLineEnding(s.to_owned()))
    }
}
