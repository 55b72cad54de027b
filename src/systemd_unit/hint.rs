use std::fmt;

/// What went wrong, stored in bits 0-1 of a [`Hint`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum SyntaxErrorKind {
    NotASyntaxError = 0,
    MissingIdentifier = 1,
    UnterminatedItem = 2,
    IllegalCharacter = 3,
}

/// Where in the grammar it went wrong, stored in bits 2-3 of a [`Hint`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum TokenContext {
    Space = 0,
    Key = 4,
    Value = 8,
    Section = 12,
}

impl SyntaxErrorKind {
    pub const MASK: u8 = 0x3;

    pub const fn from_bits(bits: u8) -> Self {
        match bits & Self::MASK {
            0 => SyntaxErrorKind::NotASyntaxError,
            1 => SyntaxErrorKind::MissingIdentifier,
            2 => SyntaxErrorKind::UnterminatedItem,
            _ => SyntaxErrorKind::IllegalCharacter,
        }
    }
}

impl TokenContext {
    pub const MASK: u8 = 0xC;

    pub const fn from_bits(bits: u8) -> Self {
        match bits & Self::MASK {
            0 => TokenContext::Space,
            4 => TokenContext::Key,
            8 => TokenContext::Value,
            _ => TokenContext::Section,
        }
    }
}

/// Packs a [`SyntaxErrorKind`] and a [`TokenContext`] into a single integer.
///
/// The bit layout is part of the public contract so that consumers can
/// filter on the raw value: `kind = bits & 0x3`, `context = bits & 0xC`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Hint(u8);

impl Hint {
    pub const fn new(kind: SyntaxErrorKind, context: TokenContext) -> Self {
        Self(kind as u8 | context as u8)
    }

    /// Bits outside of the kind and context masks are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & (SyntaxErrorKind::MASK | TokenContext::MASK))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn error_kind(self) -> SyntaxErrorKind {
        SyntaxErrorKind::from_bits(self.0)
    }

    pub const fn context(self) -> TokenContext {
        TokenContext::from_bits(self.0)
    }
}

impl From<Hint> for u8 {
    fn from(hint: Hint) -> Self {
        hint.bits()
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.error_kind() {
            SyntaxErrorKind::NotASyntaxError => "whitespace",
            SyntaxErrorKind::MissingIdentifier => "missing identifier",
            SyntaxErrorKind::UnterminatedItem => "unterminated item",
            SyntaxErrorKind::IllegalCharacter => "illegal character",
        };
        let context = match self.context() {
            TokenContext::Space => "space",
            TokenContext::Key => "key",
            TokenContext::Value => "value",
            TokenContext::Section => "section",
        };
        write!(f, "{kind} in {context}")
    }
}
