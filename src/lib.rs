//! Validating UTF-8 decoding and tokenizing of systemd unit files.
//!
//! [`utf8::Utf8Decoder`] turns raw bytes into UTF-16 code units and reports
//! every run of invalid bytes. [`systemd_unit::Tokenizer`] consumes those
//! units and produces positioned tokens. [`systemd_unit::Lexer`] wires both
//! together.

pub mod systemd_unit;
pub mod utf8;

pub use self::systemd_unit::{Lexer, LineEnding, Token, TokenType};
