use std::fmt;
use std::ops::ControlFlow;

use super::Hint;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenType {
    Section,    // [name]
    Key,        // name=
    Value,      // =text
    Comment,    // #... or ;...
    Space(Hint),
    SyntaxError(Hint),
    /// Reserved for include directives, never produced by the current grammar
    Include,
}

/// A token together with the position of its first character.
///
/// Lines and columns start at 1. Columns count UTF-16 code units, with a
/// surrogate pair counting as a single column.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
    pub content: String,
}

impl Token {
    pub fn new<S: Into<String>>(
        token_type: TokenType,
        line: usize,
        column: usize,
        content: S,
    ) -> Self {
        Self {
            token_type,
            line,
            column,
            content: content.into(),
        }
    }

    pub fn hint(&self) -> Option<Hint> {
        match self.token_type {
            TokenType::Space(hint) | TokenType::SyntaxError(hint) => Some(hint),
            _ => None,
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self.token_type, TokenType::SyntaxError(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_type {
            TokenType::Space(hint) | TokenType::SyntaxError(hint) => write!(
                f,
                "{}:{} {} {:?}",
                self.line, self.column, hint, self.content
            ),
            token_type => write!(
                f,
                "{}:{} {token_type:?} {:?}",
                self.line, self.column, self.content
            ),
        }
    }
}

/// Receives the tokens a [`super::Tokenizer`] produces.
///
/// Returning [`ControlFlow::Break`] cancels tokenizing, and the decoder
/// feeding the tokenizer with it.
pub trait TokenSink {
    fn token(&mut self, token: Token) -> ControlFlow<()>;

    /// Invalid UTF-8 found by the decoder driving the tokenizer.
    fn invalid_bytes(
        &mut self,
        _bytes: &[u8],
        _relative_offset: u64,
        _absolute_offset: u64,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn done(&mut self) {}
}

impl TokenSink for Vec<Token> {
    fn token(&mut self, token: Token) -> ControlFlow<()> {
        self.push(token);
        ControlFlow::Continue(())
    }
}

impl<S: TokenSink + ?Sized> TokenSink for &mut S {
    fn token(&mut self, token: Token) -> ControlFlow<()> {
        (**self).token(token)
    }

    fn invalid_bytes(
        &mut self,
        bytes: &[u8],
        relative_offset: u64,
        absolute_offset: u64,
    ) -> ControlFlow<()> {
        (**self).invalid_bytes(bytes, relative_offset, absolute_offset)
    }

    fn done(&mut self) {
        (**self).done()
    }
}
