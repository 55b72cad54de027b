mod classifier;
mod line_counter;

use log::{debug, trace};

use std::ops::ControlFlow;

use self::classifier::{Classifier, TokenClass};
use self::line_counter::{LineCounter, CR};
use super::{Hint, LineEnding, SyntaxErrorKind, Token, TokenContext, TokenSink, TokenType};
use crate::utf8::{DecodeSink, DecodeStatus};

const BACKSLASH: u16 = b'\\' as u16;
const LINE_CONTINUATION_REPLACEMENT: u16 = b' ' as u16;

fn token_context(class: TokenClass) -> TokenContext {
    match class {
        TokenClass::Syntax | TokenClass::Key => TokenContext::Key,
        TokenClass::Section => TokenContext::Section,
        TokenClass::Value => TokenContext::Value,
        _ => TokenContext::Space,
    }
}

/// Turns a stream of UTF-16 code units into unit file tokens.
///
/// Characters are pushed one at a time with [`Tokenizer::receive`] (or
/// [`Tokenizer::receive_pair`] for surrogate pairs), followed by a single
/// call to [`Tokenizer::end`]. Tokens are handed to the sink as soon as they
/// are complete. Syntax errors never stop tokenizing, the tokenizer picks up
/// again at the start of the next line.
#[derive(Debug)]
pub struct Tokenizer<S> {
    sink: S,
    counter: LineCounter,
    classifier: Classifier,
    /// class of the token currently being accumulated
    class: TokenClass,
    /// classifier bias when the current token was started
    context: TokenClass,
    token: Vec<u16>,
    token_line: usize,
    token_column: usize,
    cancelled: bool,
}

impl<S: TokenSink> Tokenizer<S> {
    pub fn new(line_ending: LineEnding, sink: S) -> Self {
        let mut tokenizer = Self {
            sink,
            counter: LineCounter::new(line_ending),
            classifier: Classifier::new(),
            class: TokenClass::Syntax,
            context: TokenClass::Syntax,
            token: Vec::new(),
            token_line: 0,
            token_column: 0,
            cancelled: false,
        };
        tokenizer.mark_line_start();
        tokenizer
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Whether the sink asked to stop. All further input is ignored.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn receive(&mut self, c: u16) {
        if self.cancelled {
            return;
        }

        let retrace = self.counter.retrace_cr();
        if self.counter.push(c) {
            self.new_line();
        } else {
            self.retrace(retrace);
            // a '\r' is held back until we know whether a '\n' follows
            if c != CR {
                self.append(c);
            }
        }
    }

    pub fn receive_pair(&mut self, first: u16, second: u16) {
        if self.cancelled {
            return;
        }

        let retrace = self.counter.retrace_cr();
        self.counter.push_pair();
        self.retrace(retrace);

        let class = self.classifier.classify_pair(first, second);
        self.update(class);
        self.token.extend([first, second]);
    }

    /// Pushes all characters of `data`.
    pub fn receive_str(&mut self, data: &str) {
        let mut buf = [0u16; 2];
        for c in data.chars() {
            if self.cancelled {
                break;
            }
            match *c.encode_utf16(&mut buf) {
                [first, second] => self.receive_pair(first, second),
                [unit] => self.receive(unit),
                _ => {}
            }
        }
    }

    /// Flushes the last token and signals `done` to the sink.
    pub fn end(&mut self) {
        if self.cancelled {
            return;
        }

        let pending_cr = self.counter.pending_cr();
        self.retrace(pending_cr);
        self.flush();

        if !self.cancelled {
            self.sink.done();
        }
    }

    fn append(&mut self, c: u16) {
        let class = self
            .classifier
            .classify(char::from_u32(u32::from(c)).unwrap_or(char::REPLACEMENT_CHARACTER));
        self.update(class);
        self.token.push(c);
    }

    /// Hands a held back '\r' to the classifier after all.
    fn retrace(&mut self, pending_cr: bool) {
        if pending_cr {
            self.append(CR);
            self.counter.retrace_fix_count();
        }
    }

    fn update(&mut self, class: TokenClass) {
        if class != self.class {
            self.report();
            self.mark();
            self.class = class;
            self.context = self.classifier.bias();
        }
    }

    fn mark(&mut self) {
        self.token_line = self.counter.line();
        self.token_column = self.counter.column();
        self.token.clear();
    }

    fn mark_line_start(&mut self) {
        self.token_line = self.counter.line();
        self.token_column = 1;
        self.token.clear();
    }

    fn new_line(&mut self) {
        if self.class == TokenClass::Value && self.token.last() == Some(&BACKSLASH) {
            // line continuation, the value keeps its position
            self.token.pop();
            self.token.push(LINE_CONTINUATION_REPLACEMENT);
            self.classifier.reset_to_value();
        } else {
            self.flush();
            self.class = TokenClass::Syntax;
            self.context = TokenClass::Syntax;
            self.classifier.reset_to_new_line();
            self.mark_line_start();
        }
    }

    fn flush(&mut self) {
        let line = self.token_line;
        let end_column = self.token_column + self.token.len();

        match self.class {
            TokenClass::Section => {
                self.report();
                self.report_token(TokenClass::Syntax, TokenClass::Section, "]", line, end_column);
            }
            TokenClass::Key => {
                self.report();
                self.report_token(TokenClass::Syntax, TokenClass::Key, "=", line, end_column);
            }
            TokenClass::Space => {
                self.report();
                // nothing but whitespace after '='
                if self.classifier.bias() == TokenClass::Value {
                    self.report_token(TokenClass::Value, TokenClass::Value, "", line, end_column);
                }
            }
            TokenClass::Error | TokenClass::Value | TokenClass::Comment => self.report(),
            TokenClass::Syntax => match self.classifier.bias() {
                // a lone '['
                TokenClass::Section => {
                    let column = self.token_column;
                    self.report_token(TokenClass::Syntax, TokenClass::Section, "[", line, column);
                }
                bias @ (TokenClass::Comment | TokenClass::Value) => {
                    self.report_token(bias, bias, "", line, end_column);
                }
                _ => {}
            },
        }
    }

    fn report(&mut self) {
        if self.class != TokenClass::Syntax {
            let content = String::from_utf16_lossy(&self.token);
            let (line, column) = (self.token_line, self.token_column);
            self.report_token(self.class, self.context, &content, line, column);
        }
    }

    fn report_token(
        &mut self,
        class: TokenClass,
        context: TokenClass,
        content: &str,
        line: usize,
        column: usize,
    ) {
        if self.cancelled {
            return;
        }

        let token_type = match class {
            TokenClass::Error => TokenType::SyntaxError(Hint::new(
                SyntaxErrorKind::IllegalCharacter,
                token_context(context),
            )),
            TokenClass::Syntax if content == "[" => TokenType::SyntaxError(Hint::new(
                SyntaxErrorKind::MissingIdentifier,
                TokenContext::Section,
            )),
            TokenClass::Syntax => TokenType::SyntaxError(Hint::new(
                SyntaxErrorKind::UnterminatedItem,
                token_context(context),
            )),
            TokenClass::Space => TokenType::Space(Hint::new(
                SyntaxErrorKind::NotASyntaxError,
                token_context(context),
            )),
            TokenClass::Key => TokenType::Key,
            TokenClass::Value => TokenType::Value,
            TokenClass::Section => TokenType::Section,
            TokenClass::Comment => TokenType::Comment,
        };

        let token = Token::new(token_type, line, column, content);
        trace!("{token}");

        if self.sink.token(token).is_break() {
            debug!("tokenizing cancelled at {line}:{column}");
            self.cancelled = true;
        }
    }

    fn flow(&self) -> ControlFlow<()> {
        if self.cancelled {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

impl<S: TokenSink> DecodeSink for Tokenizer<S> {
    fn character(&mut self, unit: u16) -> ControlFlow<()> {
        self.receive(unit);
        self.flow()
    }

    fn pair(&mut self, first: u16, second: u16) -> ControlFlow<()> {
        self.receive_pair(first, second);
        self.flow()
    }

    fn invalid_bytes(
        &mut self,
        bytes: &[u8],
        relative_offset: u64,
        absolute_offset: u64,
    ) -> ControlFlow<()> {
        if !self.cancelled
            && self
                .sink
                .invalid_bytes(bytes, relative_offset, absolute_offset)
                .is_break()
        {
            self.cancelled = true;
        }
        self.flow()
    }

    fn finished(&mut self, status: DecodeStatus) {
        match status {
            DecodeStatus::Done | DecodeStatus::DoneWithInvalidBytes => self.end(),
            DecodeStatus::Failed | DecodeStatus::Cancelled => {
                debug!("decoding ended early ({status:?}), last token is not flushed")
            }
        }
    }
}
