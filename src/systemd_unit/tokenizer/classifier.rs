/// Grammatical class of a character, or of the token it belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum TokenClass {
    Section,
    Key,
    Value,
    Space,
    Comment,
    Syntax,
    Error,
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

// XDG Desktop Entry Specification: only A-Za-z0-9- may be used in key names
fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

// XDG Desktop Entry Specification: any ASCII character except [ and ] and control characters
fn is_section_char(c: char) -> bool {
    (' '..='~').contains(&c) && c != '[' && c != ']'
}

fn is_surrogate(unit: u16) -> bool {
    (0xD800..=0xDFFF).contains(&unit)
}

/// Classifies characters against the class expected next (the bias).
///
/// `start_char` carries a different meaning depending on the bias:
/// - Section: at least one name character was seen, so `]` may close it
/// - Key: whitespace was seen, anything but more whitespace or `=` is trailing garbage
/// - Value: a non-whitespace character was seen, whitespace is content from now on
#[derive(Debug)]
pub(super) struct Classifier {
    bias: TokenClass,
    start_char: bool,
}

impl Classifier {
    pub(super) fn new() -> Self {
        Self {
            bias: TokenClass::Syntax,
            start_char: false,
        }
    }

    pub(super) fn bias(&self) -> TokenClass {
        self.bias
    }

    pub(super) fn reset_to_new_line(&mut self) {
        self.bias = TokenClass::Syntax;
        self.start_char = false;
    }

    pub(super) fn reset_to_value(&mut self) {
        self.bias = TokenClass::Value;
    }

    pub(super) fn classify(&mut self, c: char) -> TokenClass {
        let syntax = match c {
            '[' if self.bias == TokenClass::Syntax => {
                self.bias = TokenClass::Section;
                self.start_char = false;
                true
            }
            ']' if self.bias == TokenClass::Section && self.start_char => {
                self.bias = TokenClass::Space;
                true
            }
            '=' if self.bias == TokenClass::Key => {
                self.bias = TokenClass::Value;
                self.start_char = false;
                true
            }
            '#' | ';' if self.bias == TokenClass::Syntax => {
                self.bias = TokenClass::Comment;
                self.start_char = true;
                true
            }
            _ => false,
        };

        if syntax {
            TokenClass::Syntax
        } else if is_space(c) {
            self.classify_space(c)
        } else {
            self.classify_content(c)
        }
    }

    /// Surrogate pairs are only acceptable as free text.
    pub(super) fn classify_pair(&mut self, first: u16, second: u16) -> TokenClass {
        if !is_surrogate(first) || !is_surrogate(second) {
            return TokenClass::Error;
        }

        match self.bias {
            TokenClass::Comment | TokenClass::Value => {
                self.start_char = true;
                self.bias
            }
            _ => TokenClass::Error,
        }
    }

    fn classify_space(&mut self, c: char) -> TokenClass {
        match self.bias {
            TokenClass::Section => {
                self.start_char = true;
                if is_section_char(c) {
                    TokenClass::Section
                } else {
                    TokenClass::Error
                }
            }
            // leading whitespace is not part of a value
            TokenClass::Value if self.start_char => TokenClass::Value,
            TokenClass::Value => TokenClass::Space,
            // leading whitespace on a line is only fine if nothing but whitespace follows
            TokenClass::Syntax => {
                self.bias = TokenClass::Space;
                self.start_char = true;
                TokenClass::Space
            }
            TokenClass::Key => {
                self.start_char = true;
                TokenClass::Key
            }
            bias => bias,
        }
    }

    fn classify_content(&mut self, c: char) -> TokenClass {
        match self.bias {
            // alphanumeric content at the start of a line starts a key
            TokenClass::Syntax if is_key_char(c) => {
                self.bias = TokenClass::Key;
                self.start_char = false;
                TokenClass::Key
            }
            TokenClass::Comment => TokenClass::Comment,
            TokenClass::Value => {
                self.start_char = true;
                TokenClass::Value
            }
            TokenClass::Key if is_key_char(c) && !self.start_char => TokenClass::Key,
            TokenClass::Section => {
                self.start_char = true;
                if is_section_char(c) {
                    TokenClass::Section
                } else {
                    TokenClass::Error
                }
            }
            _ => TokenClass::Error,
        }
    }
}
