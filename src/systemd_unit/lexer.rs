use std::io::{Read, Seek};
use std::ops::ControlFlow;

use super::{LineEnding, Token, TokenSink, Tokenizer};
use crate::utf8::{DecodeError, DecodeStatus, InvalidBytes, Utf8Decoder};

/// Everything found while lexing a unit file from raw bytes.
#[derive(Debug, PartialEq)]
pub struct LexedUnit {
    pub tokens: Vec<Token>,
    pub invalid_bytes: Vec<InvalidBytes>,
    pub status: DecodeStatus,
}

impl LexedUnit {
    pub fn syntax_errors(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|token| token.is_syntax_error())
    }
}

#[derive(Default)]
struct Collector {
    tokens: Vec<Token>,
    invalid_bytes: Vec<InvalidBytes>,
}

impl TokenSink for Collector {
    fn token(&mut self, token: Token) -> ControlFlow<()> {
        self.tokens.push(token);
        ControlFlow::Continue(())
    }

    fn invalid_bytes(
        &mut self,
        bytes: &[u8],
        relative_offset: u64,
        absolute_offset: u64,
    ) -> ControlFlow<()> {
        self.invalid_bytes.push(InvalidBytes {
            bytes: bytes.to_vec(),
            relative_offset,
            absolute_offset,
        });
        ControlFlow::Continue(())
    }
}

#[derive(Debug, PartialEq)]
pub struct Lexer;

impl Lexer {
    /// Tokenizes text that is already known to be valid.
    pub fn tokens_from(data: &str, line_ending: LineEnding) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new(line_ending, Vec::with_capacity(data.lines().count()));
        tokenizer.receive_str(data);
        tokenizer.end();
        tokenizer.into_sink()
    }

    /// Decodes `input` as UTF-8 and tokenizes it.
    ///
    /// Invalid UTF-8 is skipped and collected in [`LexedUnit::invalid_bytes`],
    /// the characters around it end up in the same token.
    pub fn tokens_from_reader<R: Read + Seek>(
        input: R,
        line_ending: LineEnding,
    ) -> Result<LexedUnit, DecodeError> {
        let mut tokenizer = Tokenizer::new(line_ending, Collector::default());
        let status = Utf8Decoder::consume(input, &mut tokenizer)?;
        let Collector {
            tokens,
            invalid_bytes,
        } = tokenizer.into_sink();

        Ok(LexedUnit {
            tokens,
            invalid_bytes,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systemd_unit::TokenType;
    use std::fs::{self, File};
    use std::io::{Cursor, Seek, SeekFrom};

    mod tokens_from {
        use super::*;

        #[test]
        fn test_empty_lines_yield_no_tokens() {
            let data = "


";

            let tokens = Lexer::tokens_from(data, LineEnding::Lf);
            assert!(tokens.is_empty());
        }

        #[test]
        fn test_with_comments_succeeds() {
            let data = "
# foo

; bar";

            let tokens = Lexer::tokens_from(data, LineEnding::Lf);
            assert_eq!(tokens.len(), 2);
            assert_eq!(tokens[0], Token::new(TokenType::Comment, 2, 2, " foo"));
            assert_eq!(tokens[1], Token::new(TokenType::Comment, 4, 2, " bar"));
        }

        #[test]
        fn test_with_section_header_succeeds() {
            let data = "[Section A]";

            let tokens = Lexer::tokens_from(data, LineEnding::Lf);
            assert_eq!(tokens, vec![Token::new(TokenType::Section, 1, 2, "Section A")]);
        }

        #[test]
        fn test_entry_with_whitespace_succeeds() {
            let data = "KeyOne = Something";

            let tokens = Lexer::tokens_from(data, LineEnding::Lf);
            assert_eq!(tokens.len(), 3);
            assert_eq!(tokens[0], Token::new(TokenType::Key, 1, 1, "KeyOne "));
            assert!(matches!(tokens[1].token_type, TokenType::Space(_)));
            assert_eq!(tokens[2], Token::new(TokenType::Value, 1, 10, "Something"));
        }

        #[test]
        fn test_entry_with_empty_value_succeeds() {
            let data = "KeyOne=";

            let tokens = Lexer::tokens_from(data, LineEnding::Lf);
            assert_eq!(
                tokens,
                vec![
                    Token::new(TokenType::Key, 1, 1, "KeyOne"),
                    Token::new(TokenType::Value, 1, 8, ""),
                ]
            );
        }

        #[test]
        fn test_entry_with_continuation_succeeds() {
            let data = "KeyOne=Something \\
Else";

            let tokens = Lexer::tokens_from(data, LineEnding::Lf);
            assert_eq!(tokens.len(), 2);
            assert_eq!(tokens[1], Token::new(TokenType::Value, 1, 8, "Something  Else"));
        }

        #[test]
        fn test_systemd_syntax_example_1_succeeds() {
            // see https://www.freedesktop.org/software/systemd/man/systemd.syntax.html#
            let data = "[Section A]
KeyOne=value 1
KeyTwo=value 2

# a comment

[Section B]
Setting=\"something\" \"some thing\" \"…\"
KeyTwo=value 2 \\
       value 2 continued

[Section C]
KeyThree=value 3\\
       value 3 continued
";

            let continued_2 = format!("value 2{}value 2 continued", " ".repeat(9));
            let continued_3 = format!("value 3{}value 3 continued", " ".repeat(8));

            let tokens = Lexer::tokens_from(data, LineEnding::Lf);
            let values: Vec<(TokenType, &str)> = tokens
                .iter()
                .map(|t| (t.token_type, t.content.as_str()))
                .collect();
            assert_eq!(
                values,
                vec![
                    (TokenType::Section, "Section A"),
                    (TokenType::Key, "KeyOne"),
                    (TokenType::Value, "value 1"),
                    (TokenType::Key, "KeyTwo"),
                    (TokenType::Value, "value 2"),
                    (TokenType::Comment, " a comment"),
                    (TokenType::Section, "Section B"),
                    (TokenType::Key, "Setting"),
                    (TokenType::Value, "\"something\" \"some thing\" \"…\""),
                    (TokenType::Key, "KeyTwo"),
                    (TokenType::Value, continued_2.as_str()),
                    (TokenType::Section, "Section C"),
                    (TokenType::Key, "KeyThree"),
                    (TokenType::Value, continued_3.as_str()),
                ]
            );
            assert!(tokens.iter().all(|t| !t.is_syntax_error()));
        }

        #[test]
        fn test_same_text_differs_by_line_ending() {
            let data = "A=1\r\nB=2";

            let lf = Lexer::tokens_from(data, LineEnding::Lf);
            let cr = Lexer::tokens_from(data, LineEnding::Cr);
            assert_eq!(lf.len(), 4);
            assert_eq!(lf[3], Token::new(TokenType::Value, 2, 3, "2"));
            assert!(cr.iter().any(|t| t.is_syntax_error() && t.content == "\n"));
        }
    }

    mod tokens_from_reader {
        use super::*;

        #[test]
        fn test_valid_input() {
            let lexed =
                Lexer::tokens_from_reader(Cursor::new("[Unit]\nDescription=😀"), LineEnding::Lf)
                    .unwrap();

            assert_eq!(lexed.status, DecodeStatus::Done);
            assert!(lexed.invalid_bytes.is_empty());
            assert_eq!(
                lexed.tokens,
                vec![
                    Token::new(TokenType::Section, 1, 2, "Unit"),
                    Token::new(TokenType::Key, 2, 1, "Description"),
                    Token::new(TokenType::Value, 2, 13, "😀"),
                ]
            );
        }

        #[test]
        fn test_invalid_bytes_are_skipped() {
            let data = b"k=a\xFFb\n[s\xC0\xAF]";

            let lexed = Lexer::tokens_from_reader(Cursor::new(&data[..]), LineEnding::Lf).unwrap();

            assert_eq!(lexed.status, DecodeStatus::DoneWithInvalidBytes);
            assert_eq!(
                lexed.invalid_bytes,
                vec![
                    InvalidBytes {
                        bytes: vec![0xFF],
                        relative_offset: 3,
                        absolute_offset: 3,
                    },
                    InvalidBytes {
                        bytes: vec![0xC0, 0xAF],
                        relative_offset: 8,
                        absolute_offset: 8,
                    },
                ]
            );
            assert_eq!(
                lexed.tokens,
                vec![
                    Token::new(TokenType::Key, 1, 1, "k"),
                    Token::new(TokenType::Value, 1, 3, "ab"),
                    Token::new(TokenType::Section, 2, 2, "s"),
                ]
            );
            assert_eq!(lexed.syntax_errors().count(), 0);
        }

        #[test]
        fn test_offsets_are_relative_to_start_position() {
            let mut input = Cursor::new(&b"##k=\xC3"[..]);
            input.seek(SeekFrom::Start(2)).unwrap();

            let lexed = Lexer::tokens_from_reader(input, LineEnding::Lf).unwrap();

            assert_eq!(
                lexed.invalid_bytes,
                vec![InvalidBytes {
                    bytes: vec![0xC3],
                    relative_offset: 2,
                    absolute_offset: 4,
                }]
            );
            assert_eq!(
                lexed.tokens,
                vec![
                    Token::new(TokenType::Key, 1, 1, "k"),
                    Token::new(TokenType::Value, 1, 3, ""),
                ]
            );
        }

        #[test]
        fn test_from_file() {
            // setup
            let temp_dir = tempfile::tempdir().expect("cannot create temp dir");
            let path = temp_dir.path().join("test.container");
            fs::write(
                &path,
                "[Container]\r\nImage=quay.io/podman/hello\r\nExec=sleep \\\r\n  60\r\n",
            )
            .expect("cannot write unit file");

            let file = File::open(&path).expect("cannot open unit file");
            let lexed = Lexer::tokens_from_reader(file, LineEnding::CrLf).unwrap();

            assert_eq!(lexed.status, DecodeStatus::Done);
            assert_eq!(
                lexed.tokens,
                vec![
                    Token::new(TokenType::Section, 1, 2, "Container"),
                    Token::new(TokenType::Key, 2, 1, "Image"),
                    Token::new(TokenType::Value, 2, 7, "quay.io/podman/hello"),
                    Token::new(TokenType::Key, 3, 1, "Exec"),
                    Token::new(TokenType::Value, 3, 6, "sleep    60"),
                ]
            );
        }
    }
}
