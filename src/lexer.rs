//! Lexer for filter expressions.

use std::borrow::Cow;

use thiserror::Error;

use crate::sanitize::is_number;
use crate::token::{Span, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unclosed string literal starting at {span}")]
    UnclosedString { span: Span },
}

pub struct Lexer<'a> {
    input: &'a str,
    /// Current position in the input (byte offset)
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// Returns the character at the current position without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Advances one character and returns it.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Reads a single-quoted string literal. The opening quote has already
    /// been consumed by the caller.
    ///
    /// `''` inside the literal is an escaped quote and ends up as one `'` in
    /// the token text. The surrounding quotes are kept.
    fn read_string(&mut self, start: usize) -> Result<Token<'a>, LexError> {
        let mut owned: Option<String> = None;
        loop {
            let Some(c) = self.bump() else {
                return Err(LexError::UnclosedString {
                    span: Span::new(start, self.position),
                });
            };
            if c == '\'' {
                if self.peek() == Some('\'') {
                    match owned.as_mut() {
                        Some(buf) => buf.push('\''),
                        None => owned = Some(self.input[start..self.position].to_string()),
                    }
                    self.bump();
                    continue;
                }
                let span = Span::new(start, self.position);
                let text = match owned {
                    Some(mut buf) => {
                        buf.push('\'');
                        Cow::Owned(buf)
                    }
                    None => Cow::Borrowed(&self.input[start..self.position]),
                };
                return Ok(Token::new(TokenKind::String, text, span));
            }
            if let Some(buf) = owned.as_mut() {
                buf.push(c);
            }
        }
    }

    /// Reads a bareword up to the next delimiter and classifies it as a
    /// keyword, a number or an identifier, in that order.
    fn read_word(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            self.bump();
        }
        let word = &self.input[start..self.position];
        let span = Span::new(start, self.position);

        let kind = TokenKind::keyword(word).unwrap_or_else(|| {
            if is_number(word) {
                TokenKind::Number
            } else {
                TokenKind::Identifier
            }
        });
        Token::new(kind, word, span)
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | ',' | '\'')
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;

        let c = self.bump()?;

        let token = match c {
            '(' => Token::new(TokenKind::LParen, "(", Span::new(start, self.position)),
            ')' => Token::new(TokenKind::RParen, ")", Span::new(start, self.position)),
            ',' => Token::new(TokenKind::Comma, ",", Span::new(start, self.position)),
            '\'' => match self.read_string(start) {
                Ok(token) => token,
                Err(err) => {
                    // nothing after an unterminated literal is tokenized
                    self.position = self.input.len();
                    return Some(Err(err));
                }
            },
            _ => self.read_word(start),
        };
        Some(Ok(token))
    }
}

/// Tokenizes a whole filter expression in one left-to-right pass.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    let tokens = Lexer::new(input).collect::<Result<Vec<_>, _>>()?;
    tracing::trace!(count = tokens.len(), "tokenized filter");
    Ok(tokens)
}
