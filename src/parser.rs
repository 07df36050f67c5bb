//! Recursive-descent parser for filter expressions.
//!
//! ## Grammar (lowest precedence first)
//!
//! ```text
//! expr      := or_expr
//! or_expr   := and_expr ( OR and_expr )*
//! and_expr  := not_expr ( AND not_expr )*
//! not_expr  := NOT not_expr | primary
//! primary   := '(' expr ')'
//!            | condition
//! condition := IDENT ( cmp_op literal | IN '(' literal ( ',' literal )* ')' )
//! cmp_op    := eq | ne | gt | ge | lt | le
//! ```
//!
//! `AND` and `OR` fold to the left, so `a and b and c` parses as
//! `(a and b) and c`. Every explicit `( ... )` becomes a [`Node::Paren`].
//!
//! ## Nesting
//!
//! Entering a parenthesized group increases the depth counter. Going past the
//! limit (10 by default) fails with [`ParseError::NestingTooDeep`]. `NOT` does
//! not count: runs of `NOT` and `AND`/`OR` chains are consumed in loops, so
//! only groups recurse.
//!
//! ## Examples
//!
//! ```text
//! name eq 'Alice' and age gt 30
//! not (status eq 'active' or premium eq true)
//! color in ('red', 'blue')
//! ```

use thiserror::Error;

use crate::ast::{BoolOp, CompOp, Identifier, Literal, Node};
use crate::sanitize::{SanitizeError, Sanitizer};
use crate::token::{Span, Token, TokenKind};

/// Default limit on nested groups.
pub const MAX_NESTING_DEPTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected token `{found}` at {span}")]
    UnexpectedToken { found: String, span: Span },
    #[error("expected {expected}, but reached end of input")]
    UnexpectedEnd { expected: &'static str },
    #[error("expected an expression after {operator}, but reached end of input")]
    MissingOperand { operator: &'static str },
    #[error("missing closing parenthesis for group opened at {open}")]
    MissingParen { open: Span },
    #[error("IN list for field `{field}` must have at least one value")]
    EmptyInList { field: String },
    #[error("IN list for field `{field}` is not closed")]
    UnclosedInList { field: String },
    #[error("invalid field name `{name}`: {reason}")]
    InvalidField { name: String, reason: SanitizeError },
    #[error("invalid value `{value}`: {reason}")]
    InvalidValue { value: String, reason: SanitizeError },
    #[error("unsupported operator `{found}` at {span}")]
    UnsupportedOperator { found: String, span: Span },
    #[error("exceeded maximum nesting depth of {limit}")]
    NestingTooDeep { limit: usize },
    #[error("unexpected extra tokens starting with `{found}` at {span}")]
    TrailingTokens { found: String, span: Span },
}

impl ParseError {
    fn unexpected(token: &Token<'_>) -> Self {
        Self::UnexpectedToken {
            found: token.text.to_string(),
            span: token.span,
        }
    }
}

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
    depth: usize,
    max_depth: usize,
    sanitizer: &'a Sanitizer,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>], sanitizer: &'a Sanitizer) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            max_depth: MAX_NESTING_DEPTH,
            sanitizer,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the current token without advancing.
    fn peek(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position)
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> Option<&'a Token<'a>> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    /// Consumes the current token if it has the given kind.
    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.peek().is_some_and(|t| t.kind == kind) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Runs `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Parses the whole token sequence into a single expression.
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        if self.is_at_end() {
            return Err(ParseError::UnexpectedEnd {
                expected: "an expression",
            });
        }
        let node = self.parse_or_expression()?;
        if let Some(token) = self.peek() {
            return Err(ParseError::TrailingTokens {
                found: token.text.to_string(),
                span: token.span,
            });
        }
        Ok(node)
    }

    /// `and_expr (OR and_expr)*`
    fn parse_or_expression(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_and_expression()?;

        while self.match_token(TokenKind::Or) {
            if self.is_at_end() {
                return Err(ParseError::MissingOperand { operator: "OR" });
            }
            let right = self.parse_and_expression()?;
            left = Node::Binary {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// `not_expr (AND not_expr)*`
    fn parse_and_expression(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_not_expression()?;

        while self.match_token(TokenKind::And) {
            if self.is_at_end() {
                return Err(ParseError::MissingOperand { operator: "AND" });
            }
            let right = self.parse_not_expression()?;
            left = Node::Binary {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// `NOT not_expr | primary`
    fn parse_not_expression(&mut self) -> Result<Node, ParseError> {
        let mut negations = 0;
        while self.match_token(TokenKind::Not) {
            if self.is_at_end() {
                return Err(ParseError::MissingOperand { operator: "NOT" });
            }
            negations += 1;
        }

        let mut node = self.parse_primary_expression()?;
        for _ in 0..negations {
            node = Node::Not {
                child: Box::new(node),
            };
        }
        Ok(node)
    }

    /// `'(' expr ')' | condition`
    fn parse_primary_expression(&mut self) -> Result<Node, ParseError> {
        let Some(token) = self.peek() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "an expression",
            });
        };
        if token.kind != TokenKind::LParen {
            return self.parse_condition();
        }

        self.advance();
        let inner = self.nested(Self::parse_or_expression)?;
        if !self.match_token(TokenKind::RParen) {
            return Err(ParseError::MissingParen { open: token.span });
        }
        Ok(Node::Paren {
            child: Box::new(inner),
        })
    }

    /// `IDENT (cmp_op literal | IN '(' literal (',' literal)* ')')`
    fn parse_condition(&mut self) -> Result<Node, ParseError> {
        let field = self.parse_field()?;

        let Some(token) = self.peek() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "a comparison operator",
            });
        };
        if token.kind == TokenKind::In {
            self.advance();
            return self.parse_in_list(field);
        }

        let op = comparison_operator(token.kind).ok_or_else(|| {
            ParseError::UnsupportedOperator {
                found: token.text.to_string(),
                span: token.span,
            }
        })?;
        self.advance();
        let value = self.parse_value()?;
        Ok(Node::Condition { field, op, value })
    }

    fn parse_field(&mut self) -> Result<Identifier, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "a field name",
            });
        };
        match token.kind {
            TokenKind::Identifier => {}
            TokenKind::String | TokenKind::Number => {
                return Err(ParseError::InvalidField {
                    name: token.text.to_string(),
                    reason: SanitizeError::MalformedIdentifier,
                });
            }
            _ => return Err(ParseError::unexpected(token)),
        }
        self.sanitizer
            .normalize_field(&token.text)
            .map_err(|reason| ParseError::InvalidField {
                name: token.text.to_string(),
                reason,
            })
    }

    /// Parses `'(' literal (',' literal)* ')'` after `IN`.
    fn parse_in_list(&mut self, field: Identifier) -> Result<Node, ParseError> {
        match self.advance() {
            Some(token) if token.kind == TokenKind::LParen => {}
            Some(token) => return Err(ParseError::unexpected(token)),
            None => {
                return Err(ParseError::UnexpectedEnd {
                    expected: "`(` after IN",
                })
            }
        }
        if self.peek().is_some_and(|t| t.kind == TokenKind::RParen) {
            return Err(ParseError::EmptyInList {
                field: field.to_string(),
            });
        }

        let mut values = Vec::new();
        loop {
            if self.is_at_end() {
                return Err(ParseError::UnclosedInList {
                    field: field.to_string(),
                });
            }
            values.push(self.parse_value()?);

            if self.match_token(TokenKind::Comma) {
                continue;
            }
            if self.match_token(TokenKind::RParen) {
                break;
            }
            return Err(ParseError::UnclosedInList {
                field: field.to_string(),
            });
        }

        Ok(Node::In { field, values })
    }

    fn parse_value(&mut self) -> Result<Literal, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::UnexpectedEnd { expected: "a value" });
        };
        if !token.kind.is_value() {
            return Err(ParseError::InvalidValue {
                value: token.text.to_string(),
                reason: SanitizeError::NotALiteral,
            });
        }
        self.sanitizer
            .sanitize_literal(&token.text)
            .map_err(|reason| ParseError::InvalidValue {
                value: token.text.to_string(),
                reason,
            })
    }
}

fn comparison_operator(kind: TokenKind) -> Option<CompOp> {
    let op = match kind {
        TokenKind::Eq => CompOp::Eq,
        TokenKind::Ne => CompOp::Ne,
        TokenKind::Gt => CompOp::Gt,
        TokenKind::Ge => CompOp::Ge,
        TokenKind::Lt => CompOp::Lt,
        TokenKind::Le => CompOp::Le,
        _ => return None,
    };
    Some(op)
}

/// Parses a token sequence with the default sanitizer and nesting limit.
pub fn parse(tokens: &[Token<'_>]) -> Result<Node, ParseError> {
    let sanitizer = Sanitizer::default();
    Parser::new(tokens, &sanitizer).parse()
}
