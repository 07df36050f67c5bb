//! Validation and escaping of field names and literal values.
//!
//! Everything the parser puts into the AST goes through [`Sanitizer`]; the
//! renderer then only concatenates the results.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::ast::{Identifier, Literal};

/// SQL words that may never appear as a field name or a bare value.
pub const RESERVED_SQL_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "drop", "alter", "from", "where", "join", "order",
    "group", "having", "limit", "offset", "union", "except", "intersect",
];

/// Sequences that terminate a statement or open a comment.
const FORBIDDEN_SEQUENCES: &[&str] = &[";", "--", "/*", "*/"];

/// Bare values that are emitted unquoted.
const KEYWORD_LITERALS: &[&str] = &["true", "false", "null"];

static FIELD_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field regex"));

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid camel-case regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("{0:?} is a reserved SQL keyword")]
    ReservedKeyword(String),
    #[error("{0:?} is a literal, not a field name")]
    LiteralAsField(String),
    #[error("field names may only contain ASCII letters, digits and underscores")]
    MalformedIdentifier,
    #[error("contains forbidden sequence {0:?}")]
    ForbiddenSequence(&'static str),
    #[error("expected a string, number or bareword")]
    NotALiteral,
}

/// Returns true if `text` is an integer or a finite floating-point number.
pub fn is_number(text: &str) -> bool {
    text.parse::<i64>().is_ok() || text.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Converts camelCase and PascalCase names to snake_case.
pub fn to_snake_case(name: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(name, "${1}_${2}")
        .to_lowercase()
}

/// Field and value sanitizer with the built-in reserved keyword table and
/// optional extra words.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    extra_reserved: Arc<HashSet<String>>,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds words to reject on top of [`RESERVED_SQL_KEYWORDS`]. Matching is
    /// case-insensitive.
    pub fn with_reserved_keywords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra_reserved = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            extra_reserved: Arc::new(extra_reserved),
        }
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        RESERVED_SQL_KEYWORDS.contains(&lower.as_str()) || self.extra_reserved.contains(&lower)
    }

    /// Validates a field name and converts it to snake_case.
    pub fn normalize_field(&self, text: &str) -> Result<Identifier, SanitizeError> {
        if !FIELD_SYNTAX.is_match(text) {
            return Err(SanitizeError::MalformedIdentifier);
        }
        let field = to_snake_case(text);
        if self.is_reserved(&field) {
            return Err(SanitizeError::ReservedKeyword(field));
        }
        if KEYWORD_LITERALS.contains(&field.as_str()) {
            return Err(SanitizeError::LiteralAsField(field));
        }
        Ok(Identifier::new(field))
    }

    /// Turns raw token text into a SQL literal.
    ///
    /// Numbers pass through unchanged and `true`/`false`/`null` are lowercased.
    /// Anything else becomes a single-quoted string with embedded quotes
    /// doubled, after one layer of surrounding quotes is stripped.
    pub fn sanitize_literal(&self, text: &str) -> Result<Literal, SanitizeError> {
        if is_number(text) {
            return Ok(Literal::new(text.to_string()));
        }

        let lower = text.to_lowercase();
        if let Some(seq) = FORBIDDEN_SEQUENCES.iter().copied().find(|seq| lower.contains(seq)) {
            return Err(SanitizeError::ForbiddenSequence(seq));
        }
        if self.is_reserved(&lower) {
            return Err(SanitizeError::ReservedKeyword(lower));
        }
        if KEYWORD_LITERALS.contains(&lower.as_str()) {
            return Ok(Literal::new(lower));
        }

        let inner = text.strip_prefix('\'').unwrap_or(text);
        let inner = inner.strip_suffix('\'').unwrap_or(inner);
        Ok(Literal::new(format!("'{}'", inner.replace('\'', "''"))))
    }
}
