//! Entry point: filter text in, SQL `WHERE` fragment out.

use thiserror::Error;

use crate::ast::Node;
use crate::config::TranslatorConfig;
use crate::lexer::{tokenize, LexError};
use crate::parser::{ParseError, Parser, MAX_NESTING_DEPTH};
use crate::sanitize::Sanitizer;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("tokenization failed: {0}")]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("filter is {length} bytes long, the limit is {limit}")]
    TooLong { length: usize, limit: usize },
}

/// A rejected filter, together with the text that was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid OData filter {filter:?}: {source}")]
pub struct ConvertError {
    pub filter: String,
    #[source]
    pub source: FilterError,
}

/// Translates filter expressions using a fixed set of limits and reserved
/// words. Holds no per-call state, so one instance can serve any number of
/// threads.
#[derive(Debug, Clone)]
pub struct FilterTranslator {
    sanitizer: Sanitizer,
    max_nesting_depth: usize,
    max_filter_length: Option<usize>,
}

impl Default for FilterTranslator {
    fn default() -> Self {
        Self {
            sanitizer: Sanitizer::default(),
            max_nesting_depth: MAX_NESTING_DEPTH,
            max_filter_length: None,
        }
    }
}

impl FilterTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            sanitizer: Sanitizer::with_reserved_keywords(&config.reserved_keywords),
            max_nesting_depth: config.max_nesting_depth,
            max_filter_length: config.max_filter_length,
        }
    }

    /// Parses a filter into its AST. Blank input yields `Ok(None)`.
    pub fn parse(&self, filter: &str) -> Result<Option<Node>, ConvertError> {
        let filter = filter.trim();
        if filter.is_empty() {
            return Ok(None);
        }

        self.build_ast(filter).map(Some).map_err(|source| {
            tracing::debug!(filter, error = %source, "rejected filter");
            ConvertError {
                filter: filter.to_string(),
                source,
            }
        })
    }

    fn build_ast(&self, filter: &str) -> Result<Node, FilterError> {
        if let Some(limit) = self.max_filter_length {
            if filter.len() > limit {
                return Err(FilterError::TooLong {
                    length: filter.len(),
                    limit,
                });
            }
        }
        let tokens = tokenize(filter)?;
        let node = Parser::new(&tokens, &self.sanitizer)
            .with_max_depth(self.max_nesting_depth)
            .parse()?;
        Ok(node)
    }

    /// Converts a filter into a SQL `WHERE` fragment. Blank input yields an
    /// empty string.
    pub fn convert(&self, filter: &str) -> Result<String, ConvertError> {
        let Some(node) = self.parse(filter)? else {
            return Ok(String::new());
        };
        let sql = node.to_sql(0);
        tracing::debug!(filter = filter.trim(), sql = %sql, "translated filter");
        Ok(sql)
    }
}

/// Converts a filter with the default limits and reserved words.
///
/// ```
/// let sql = filter_sql::convert("name eq 'Alice' and age gt 30").unwrap();
/// assert_eq!(sql, "name = 'Alice' AND age > 30");
/// ```
pub fn convert(filter: &str) -> Result<String, ConvertError> {
    FilterTranslator::default().convert(filter)
}
