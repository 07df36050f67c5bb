//! Translate OData-style filter expressions into SQL `WHERE` fragments.
//!
//! ```
//! use filter_sql::convert;
//!
//! assert_eq!(
//!     convert("not (age gt 18 and status eq 'active') or premium eq true").unwrap(),
//!     "(NOT (age > 18 AND status = 'active')) OR premium = true"
//! );
//! assert!(convert("name eq 'x; DROP TABLE users'").is_err());
//! ```
//!
//! Text flows one way: [`lexer`] → [`parser`] (calling [`sanitize`] at every
//! leaf) → [`ast`] rendering. [`translator`] wires the stages together.

pub mod ast;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod sanitize;
pub mod sql_compiler;
pub mod token;
pub mod translator;

pub use ast::Node;
pub use config::{ConfigError, TranslatorConfig};
pub use sql_compiler::{Dialect, SelectCompiler};
pub use translator::{convert, ConvertError, FilterError, FilterTranslator};
