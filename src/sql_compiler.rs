//! Embeds translated filters into full `SELECT` statements using sea-query.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use sea_query::{
    Alias, Asterisk, Expr, MysqlQueryBuilder, PostgresQueryBuilder, Query, QueryStatementWriter,
    SqliteQueryBuilder,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::Node;
use crate::config::TranslatorConfig;

/// Target SQL dialect for identifier quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown SQL dialect `{0}`, expected postgres, mysql or sqlite")]
pub struct DialectError(String);

impl FromStr for Dialect {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::Mysql),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(DialectError(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

/// Builds `SELECT * FROM <table> WHERE <filter>` statements.
#[derive(Debug, Clone, Default)]
pub struct SelectCompiler {
    dialect: Dialect,
    /// Maps entity names to table names
    table_mapping: HashMap<String, String>,
}

impl SelectCompiler {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            table_mapping: HashMap::new(),
        }
    }

    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            dialect: config.dialect,
            table_mapping: config.table_mapping.clone(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn set_table_mapping(&mut self, mapping: HashMap<String, String>) {
        self.table_mapping = mapping;
    }

    /// Resolves the table for an entity, falling back to the lowercased entity
    /// name.
    pub fn table_name(&self, entity: &str) -> String {
        self.table_mapping
            .get(entity)
            .cloned()
            .unwrap_or_else(|| entity.to_lowercase())
    }

    /// Compiles a `SELECT` over the entity's table. `None` selects every row.
    ///
    /// The filter is inserted verbatim: it is already sanitized, and its
    /// parenthesization must survive unchanged.
    pub fn compile(&self, filter: Option<&Node>, entity: &str) -> String {
        let table = self.table_name(entity);
        let mut select = Query::select();
        select.column(Asterisk).from(Alias::new(table));
        if let Some(node) = filter {
            select.and_where(Expr::cust(node.to_sql(0)));
        }

        let sql = match self.dialect {
            Dialect::Postgres => select.to_string(PostgresQueryBuilder),
            Dialect::Mysql => select.to_string(MysqlQueryBuilder),
            Dialect::Sqlite => select.to_string(SqliteQueryBuilder),
        };
        tracing::trace!(entity, dialect = %self.dialect, sql = %sql, "compiled select");
        sql
    }
}
