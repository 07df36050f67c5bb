use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use filter_sql::{Dialect, FilterTranslator, SelectCompiler, TranslatorConfig};

/// Translate OData filter expressions into SQL.
#[derive(Debug, Parser)]
#[command(name = "filter_sql", version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "FILTER_SQL_CONFIG")]
    config: Option<PathBuf>,

    /// SQL dialect used with --table (overrides the config file)
    #[arg(short, long)]
    dialect: Option<Dialect>,

    /// Wrap the filter in a SELECT over this entity's table
    #[arg(short, long)]
    table: Option<String>,

    /// Print the parsed AST as JSON instead of SQL
    #[arg(long, conflicts_with = "table")]
    ast: bool,

    /// Filter to translate; starts an interactive session when omitted
    filter: Option<String>,
}

struct Session {
    translator: FilterTranslator,
    compiler: SelectCompiler,
    table: Option<String>,
    ast: bool,
}

impl Session {
    fn render(&self, filter: &str) -> Result<String> {
        let node = self.translator.parse(filter)?;
        if self.ast {
            return Ok(serde_json::to_string_pretty(&node)?);
        }
        let sql = match &self.table {
            Some(entity) => self.compiler.compile(node.as_ref(), entity),
            None => node.map(|n| n.to_sql(0)).unwrap_or_default(),
        };
        Ok(sql)
    }
}

fn load_config(cli: &Cli) -> Result<TranslatorConfig> {
    let mut config = match &cli.config {
        Some(path) => TranslatorConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TranslatorConfig::default(),
    };
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
    Ok(config)
}

fn run_repl(session: &Session) -> Result<()> {
    println!("filter_sql: enter an OData filter, Ctrl-D to quit");
    let mut editor = DefaultEditor::new().context("starting line editor")?;

    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.as_str())?;
                match session.render(&line) {
                    Ok(sql) => println!("{sql}"),
                    Err(e) => eprintln!("error: {e:#}"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("reading input"),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(?config, "starting");

    let session = Session {
        translator: FilterTranslator::from_config(&config),
        compiler: SelectCompiler::from_config(&config),
        table: cli.table.clone(),
        ast: cli.ast,
    };

    match &cli.filter {
        Some(filter) => {
            println!("{}", session.render(filter)?);
            Ok(())
        }
        None => run_repl(&session),
    }
}
