//! sqlshift CLI
//!
//! Splits a SQL script into executable batches using the configured
//! dialect's searchers. Migration execution needs a live database driver
//! and is a library concern; the CLI only exposes the parser.
//!
//! Exit codes:
//! - 0: Script parsed cleanly
//! - 1: Parse error in the input SQL (e.g. unterminated comment)
//! - 2: Tool error (config error, I/O error, bad arguments)

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;

use sqlshift::batch::Dialect;
use sqlshift::{Config, ParseError, SqlBatch};

/// Default config file name used when --config is not explicitly provided.
const DEFAULT_CONFIG_FILE: &str = "sqlshift.toml";

#[derive(Parser, Debug)]
#[command(name = "sqlshift")]
#[command(about = "Split SQL scripts into executable batches", long_about = None)]
struct Args {
    /// SQL file to split
    file: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured dialect (sql-server, my-sql, ansi)
    #[arg(long)]
    dialect: Option<String>,

    /// Strip comments from the emitted batches
    #[arg(long)]
    strip_comments: bool,

    /// Emit the batches as a JSON array instead of text
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    match run(args) {
        Ok(()) => {
            // exit 0 is implicit
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if err.downcast_ref::<ParseError>().is_some() {
                std::process::exit(1);
            }
            std::process::exit(2);
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args.config)?;

    // CLI overrides win over the config file.
    let dialect = match &args.dialect {
        Some(name) => Dialect::from_str(name)
            .map_err(|_| anyhow::anyhow!("Unknown dialect '{name}'"))?,
        None => config.dialect().context("Invalid configuration")?,
    };
    let strip_comments = args.strip_comments || config.parser.strip_comments;

    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let batches = dialect.parser(strip_comments).split(&source)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&batches)?);
    } else {
        print!("{}", render_batches(&batches));
    }
    Ok(())
}

/// Text rendering: one header line per batch, then its SQL.
fn render_batches(batches: &[SqlBatch]) -> String {
    let mut out = String::new();
    for (position, batch) in batches.iter().enumerate() {
        if batch.repeat > 1 {
            out.push_str(&format!(
                "-- batch {} of {} (x{})\n",
                position + 1,
                batches.len(),
                batch.repeat
            ));
        } else {
            out.push_str(&format!("-- batch {} of {}\n", position + 1, batches.len()));
        }
        out.push_str(&batch.sql);
        if !batch.sql.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Load configuration from file.
///
/// If `config_path` is `Some`, the user explicitly passed `--config` and the
/// file must exist (error if not found). If `None`, the default config path
/// is used; a missing default config file falls back to defaults.
fn load_config(config_path: &Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::from_path(path).context("Failed to load configuration")
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Config::from_path(&default_path).context("Failed to load configuration")
            } else {
                Ok(Config::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_marks_batch_positions_and_repeats() {
        let batches = vec![
            SqlBatch {
                sql: "SELECT 1\n".to_string(),
                repeat: 1,
            },
            SqlBatch {
                sql: "SELECT 2".to_string(),
                repeat: 3,
            },
        ];
        insta::assert_snapshot!(render_batches(&batches), @r"
        -- batch 1 of 2
        SELECT 1
        -- batch 2 of 2 (x3)
        SELECT 2
        ");
    }
}
