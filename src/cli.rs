// Operator commands behind the `expense-tracker` binary

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::db::{schema_version, setup_database, ExpenseContext};
use crate::import::load_csv;

pub const USAGE: &str = "Usage: expense-tracker <command>

Commands:
  migrate             Create or upgrade the database schema
  import <file.csv>   Insert expenses from a CSV file (description,amount,date)
  list                Print every stored expense

The database path comes from EXPENSES_DATABASE (default: expenses.db).";

/// Exit status for an unrecognised command line.
pub const USAGE_EXIT_CODE: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Migrate,
    Import(PathBuf),
    List,
}

impl Command {
    /// Parse the arguments after the program name. `None` means print usage.
    pub fn parse(args: &[String]) -> Option<Command> {
        match args.first().map(String::as_str) {
            Some("migrate") => Some(Command::Migrate),
            Some("import") => args.get(1).map(|path| Command::Import(PathBuf::from(path))),
            Some("list") => Some(Command::List),
            _ => None,
        }
    }
}

pub fn run(command: &Command, config: &Config, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Migrate => run_migrate(config, out),
        Command::Import(csv_path) => run_import(config, csv_path, out),
        Command::List => run_list(config, out),
    }
}

fn run_migrate(config: &Config, out: &mut impl Write) -> Result<()> {
    let conn = rusqlite::Connection::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database))?;
    let applied = setup_database(&conn).context("Failed to migrate database")?;

    writeln!(
        out,
        "Applied {} migration(s); schema is at version {}",
        applied,
        schema_version()
    )?;
    Ok(())
}

fn run_import(config: &Config, csv_path: &Path, out: &mut impl Write) -> Result<()> {
    let expenses = load_csv(csv_path)
        .with_context(|| format!("Failed to load {}", csv_path.display()))?;

    let ctx = open(config)?;
    let inserted = ctx.add_all(&expenses).context("Failed to insert expenses")?;
    let total = ctx.count()?;

    writeln!(out, "Inserted {} expense(s); database now holds {}", inserted, total)?;
    Ok(())
}

fn run_list(config: &Config, out: &mut impl Write) -> Result<()> {
    let ctx = open(config)?;
    let expenses = ctx.list().context("Failed to read expenses")?;

    writeln!(out, "{:>6}  {:<20}  {:>12}  Description", "Id", "Date", "Amount")?;
    for expense in &expenses {
        writeln!(
            out,
            "{:>6}  {:<20}  {:>12}  {}",
            expense.id,
            expense.date.format("%Y-%m-%d %H:%M:%S"),
            expense.amount,
            expense.description
        )?;
    }

    let total: Decimal = expenses.iter().map(|e| e.amount).sum();
    writeln!(out, "\n{} expense(s), total {}", expenses.len(), total)?;
    Ok(())
}

fn open(config: &Config) -> Result<ExpenseContext> {
    ExpenseContext::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database))
}
