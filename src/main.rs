use anyhow::{Context, Result};
use std::env;
use std::io;

use expense_tracker::cli::{self, Command, USAGE, USAGE_EXIT_CODE};
use expense_tracker::{init_tracing, Config, LogFormat};

fn main() -> Result<()> {
    init_tracing(LogFormat::load().context("Failed to read log format")?);
    let config = Config::load().context("Failed to load configuration")?;

    let args: Vec<String> = env::args().skip(1).collect();

    match Command::parse(&args) {
        Some(command) => cli::run(&command, &config, &mut io::stdout().lock()),
        None => {
            eprintln!("{USAGE}");
            std::process::exit(USAGE_EXIT_CODE);
        }
    }
}
