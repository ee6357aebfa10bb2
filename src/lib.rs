// Expense Tracker - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod expense;
pub mod import;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{Config, LogFormat};
pub use db::{schema_version, setup_database, ExpenseContext};
pub use error::{Error, Result};
pub use expense::{Expense, NewExpense};
pub use import::load_csv;
pub use logging::init_tracing;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
