use thiserror::Error;

/// Errors raised by the expense store, the CSV importer and configuration loading.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database connection lock poisoned")]
    Poisoned,

    #[error("Invalid stored {column} value {value:?}: {reason}")]
    Decode {
        column: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid {key} value {value:?}: {reason}")]
    Config {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
