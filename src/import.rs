// CSV seeding - bulk load expenses from a spreadsheet export

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::expense::NewExpense;

/// Read expenses from a CSV file with a `description,amount,date` header.
///
/// Amounts are decimals, dates RFC 3339 timestamps. A single malformed row
/// fails the whole load.
pub fn load_csv(csv_path: &Path) -> Result<Vec<NewExpense>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let expenses = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<NewExpense>, _>>()?;

    info!(path = %csv_path.display(), rows = expenses.len(), "loaded expenses from CSV");
    Ok(expenses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rust_decimal::Decimal;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv_rows() {
        let file = write_csv(
            "description,amount,date\n\
             Coffee,3.50,2024-03-01T08:00:00Z\n\
             \"Dinner, team\",84.20,2024-03-02T19:30:00+00:00\n",
        );

        let expenses = load_csv(file.path()).unwrap();

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].description, "Coffee");
        assert_eq!(expenses[0].amount, Decimal::new(350, 2));
        assert_eq!(expenses[1].description, "Dinner, team");
        assert_eq!(expenses[1].amount, Decimal::new(8420, 2));
    }

    #[test]
    fn test_malformed_row_fails_load() {
        let file = write_csv(
            "description,amount,date\n\
             Coffee,3.50,2024-03-01T08:00:00Z\n\
             Broken,not-a-number,2024-03-02T00:00:00Z\n",
        );

        assert!(matches!(load_csv(file.path()), Err(Error::Csv(_))));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_csv(Path::new("/nonexistent/expenses.csv")).is_err());
    }
}
