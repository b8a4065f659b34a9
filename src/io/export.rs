//! Export the current table/point set to files.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts: the interchange JSON reconstructs the table losslessly, the CSV
//! is a flat dump of the normalized points.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{PricePoint, Table};
use crate::error::AppError;

/// Write the interchange JSON (`{"columns": [...], "data": [[...]]}`).
pub fn write_table_json(path: &Path, table: &Table) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, table)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON: {e}")))?;
    Ok(())
}

/// Read a table back from its interchange JSON.
pub fn read_table_json(path: &Path) -> Result<Table, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open JSON '{}': {e}", path.display())))?;
    let table: Table = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid table JSON: {e}")))?;
    Ok(table)
}

/// Write normalized points to a CSV file.
pub fn write_points_csv(path: &Path, points: &[PricePoint]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    writeln!(file, "Competitor,Days,Date,Acriss,Price")
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;

    for p in points {
        writeln!(
            file,
            "{},{},{},{},{}",
            p.competitor, p.days, p.date, p.acriss, p.price
        )
        .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }

    Ok(())
}
