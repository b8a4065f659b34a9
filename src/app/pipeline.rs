//! Shared "upload pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! transport decode -> format dispatch -> (normalize) -> table/point set
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::domain::{PricePoint, Table};
use crate::error::IngestError;
use crate::io::decode::{Decoded, Upload, decode_upload};
use crate::normalize::{RowError, normalize, points_from_table};

/// How the upload was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Delimited text, passed through verbatim.
    Passthrough,
    /// Workbook bench sheet, pivoted into the normalized point set.
    Normalized,
}

/// All computed outputs of one upload.
#[derive(Debug, Clone)]
pub struct UploadOutput {
    pub filename: String,
    pub kind: UploadKind,
    /// The table the UI layer displays and exports.
    pub table: Table,
    /// Chartable points. For passthrough tables these are read back out of
    /// the table when it carries the normalized columns; empty otherwise.
    pub points: Vec<PricePoint>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Execute the full decode-and-normalize pipeline for one upload.
///
/// Synchronous and run-to-completion: there is no background work and no
/// partial result; the caller either gets a complete output or an error.
pub fn run_upload(upload: &Upload) -> Result<UploadOutput, IngestError> {
    match decode_upload(upload)? {
        Decoded::Raw(table) => {
            let points = points_from_table(&table).unwrap_or_default();
            Ok(UploadOutput {
                filename: upload.filename.clone(),
                kind: UploadKind::Passthrough,
                rows_read: table.n_rows(),
                rows_used: points.len(),
                row_errors: Vec::new(),
                points,
                table,
            })
        }
        Decoded::Bench(sheet) => {
            let out = normalize(&sheet)?;
            Ok(UploadOutput {
                filename: upload.filename.clone(),
                kind: UploadKind::Normalized,
                table: out.table,
                points: out.points,
                row_errors: out.row_errors,
                rows_read: out.rows_read,
                rows_used: out.rows_used,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use chrono::NaiveDate;

    fn csv_upload(body: &str, filename: &str) -> Upload {
        Upload::new(
            format!("data:text/csv;base64,{}", BASE64.encode(body)),
            filename,
        )
    }

    #[test]
    fn passthrough_with_point_columns_is_chartable() {
        let upload = csv_upload(
            "Competitor,Days,Date,Acriss,Price\nHertz,7,2021-01-01,MBMR,42\n",
            "export.csv",
        );
        let out = run_upload(&upload).unwrap();
        assert_eq!(out.kind, UploadKind::Passthrough);
        assert_eq!(out.points.len(), 1);
        assert_eq!(out.points[0].competitor, "Hertz");
        assert_eq!(
            out.points[0].date,
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
        );
    }

    #[test]
    fn passthrough_without_point_columns_still_succeeds() {
        let upload = csv_upload("a,b\n1,2\n", "misc.csv");
        let out = run_upload(&upload).unwrap();
        assert_eq!(out.kind, UploadKind::Passthrough);
        assert!(out.points.is_empty());
        assert_eq!(out.table.n_rows(), 1);
    }

    #[test]
    fn unsupported_upload_fails_with_decode_error() {
        let upload = csv_upload("a,b\n", "notes.md");
        match run_upload(&upload) {
            Err(IngestError::Decode(_)) => {}
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
