//! Per-session dashboard state.
//!
//! One session holds the most recently uploaded table and its point set.
//! Each successful upload wholesale REPLACES the previous data (never
//! merges); a failed upload leaves it untouched. There is no process-wide
//! shared state: every session starts from its own fresh placeholder.

use crate::domain::{PricePoint, Table};
use crate::error::IngestError;
use crate::io::decode::Upload;
use crate::normalize::{RowError, placeholder_points, points_table};

use super::pipeline::{UploadOutput, run_upload};

pub struct Session {
    /// Filename of the last successful upload, if any.
    pub source: Option<String>,
    pub points: Vec<PricePoint>,
    pub row_errors: Vec<RowError>,
    /// Raw passthrough table for delimited uploads; `None` means the table
    /// form is derived from the points.
    raw_table: Option<Table>,
}

impl Session {
    /// Session-start state: the placeholder grid, so the editable grid and
    /// chart have a schema before any upload.
    pub fn new() -> Self {
        Self {
            source: None,
            points: placeholder_points(),
            row_errors: Vec::new(),
            raw_table: None,
        }
    }

    /// Decode and normalize an upload; replace the session data only on
    /// success.
    pub fn load(&mut self, upload: &Upload) -> Result<(), IngestError> {
        let output = run_upload(upload)?;
        self.replace(output);
        Ok(())
    }

    /// The table the UI layer displays/exports.
    pub fn table(&self) -> Table {
        self.raw_table
            .clone()
            .unwrap_or_else(|| points_table(&self.points))
    }

    /// Update the price of the point identified by its (competitor, days,
    /// date, acriss) tuple. Returns false when no such point exists.
    pub fn set_price(&mut self, key: &PricePoint, price: f64) -> bool {
        let Some(point) = self.points.iter_mut().find(|p| {
            p.competitor == key.competitor
                && p.days == key.days
                && p.date == key.date
                && p.acriss == key.acriss
        }) else {
            return false;
        };
        point.price = price;
        true
    }

    fn replace(&mut self, output: UploadOutput) {
        self.source = Some(output.filename);
        self.points = output.points;
        self.row_errors = output.row_errors;
        self.raw_table = match output.kind {
            super::pipeline::UploadKind::Passthrough => Some(output.table),
            super::pipeline::UploadKind::Normalized => None,
        };
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;

    fn csv_upload(body: &str, filename: &str) -> Upload {
        Upload::new(
            format!("data:text/csv;base64,{}", BASE64.encode(body)),
            filename,
        )
    }

    #[test]
    fn starts_with_placeholder() {
        let session = Session::new();
        assert!(session.source.is_none());
        assert!(!session.points.is_empty());
        assert_eq!(session.table().n_rows(), session.points.len());
    }

    #[test]
    fn successful_upload_replaces_everything() {
        let mut session = Session::new();
        let upload = csv_upload(
            "Competitor,Days,Date,Acriss,Price\nSixt,7,2021-02-01,MBMR,61\n",
            "feb.csv",
        );
        session.load(&upload).unwrap();
        assert_eq!(session.source.as_deref(), Some("feb.csv"));
        assert_eq!(session.points.len(), 1);
        assert_eq!(session.points[0].competitor, "Sixt");
    }

    #[test]
    fn failed_upload_preserves_previous_data() {
        let mut session = Session::new();
        let before = session.points.clone();

        let bad = Upload::new("no comma here", "prices.csv");
        assert!(session.load(&bad).is_err());
        assert_eq!(session.points, before);
        assert!(session.source.is_none());
    }

    #[test]
    fn price_edit_updates_exactly_one_point() {
        let mut session = Session::new();
        let key = session.points[0].clone();
        let untouched = session.points[1].clone();

        assert!(session.set_price(&key, 73.5));
        assert_eq!(session.points[0].price, 73.5);
        assert_eq!(session.points[1], untouched);

        let mut missing = key.clone();
        missing.competitor = "Nobody".to_string();
        assert!(!session.set_price(&missing, 1.0));
    }
}
