//! Bench-sheet normalization.
//!
//! This module turns the raw bench sheet (Spanish headers, duplicated
//! observations, mixed date formats) into the canonical price-point set:
//! one row per (competitor, duration, date, ACRISS code) carrying the
//! minimum observed price.
//!
//! Design goals:
//! - **Pure function of its input** (idempotent, no hidden state)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: filtering by the dashboard selection is a
//!   separate step applied after normalization, never folded into the pivot

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{
    Cell, DEFAULT_ACRISS, DEFAULT_DAYS, PricePoint, Selection, Table,
};
use crate::error::SchemaError;

/// Fixed source-header rename map for the bench sheet.
pub const BENCH_COLUMNS: [(&str, &str); 11] = [
    ("Fecha", "Date"),
    ("Site", "Web"),
    ("Días", "Days"),
    ("Coche", "Car"),
    ("Categoria", "Category"),
    ("Acriss", "Acriss"),
    ("Transmisión", "Transmition"),
    ("Asientos", "Seats"),
    ("Puertas", "Doors"),
    ("Proveedor", "Competitor"),
    ("Precio", "Price"),
];

/// Output column order of the normalized table.
pub const POINT_COLUMNS: [&str; 5] = ["Competitor", "Days", "Date", "Acriss", "Price"];

/// A row-level problem encountered during normalization.
#[derive(Debug, Clone)]
pub struct RowError {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub message: String,
}

/// Normalization output: the point set plus its table form and row accounting.
#[derive(Debug, Clone)]
pub struct NormalizedData {
    pub points: Vec<PricePoint>,
    pub table: Table,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Normalize a bench-shaped table into the canonical price-point set.
///
/// Steps, in order: rename columns, drop rows with any missing value,
/// group by (Competitor, Days, Date, Acriss) reducing each group to its
/// minimum price, canonicalize dates to date-only, and sort by
/// (Competitor, Date) ascending; Days and Acriss complete the key so the
/// order is total.
pub fn normalize(table: &Table) -> Result<NormalizedData, SchemaError> {
    let columns = rename_columns(&table.columns);

    let col = |name: &str| -> Result<usize, SchemaError> {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| SchemaError::missing(name))
    };
    let competitor_idx = col("Competitor")?;
    let days_idx = col("Days")?;
    let date_idx = col("Date")?;
    let acriss_idx = col("Acriss")?;
    let price_idx = col("Price")?;

    let mut groups: BTreeMap<(String, u32, NaiveDate, String), f64> = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;

    for (idx, cells) in table.data.iter().enumerate() {
        rows_read += 1;
        let row = idx + 1;

        // Strict policy: a missing value in ANY column discards the whole
        // row. Partial observations never participate in the minimum.
        if cells.iter().any(Cell::is_null) {
            continue;
        }

        match parse_point(cells, competitor_idx, days_idx, date_idx, acriss_idx, price_idx) {
            Ok((key, price)) => {
                rows_used += 1;
                groups
                    .entry(key)
                    .and_modify(|min| *min = min.min(price))
                    .or_insert(price);
            }
            Err(message) => row_errors.push(RowError { row, message }),
        }
    }

    let mut points: Vec<PricePoint> = groups
        .into_iter()
        .map(|((competitor, days, date, acriss), price)| PricePoint {
            competitor,
            days,
            date,
            acriss,
            price,
        })
        .collect();

    points.sort_by(|a, b| {
        a.competitor
            .cmp(&b.competitor)
            .then(a.date.cmp(&b.date))
            .then(a.days.cmp(&b.days))
            .then(a.acriss.cmp(&b.acriss))
    });

    let table = points_table(&points);
    Ok(NormalizedData {
        points,
        table,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Apply the fixed rename map. Unknown columns pass through unchanged.
pub fn rename_columns(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|name| {
            BENCH_COLUMNS
                .iter()
                .find(|(from, _)| from == name)
                .map(|(_, to)| to.to_string())
                .unwrap_or_else(|| name.clone())
        })
        .collect()
}

fn parse_point(
    cells: &[Cell],
    competitor_idx: usize,
    days_idx: usize,
    date_idx: usize,
    acriss_idx: usize,
    price_idx: usize,
) -> Result<((String, u32, NaiveDate, String), f64), String> {
    let competitor = cells[competitor_idx]
        .as_text()
        .ok_or_else(|| "Missing `Competitor` value.".to_string())?;

    let days_raw = cells[days_idx]
        .as_number()
        .ok_or_else(|| "Non-numeric `Days` value.".to_string())?;
    if days_raw.fract() != 0.0 || days_raw < 1.0 || days_raw > u32::MAX as f64 {
        return Err(format!("Invalid `Days` value {days_raw}."));
    }
    let days = days_raw as u32;

    // Date canonicalization: whatever time component or format the source
    // carried, only the calendar date survives.
    let date = cells[date_idx]
        .as_date_only()
        .ok_or_else(|| "Invalid `Date` value.".to_string())?;

    let acriss = cells[acriss_idx]
        .as_text()
        .ok_or_else(|| "Missing `Acriss` value.".to_string())?;

    let price = cells[price_idx]
        .as_number()
        .ok_or_else(|| "Non-numeric `Price` value.".to_string())?;

    Ok(((competitor, days, date, acriss), price))
}

/// Table form of a point set, in the fixed output column order.
pub fn points_table(points: &[PricePoint]) -> Table {
    let mut table = Table::new(POINT_COLUMNS.iter().map(|c| c.to_string()).collect());
    for p in points {
        table.push_row(vec![
            Cell::Text(p.competitor.clone()),
            Cell::Number(p.days as f64),
            Cell::Date(p.date),
            Cell::Text(p.acriss.clone()),
            Cell::Number(p.price),
        ]);
    }
    table
}

/// Read a point set back out of a table carrying the output columns.
///
/// Used when a previously exported (or already normalized) table arrives via
/// the delimited-text passthrough: the chart can still plot it. Returns
/// `None` when the columns aren't there; rows that don't parse are skipped.
pub fn points_from_table(table: &Table) -> Option<Vec<PricePoint>> {
    let competitor_idx = table.column_index("Competitor")?;
    let days_idx = table.column_index("Days")?;
    let date_idx = table.column_index("Date")?;
    let acriss_idx = table.column_index("Acriss")?;
    let price_idx = table.column_index("Price")?;

    let mut points = Vec::with_capacity(table.n_rows());
    for cells in &table.data {
        if cells.iter().any(Cell::is_null) {
            continue;
        }
        if let Ok(((competitor, days, date, acriss), price)) =
            parse_point(cells, competitor_idx, days_idx, date_idx, acriss_idx, price_idx)
        {
            points.push(PricePoint {
                competitor,
                days,
                date,
                acriss,
                price,
            });
        }
    }
    Some(points)
}

/// Membership filter over the dashboard selection. A separate step applied
/// after normalization.
pub fn filter_points(points: &[PricePoint], selection: &Selection) -> Vec<PricePoint> {
    points
        .iter()
        .filter(|p| selection.matches(p))
        .cloned()
        .collect()
}

/// Session-start placeholder: a fixed grid at the default selection with
/// every price set to one constant, so the editable grid and chart have a
/// schema before any upload. Each session builds its own fresh copy.
pub fn placeholder_points() -> Vec<PricePoint> {
    const PROVIDERS: [&str; 3] = ["Avis", "Europcar", "Hertz"];
    const PLACEHOLDER_PRICE: f64 = 100.0;
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default();

    let mut points = Vec::with_capacity(PROVIDERS.len() * 7);
    for provider in PROVIDERS {
        for offset in 0..7 {
            points.push(PricePoint {
                competitor: provider.to_string(),
                days: DEFAULT_DAYS,
                date: start + chrono::Duration::days(offset),
                acriss: DEFAULT_ACRISS.to_string(),
                price: PLACEHOLDER_PRICE,
            });
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    fn bench_columns() -> Vec<String> {
        [
            "Fecha",
            "Site",
            "Días",
            "Coche",
            "Categoria",
            "Acriss",
            "Transmisión",
            "Asientos",
            "Puertas",
            "Proveedor",
            "Precio",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect()
    }

    fn bench_row(provider: &str, days: f64, day: u32, acriss: &str, price: Cell) -> Vec<Cell> {
        vec![
            Cell::Date(date(day)),
            Cell::Text("rentalsite.es".to_string()),
            Cell::Number(days),
            Cell::Text("Fiat 500".to_string()),
            Cell::Text("Mini".to_string()),
            Cell::Text(acriss.to_string()),
            Cell::Text("Manual".to_string()),
            Cell::Number(4.0),
            Cell::Number(3.0),
            Cell::Text(provider.to_string()),
            price,
        ]
    }

    fn bench_table(rows: Vec<Vec<Cell>>) -> Table {
        let mut t = Table::new(bench_columns());
        for r in rows {
            t.push_row(r);
        }
        t
    }

    #[test]
    fn groups_reduce_to_minimum_price() {
        let table = bench_table(vec![
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(50.0)),
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(42.0)),
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(60.0)),
        ]);
        let out = normalize(&table).unwrap();
        assert_eq!(out.points.len(), 1);
        assert_eq!(out.points[0].price, 42.0);
        assert_eq!(out.rows_read, 3);
        assert_eq!(out.rows_used, 3);
    }

    #[test]
    fn missing_price_is_excluded_from_the_minimum() {
        let table = bench_table(vec![
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Null),
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(55.0)),
        ]);
        let out = normalize(&table).unwrap();
        assert_eq!(out.points.len(), 1);
        assert_eq!(out.points[0].price, 55.0);
        assert!(out.row_errors.is_empty());
    }

    #[test]
    fn missing_value_in_any_column_drops_the_row() {
        let mut incomplete = bench_row("Avis", 7.0, 2, "MBMR", Cell::Number(30.0));
        incomplete[3] = Cell::Null; // car name missing
        let table = bench_table(vec![
            incomplete,
            bench_row("Avis", 7.0, 2, "MBMR", Cell::Number(48.0)),
        ]);
        let out = normalize(&table).unwrap();
        assert_eq!(out.points.len(), 1);
        assert_eq!(out.points[0].price, 48.0);
    }

    #[test]
    fn renamed_columns_do_not_survive_under_source_names() {
        let renamed = rename_columns(&bench_columns());
        for (from, to) in BENCH_COLUMNS {
            assert!(!renamed.iter().any(|c| c == from && from != to));
            assert!(renamed.iter().any(|c| c == to));
        }
        // Unknown columns pass through.
        let extra = rename_columns(&["Extra".to_string()]);
        assert_eq!(extra, ["Extra"]);
    }

    #[test]
    fn missing_price_column_is_a_schema_error() {
        let mut columns = bench_columns();
        columns.retain(|c| c != "Precio");
        let table = Table::new(columns);
        let err = normalize(&table).unwrap_err();
        assert_eq!(err.column, "Price");
    }

    #[test]
    fn output_is_sorted_by_competitor_then_date() {
        let table = bench_table(vec![
            bench_row("Sixt", 7.0, 3, "MBMR", Cell::Number(70.0)),
            bench_row("Avis", 7.0, 5, "MBMR", Cell::Number(30.0)),
            bench_row("Sixt", 7.0, 1, "MBMR", Cell::Number(65.0)),
            bench_row("Avis", 7.0, 2, "MBMR", Cell::Number(28.0)),
        ]);
        let out = normalize(&table).unwrap();
        let order: Vec<(String, NaiveDate)> = out
            .points
            .iter()
            .map(|p| (p.competitor.clone(), p.date))
            .collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    #[test]
    fn dates_are_canonicalized_to_date_only() {
        let mut row = bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(40.0));
        row[0] = Cell::DateTime(date(1).and_hms_opt(15, 45, 12).unwrap());
        let out = normalize(&bench_table(vec![row])).unwrap();
        assert_eq!(out.points[0].date, date(1));
    }

    #[test]
    fn unparseable_values_are_reported_per_row() {
        let mut bad = bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(40.0));
        bad[2] = Cell::Text("una semana".to_string()); // Days not numeric
        let table = bench_table(vec![
            bad,
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(44.0)),
        ]);
        let out = normalize(&table).unwrap();
        assert_eq!(out.points.len(), 1);
        assert_eq!(out.points[0].price, 44.0);
        assert_eq!(out.row_errors.len(), 1);
        assert_eq!(out.row_errors[0].row, 1);
    }

    #[test]
    fn normalization_is_idempotent() {
        let table = bench_table(vec![
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(50.0)),
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(42.0)),
            bench_row("Avis", 14.0, 2, "CCAR", Cell::Number(90.0)),
        ]);
        let first = normalize(&table).unwrap();
        let second = normalize(&first.table).unwrap();
        assert_eq!(first.points, second.points);
    }

    #[test]
    fn filter_is_membership_over_both_selectors() {
        let table = bench_table(vec![
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(50.0)),
            bench_row("Hertz", 14.0, 1, "MBMR", Cell::Number(80.0)),
            bench_row("Hertz", 7.0, 1, "CCAR", Cell::Number(60.0)),
        ]);
        let out = normalize(&table).unwrap();

        let sel = Selection::new(&[7, 14], &["MBMR".to_string()]);
        let filtered = filter_points(&out.points, &sel);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|p| p.acriss == "MBMR"));
    }

    #[test]
    fn points_round_trip_through_table_form() {
        let table = bench_table(vec![
            bench_row("Hertz", 7.0, 1, "MBMR", Cell::Number(50.0)),
            bench_row("Avis", 14.0, 2, "CCAR", Cell::Number(90.0)),
        ]);
        let out = normalize(&table).unwrap();
        let back = points_from_table(&out.table).unwrap();
        assert_eq!(out.points, back);
    }

    #[test]
    fn placeholder_has_schema_and_constant_prices() {
        let points = placeholder_points();
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.price == points[0].price));
        assert!(points.iter().all(|p| p.days == DEFAULT_DAYS));
        assert!(points.iter().all(|p| p.acriss == DEFAULT_ACRISS));
        // Fresh copy per call; sessions never share state.
        assert_eq!(points, placeholder_points());

        let table = points_table(&points);
        assert_eq!(table.columns, POINT_COLUMNS);
    }
}
