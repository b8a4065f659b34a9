//! Row-oriented table with typed cells.
//!
//! `Table` is the interchange shape between the decoder, the normalizer, and
//! the UI layer: ordered column names plus row-major cells. Its JSON form is
//! the "split" layout `{"columns": [...], "data": [[...]]}` with dates and
//! datetimes written as explicit ISO-8601 strings, so a downstream consumer
//! can reconstruct the table losslessly with no schema file.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view: numbers directly, numeric-looking text parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => {
                let v = s.trim().parse::<f64>().ok()?;
                if v.is_finite() { Some(v) } else { None }
            }
            _ => None,
        }
    }

    /// Date-only view: datetimes lose their time component, text is parsed
    /// with the common export formats.
    pub fn as_date_only(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => parse_date(s.trim()).or_else(|| parse_datetime(s.trim()).map(|dt| dt.date())),
            _ => None,
        }
    }

    /// Display form for identity fields (competitor, codes).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Number(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{v}")
                }
            }
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Date(d) => write!(f, "{}", d.format(DATE_FMT)),
            Cell::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FMT)),
        }
    }
}

/// Parse a calendar date in the formats competitor exports actually use.
///
/// ISO (`YYYY-MM-DD`) is preferred, but scraped sheets often carry
/// `DD/MM/YYYY` or `DD-MM-YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    FMTS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse an ISO-8601 datetime (with or without fractional seconds).
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_unit(),
            Cell::Number(v) => serializer.serialize_f64(*v),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Date(d) => serializer.serialize_str(&d.format(DATE_FMT).to_string()),
            Cell::DateTime(dt) => serializer.serialize_str(&dt.format(DATETIME_FMT).to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CellVisitor;

        impl<'de> Visitor<'de> for CellVisitor {
            type Value = Cell;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("null, a number, or a string")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Cell, E> {
                Ok(Cell::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Cell, E> {
                Ok(Cell::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Cell, D::Error> {
                Cell::deserialize(d)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Cell, E> {
                Ok(Cell::Number(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cell, E> {
                Ok(Cell::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cell, E> {
                Ok(Cell::Number(v as f64))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Cell, E> {
                Ok(Cell::Text(v.to_string()))
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<Cell, E> {
                // ISO-looking strings come back as the date variants they
                // were written from; everything else stays text.
                if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FMT) {
                    return Ok(Cell::Date(d));
                }
                if let Some(dt) = parse_datetime(s) {
                    return Ok(Cell::DateTime(dt));
                }
                Ok(Cell::Text(s.to_string()))
            }
        }

        deserializer.deserialize_any(CellVisitor)
    }
}

/// Ordered columns + row-major cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            data: Vec::new(),
        }
    }

    /// Append a row, padding or truncating to the table width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.data.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn n_rows(&self) -> usize {
        self.data.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut t = Table::new(vec![
            "Competitor".to_string(),
            "Date".to_string(),
            "Price".to_string(),
            "Note".to_string(),
        ]);
        t.push_row(vec![
            Cell::Text("Hertz".to_string()),
            Cell::Date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()),
            Cell::Number(42.5),
            Cell::Null,
        ]);
        t.push_row(vec![
            Cell::Text("Avis".to_string()),
            Cell::DateTime(
                NaiveDate::from_ymd_opt(2021, 1, 2)
                    .unwrap()
                    .and_hms_opt(13, 30, 0)
                    .unwrap(),
            ),
            Cell::Number(50.0),
            Cell::Text("promo".to_string()),
        ]);
        t
    }

    #[test]
    fn split_json_round_trip_is_lossless() {
        let table = sample_table();
        let json = serde_json::to_string(&table).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
    }

    #[test]
    fn dates_serialize_as_iso_strings() {
        let table = sample_table();
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"2021-01-01\""));
        assert!(json.contains("\"2021-01-02T13:30:00\""));
    }

    #[test]
    fn push_row_pads_short_rows() {
        let mut t = Table::new(vec!["a".to_string(), "b".to_string()]);
        t.push_row(vec![Cell::Number(1.0)]);
        assert_eq!(t.data[0], vec![Cell::Number(1.0), Cell::Null]);
    }

    #[test]
    fn cell_coercions() {
        assert_eq!(Cell::Text(" 42.5 ".to_string()).as_number(), Some(42.5));
        assert_eq!(Cell::Text("n/a".to_string()).as_number(), None);

        let d = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
        assert_eq!(Cell::Text("14/03/2021".to_string()).as_date_only(), Some(d));
        assert_eq!(
            Cell::DateTime(d.and_hms_opt(9, 0, 0).unwrap()).as_date_only(),
            Some(d)
        );
        assert_eq!(Cell::Number(7.0).as_date_only(), None);

        assert_eq!(Cell::Number(7.0).as_text().as_deref(), Some("7"));
        assert_eq!(Cell::Null.as_text(), None);
    }
}
