//! Upload decoding.
//!
//! This module turns one uploaded file (a transport-encoded byte blob plus a
//! filename hint) into a row-oriented [`Table`], or fails with a
//! [`DecodeError`].
//!
//! Design goals:
//! - **Strict failure reporting**: an unsupported extension or corrupt payload
//!   is an explicit error, never a silent empty table
//! - **Deterministic behavior** (no format guessing beyond the filename hint)
//! - **Separation of concerns**: no normalization logic here; the workbook
//!   path returns the raw bench sheet for the caller to normalize

use std::io::Cursor;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use calamine::{Data, DataType as _, Reader as _, Xlsx};
use csv::ReaderBuilder;

use crate::domain::{Cell, Table, parse_date, parse_datetime};
use crate::error::{AppError, DecodeError};

/// The worksheet holding raw scraped competitor pricing rows.
pub const BENCH_SHEET: &str = "bench";

/// One upload event: transport-encoded content plus the filename hint.
///
/// `content` is `<mime-descriptor>,<base64 payload>`, split at the first
/// comma. The filename is used only for format dispatch.
#[derive(Debug, Clone)]
pub struct Upload {
    pub content: String,
    pub filename: String,
}

impl Upload {
    pub fn new(content: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            filename: filename.into(),
        }
    }

    /// Read a local file into the same transport encoding the upload widget
    /// produces, so the CLI exercises the identical decode path.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = match SourceFormat::sniff(&filename) {
            Some(SourceFormat::Delimited) => "data:text/csv;base64",
            Some(SourceFormat::Workbook) => {
                "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64"
            }
            None => "data:application/octet-stream;base64",
        };
        Ok(Self {
            content: format!("{mime},{}", BASE64.encode(&bytes)),
            filename,
        })
    }
}

/// Which parser the filename hint selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text, passed through verbatim.
    Delimited,
    /// Binary workbook whose `bench` sheet carries the raw observations.
    Workbook,
}

impl SourceFormat {
    /// Case-insensitive substring match, not a strict suffix match; that is
    /// how the upload widget's consumers have always dispatched.
    pub fn sniff(filename: &str) -> Option<Self> {
        let lower = filename.to_ascii_lowercase();
        if lower.contains("csv") {
            Some(SourceFormat::Delimited)
        } else if lower.contains("xlsx") {
            Some(SourceFormat::Workbook)
        } else {
            None
        }
    }
}

/// Decode result: a passthrough table, or the raw bench sheet awaiting
/// normalization.
#[derive(Debug, Clone)]
pub enum Decoded {
    Raw(Table),
    Bench(Table),
}

/// Decode one upload into a table.
pub fn decode_upload(upload: &Upload) -> Result<Decoded, DecodeError> {
    let format = SourceFormat::sniff(&upload.filename)
        .ok_or_else(|| DecodeError::UnsupportedExtension(upload.filename.clone()))?;

    let (_mime, payload) = upload
        .content
        .split_once(',')
        .ok_or(DecodeError::Transport)?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    match format {
        SourceFormat::Delimited => Ok(Decoded::Raw(parse_delimited(&bytes)?)),
        SourceFormat::Workbook => Ok(Decoded::Bench(parse_workbook(&bytes)?)),
    }
}

/// Parse UTF-8 delimited text, first row as headers.
fn parse_delimited(bytes: &[u8]) -> Result<Table, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::Utf8(e.to_string()))?;

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns = reader
        .headers()
        .map_err(|e| DecodeError::Csv(e.to_string()))?
        .iter()
        .map(clean_header)
        .collect::<Vec<_>>();

    let mut table = Table::new(columns);
    for result in reader.records() {
        let record = result.map_err(|e| DecodeError::Csv(e.to_string()))?;
        table.push_row(record.iter().map(infer_cell).collect());
    }
    Ok(table)
}

/// Parse workbook bytes and extract the bench sheet.
fn parse_workbook(bytes: &[u8]) -> Result<Table, DecodeError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes.to_vec())).map_err(|e| DecodeError::Workbook(e.to_string()))?;

    if !workbook.sheet_names().iter().any(|n| n == BENCH_SHEET) {
        return Err(DecodeError::MissingSheet(BENCH_SHEET.to_string()));
    }

    let range = workbook
        .worksheet_range(BENCH_SHEET)
        .map_err(|e| DecodeError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => header
            .iter()
            .map(|c| clean_header(&c.as_string().unwrap_or_default()))
            .collect::<Vec<_>>(),
        None => Vec::new(),
    };

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(cell_from_sheet).collect());
    }
    Ok(table)
}

/// Excel and other tools sometimes emit UTF-8 with a BOM prefix on the first
/// header. If we don't strip it, the rename map misses the column.
fn clean_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Light scalar inference for delimited text: number, then ISO-ish date,
/// else text. Empty fields are missing values.
fn infer_cell(field: &str) -> Cell {
    let field = field.trim();
    if field.is_empty() {
        return Cell::Null;
    }
    if let Ok(v) = field.parse::<f64>() {
        if v.is_finite() {
            return Cell::Number(v);
        }
    }
    if let Some(d) = parse_date(field) {
        return Cell::Date(d);
    }
    if let Some(dt) = parse_datetime(field) {
        return Cell::DateTime(dt);
    }
    Cell::Text(field.to_string())
}

/// Map one workbook cell to a table cell.
fn cell_from_sheet(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Cell::Null
            } else {
                Cell::Text(s.to_string())
            }
        }
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(_) => match value.as_datetime() {
            Some(dt) => Cell::DateTime(dt),
            None => value.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
        },
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(Cell::DateTime)
            .or_else(|| parse_date(s).map(Cell::Date))
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
