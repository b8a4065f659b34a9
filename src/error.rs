//! Error types.
//!
//! The core distinguishes two failure kinds, both terminal for the upload
//! attempt that produced them:
//!
//! - [`DecodeError`]: the uploaded content could not be turned into a table
//!   (transport encoding, base64, UTF-8, extension, workbook, sheet).
//! - [`SchemaError`]: the decoded table is structurally valid but lacks a
//!   column the normalizer needs.
//!
//! At the binary boundary both collapse into [`AppError`], which carries the
//! process exit code (2 = input problems, 4 = terminal/render problems).

use std::fmt;

/// Failure while decoding an upload into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The transport string had no `<mime>,<payload>` comma separator.
    Transport,
    /// The payload was not valid base64.
    Base64(String),
    /// Decoded bytes were not valid UTF-8 (delimited-text path).
    Utf8(String),
    /// The filename matched neither supported format.
    UnsupportedExtension(String),
    /// Delimited text could not be parsed as rows/columns.
    Csv(String),
    /// The workbook bytes could not be opened.
    Workbook(String),
    /// The workbook has no sheet with the expected name.
    MissingSheet(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Transport => {
                write!(f, "Malformed upload: expected `<mime>,<base64>` content.")
            }
            DecodeError::Base64(e) => write!(f, "Invalid base64 payload: {e}"),
            DecodeError::Utf8(e) => write!(f, "Uploaded text is not valid UTF-8: {e}"),
            DecodeError::UnsupportedExtension(name) => {
                write!(f, "Unsupported file type '{name}' (expected csv or xlsx).")
            }
            DecodeError::Csv(e) => write!(f, "Failed to parse delimited text: {e}"),
            DecodeError::Workbook(e) => write!(f, "Failed to open workbook: {e}"),
            DecodeError::MissingSheet(name) => {
                write!(f, "Workbook has no '{name}' sheet.")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// The decoded table lacks a column required for normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub column: String,
}

impl SchemaError {
    pub fn missing(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing required column: `{}`", self.column)
    }
}

impl std::error::Error for SchemaError {}

/// Either failure kind of one upload attempt.
///
/// The dashboard shows one generic notice for both; the CLI prints the
/// specific message.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    Decode(DecodeError),
    Schema(SchemaError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Decode(e) => e.fmt(f),
            IngestError::Schema(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<DecodeError> for IngestError {
    fn from(e: DecodeError) -> Self {
        IngestError::Decode(e)
    }
}

impl From<SchemaError> for IngestError {
    fn from(e: SchemaError) -> Self {
        IngestError::Schema(e)
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        AppError::new(2, e.to_string())
    }
}
