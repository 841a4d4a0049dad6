//! `plancheck-io`: raw table acquisition and report export.
//!
//! Documents come in as `RawGrid`s with no header semantics; comparison
//! reports go out as xlsx, csv or json.

use std::fmt;
use std::path::{Path, PathBuf};

use plancheck_core::RawGrid;

pub mod csv;
pub mod docx;
pub mod export;
pub mod subject;
pub mod xlsx;

#[derive(Debug)]
pub enum IoError {
    /// Filesystem error on a specific path.
    Io { path: PathBuf, message: String },
    /// Extension with no table reader.
    Unsupported { path: PathBuf, extension: String },
    /// Broken zip container (.docx).
    Archive(String),
    /// Malformed XML or CSV content.
    Parse(String),
    /// Workbook could not be opened or read.
    Workbook(String),
    /// Requested sheet is absent.
    SheetMissing { sheet: String, available: Vec<String> },
    /// Report could not be written.
    Export(String),
}

impl IoError {
    pub(crate) fn io(path: &Path, err: impl fmt::Display) -> Self {
        Self::Io { path: path.to_path_buf(), message: err.to_string() }
    }

    /// Prefix container-level errors with the file they came from.
    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            Self::Archive(msg) => Self::Archive(format!("{}: {msg}", path.display())),
            Self::Parse(msg) => Self::Parse(format!("{}: {msg}", path.display())),
            other => other,
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Unsupported { path, extension } => {
                write!(f, "{}: unsupported document type '.{extension}'", path.display())
            }
            Self::Archive(msg) => write!(f, "invalid archive: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Workbook(msg) => write!(f, "workbook error: {msg}"),
            Self::SheetMissing { sheet, available } => {
                write!(f, "sheet '{sheet}' not found (available: {})", available.join(", "))
            }
            Self::Export(msg) => write!(f, "export failed: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}

/// Source formats with a table reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Docx,
    Csv,
    Tsv,
    Workbook,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "docx" => Ok(Self::Docx),
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Workbook),
            _ => Err(IoError::Unsupported { path: path.to_path_buf(), extension: ext }),
        }
    }
}

/// Every table in a document, in document order.
///
/// Word documents yield one grid per top-level table, workbooks one grid per
/// sheet, delimited text files a single grid.
pub fn read_document(path: &Path) -> Result<Vec<RawGrid>, IoError> {
    match DocumentKind::from_path(path)? {
        DocumentKind::Docx => docx::read_tables(path),
        DocumentKind::Csv => Ok(vec![csv::read_grid(path)?]),
        DocumentKind::Tsv => Ok(vec![csv::read_grid_with_delimiter(path, b'\t')?]),
        DocumentKind::Workbook => xlsx::read_sheets(path),
    }
}
