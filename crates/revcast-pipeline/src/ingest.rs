use crate::dates::parse_date_text;
use crate::observation::{Cell, RawTable};
use calamine::{open_workbook_auto, Data, Reader};
use revcast_core::ForecastError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Spreadsheet formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    /// Office Open XML workbook.
    Xlsx,
    /// Legacy binary workbook.
    Xls,
}

impl SpreadsheetKind {
    /// Determine the kind from a file name, rejecting anything that is not
    /// `.xlsx` or `.xls`.
    pub fn from_file_name(name: &str) -> Result<Self, ForecastError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" => Ok(SpreadsheetKind::Xlsx),
            "xls" => Ok(SpreadsheetKind::Xls),
            _ => Err(ForecastError::UnsupportedFile { extension }),
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            SpreadsheetKind::Xlsx => "xlsx",
            SpreadsheetKind::Xls => "xls",
        }
    }
}

/// An uploaded spreadsheet staged in temporary storage.
///
/// The backing file is removed when this value is dropped, whichever way the
/// request ends.
#[derive(Debug)]
pub struct UploadedFile {
    kind: SpreadsheetKind,
    original_name: String,
    file: NamedTempFile,
}

impl UploadedFile {
    /// Accept an upload and stage its bytes on disk.
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> Result<Self, ForecastError> {
        let kind = SpreadsheetKind::from_file_name(file_name)?;

        let mut file = tempfile::Builder::new()
            .prefix("revcast-upload-")
            .suffix(&format!(".{}", kind.extension()))
            .tempfile()
            .map_err(|e| ForecastError::Spreadsheet(format!("cannot stage upload: {e}")))?;
        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|e| ForecastError::Spreadsheet(format!("cannot stage upload: {e}")))?;

        info!(
            file = %file_name,
            bytes = bytes.len(),
            path = %file.path().display(),
            "Staged uploaded spreadsheet"
        );

        Ok(Self {
            kind,
            original_name: file_name.to_string(),
            file,
        })
    }

    /// Location of the staged copy.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Spreadsheet kind of the upload.
    pub fn kind(&self) -> SpreadsheetKind {
        self.kind
    }

    /// File name as supplied by the uploader.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

/// Read the first worksheet of a workbook. The first row supplies the headers.
pub fn read_workbook(path: &Path) -> Result<RawTable, ForecastError> {
    SpreadsheetKind::from_file_name(&path.to_string_lossy())?;

    let mut workbook = open_workbook_auto(path).map_err(|e| {
        ForecastError::Spreadsheet(format!("cannot open '{}': {e}", path.display()))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ForecastError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| ForecastError::Spreadsheet(format!("cannot read first worksheet: {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| convert(c).to_string()).collect(),
        None => return Ok(RawTable::default()),
    };
    let rows: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(convert).collect()).collect();

    debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "Read worksheet"
    );

    Ok(RawTable::new(headers, rows))
}

fn convert(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Cell::Date(d.date()))
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_date_text(s)
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}
