//! Spreadsheet reading.
//!
//! Loads the first (or a named) worksheet of an uploaded order export into an
//! [`InputTable`], using the first row as header. Format detection is done
//! by calamine from the file contents; the extension is only checked up
//! front so obviously wrong uploads fail with a clear message.

use crate::error::DreError;
use crate::models::{CellValue, InputTable};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Extensions accepted for the uploaded spreadsheet.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// Cell texts read as missing values, matching the usual spreadsheet
/// tooling defaults. Compared exactly, after trimming.
pub const NA_STRINGS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A worksheet loaded into memory.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    /// Name of the worksheet the table came from.
    pub sheet_name: String,
    /// Header plus data rows, not yet normalized.
    pub table: InputTable,
}

/// Returns true when the file name carries a supported extension.
pub fn is_supported(file_name: &str) -> bool {
    extension_of(file_name)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Read a spreadsheet from disk.
pub fn read_path(path: &Path, sheet: Option<&str>) -> Result<LoadedSheet, DreError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path).map_err(|e| DreError::read(&file_name, e))?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    read_bytes(bytes, &file_name, sheet)
}

/// Read a spreadsheet from an in-memory upload.
///
/// `file_name` is the original name of the upload and is used for the
/// extension check and in error messages.
pub fn read_bytes(
    bytes: Vec<u8>,
    file_name: &str,
    sheet: Option<&str>,
) -> Result<LoadedSheet, DreError> {
    if !is_supported(file_name) {
        return Err(DreError::UnsupportedFormat {
            file: file_name.to_string(),
            extension: extension_of(file_name).unwrap_or_default(),
            expected: SUPPORTED_EXTENSIONS.join(", "),
        });
    }

    if bytes.is_empty() {
        return Err(DreError::read(file_name, "file is empty"));
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DreError::read(file_name, e))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| DreError::read(file_name, "workbook has no worksheets"))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DreError::read(file_name, format!("sheet '{}': {}", sheet_name, e)))?;

    let table = range_to_table(&range);
    info!(
        "Loaded sheet '{}' with {} columns and {} rows",
        sheet_name,
        table.column_count(),
        table.row_count()
    );

    Ok(LoadedSheet { sheet_name, table })
}

/// First row becomes the header, the rest become data rows.
fn range_to_table(range: &Range<Data>) -> InputTable {
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_name).collect(),
        None => return InputTable::new(Vec::new(), Vec::new()),
    };

    let data: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(to_cell).collect())
        .collect();

    InputTable::new(headers, data)
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        other => match to_cell(other) {
            CellValue::Empty => String::new(),
            value => value.to_string(),
        },
    }
}

fn to_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() || NA_STRINGS.contains(&s.trim()) => {
            CellValue::Empty
        }
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(serial) => CellValue::Number(serial.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
