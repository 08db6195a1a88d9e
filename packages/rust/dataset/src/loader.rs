//! Dataset loading from CSV and spreadsheet files.
//!
//! Whatever the source, the returned [`Dataset`] always carries `latitude`
//! and `longitude` columns so callers can write to them positionally.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::{debug, info, instrument};

use coursegeo_shared::{CourseGeoError, LATITUDE_COLUMN, LONGITUDE_COLUMN, Result, Value};

use crate::table::Dataset;

/// Input formats recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    /// Detect the format from a path's extension (case-insensitive).
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// Load a dataset, preserving row order and every input column.
///
/// Missing coordinate columns are appended and filled with `Null`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.is_file() {
        return Err(CourseGeoError::load(path, "file not found"));
    }

    let format = SourceFormat::detect(path).ok_or_else(|| {
        CourseGeoError::load(path, "unsupported extension (expected .csv or a spreadsheet)")
    })?;

    let mut dataset = match format {
        SourceFormat::Csv => load_csv(path)?,
        SourceFormat::Spreadsheet => load_spreadsheet(path)?,
    };

    let had_coordinates = dataset.column_index(LATITUDE_COLUMN).is_some()
        && dataset.column_index(LONGITUDE_COLUMN).is_some();
    dataset.ensure_coordinate_columns();
    if !had_coordinates {
        debug!("added missing coordinate columns");
    }

    info!(
        ?format,
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "dataset loaded"
    );

    Ok(dataset)
}

fn is_coordinate_column(name: &str) -> bool {
    name == LATITUDE_COLUMN || name == LONGITUDE_COLUMN
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| CourseGeoError::load(path, e.to_string()))?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| CourseGeoError::load(path, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if columns.is_empty() {
        return Err(CourseGeoError::load(path, "missing header row"));
    }

    let coordinate_cols: Vec<bool> = columns.iter().map(|c| is_coordinate_column(c)).collect();
    let mut dataset = Dataset::new(columns);

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CourseGeoError::load(path, e.to_string()))?;
        let row = record
            .iter()
            .enumerate()
            .map(|(col, field)| {
                if coordinate_cols.get(col).copied().unwrap_or(false) {
                    Value::parse_coordinate(field)
                } else {
                    Value::text(field)
                }
            })
            .collect();
        dataset
            .push_row(row)
            .map_err(|e| CourseGeoError::load(path, format!("record {}: {e}", line + 1)))?;
    }

    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path) -> Result<Dataset> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| CourseGeoError::load(path, e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CourseGeoError::load(path, "workbook has no worksheets"))?
        .map_err(|e| CourseGeoError::load(path, e.to_string()))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| CourseGeoError::load(path, "first worksheet is empty"))?;

    let columns: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();
    let coordinate_cols: Vec<bool> = columns.iter().map(|c| is_coordinate_column(c)).collect();
    let mut dataset = Dataset::new(columns);

    for (line, cells) in rows.enumerate() {
        let row = cells
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                if coordinate_cols.get(col).copied().unwrap_or(false) {
                    coordinate_cell(cell)
                } else {
                    payload_cell(cell)
                }
            })
            .collect();
        dataset
            .push_row(row)
            .map_err(|e| CourseGeoError::load(path, format!("row {}: {e}", line + 2)))?;
    }

    Ok(dataset)
}

fn coordinate_cell(cell: &Data) -> Value {
    match cell {
        Data::Float(f) => Value::coordinate(*f),
        Data::Int(i) => Value::coordinate(*i as f64),
        Data::String(s) => Value::parse_coordinate(s),
        _ => Value::Null,
    }
}

fn payload_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::text(s.as_str()),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Bool(*b),
        other => Value::text(other.to_string()),
    }
}
