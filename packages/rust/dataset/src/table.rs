//! In-memory table: ordered header plus ordered rows of cells.

use coursegeo_shared::{CourseGeoError, LATITUDE_COLUMN, LONGITUDE_COLUMN, Result, Value};

static NULL: Value = Value::Null;

/// An ordered collection of records sharing one header.
///
/// Every row is exactly as wide as the header. Columns can be appended but
/// never removed, and row order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create an empty dataset with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with `Null`; long rows are rejected.
    pub fn push_row(&mut self, mut row: Vec<Value>) -> Result<()> {
        if row.len() > self.columns.len() {
            return Err(CourseGeoError::validation(format!(
                "row {} has {} cells but the header has {} columns",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Return the index of `name`, appending it (filled with `Null`) if absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        self.columns.len() - 1
    }

    /// Guarantee both coordinate columns exist. Returns `(latitude, longitude)` indices.
    pub fn ensure_coordinate_columns(&mut self) -> (usize, usize) {
        let lat = self.ensure_column(LATITUDE_COLUMN);
        let lon = self.ensure_column(LONGITUDE_COLUMN);
        (lat, lon)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Overwrite a single cell. Touches nothing but `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: Value) -> Result<()> {
        let width = self.columns.len();
        let len = self.rows.len();
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or_else(|| {
                CourseGeoError::validation(format!(
                    "cell ({row}, {col}) out of range for {len} rows x {width} columns"
                ))
            })?;
        *cell = value;
        Ok(())
    }

    /// Iterate one column top to bottom.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| r.get(col).unwrap_or(&NULL))
    }
}
