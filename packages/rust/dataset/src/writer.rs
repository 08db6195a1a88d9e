//! Persist a dataset as CSV and xlsx.
//!
//! Both files carry the same header and the same cells. Each is written to a
//! sibling staging file and renamed over the destination, so a failed write
//! never leaves a truncated file behind. [`write_outputs`] stages both files
//! before replacing either.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Workbook, Worksheet};
use tracing::{info, instrument, warn};

use coursegeo_shared::{CourseGeoError, OutputPaths, Result, Value};

use crate::table::Dataset;

/// Write both outputs.
///
/// The CSV and xlsx are fully written to staging files first. Destinations
/// are only replaced once both succeeded; on failure neither is touched.
#[instrument(skip_all, fields(csv = %outputs.csv.display(), xlsx = %outputs.xlsx.display()))]
pub fn write_outputs(dataset: &Dataset, outputs: &OutputPaths) -> Result<()> {
    let csv = Staged::write(&outputs.csv, |staging| write_csv_to(dataset, staging))?;
    let xlsx = match Staged::write(&outputs.xlsx, |staging| write_xlsx_to(dataset, staging)) {
        Ok(staged) => staged,
        Err(e) => {
            csv.discard();
            return Err(e);
        }
    };

    if let Err(e) = csv.commit() {
        xlsx.discard();
        return Err(e);
    }
    xlsx.commit()?;

    info!(rows = dataset.len(), "outputs written");
    Ok(())
}

/// Write the dataset as comma-delimited text, overwriting `path`.
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    Staged::write(path, |staging| write_csv_to(dataset, staging))?.commit()
}

/// Write the dataset as a single-sheet workbook, overwriting `path`.
pub fn write_xlsx(dataset: &Dataset, path: &Path) -> Result<()> {
    Staged::write(path, |staging| write_xlsx_to(dataset, staging))?.commit()
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn write_csv_to(dataset: &Dataset, staging: &Path) -> std::result::Result<(), String> {
    let mut writer = csv::Writer::from_path(staging).map_err(|e| e.to_string())?;

    writer
        .write_record(dataset.columns())
        .map_err(|e| e.to_string())?;

    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(Value::to_string))
            .map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// xlsx
// ---------------------------------------------------------------------------

fn write_xlsx_to(dataset: &Dataset, staging: &Path) -> std::result::Result<(), String> {
    let mut workbook = Workbook::new();

    // Pin the creation timestamp so unchanged input yields an identical file.
    let created = ExcelDateTime::from_ymd(2000, 1, 1).map_err(|e| e.to_string())?;
    let properties = DocProperties::new().set_creation_datetime(&created);
    workbook.set_properties(&properties);

    let sheet = workbook.add_worksheet();

    for (col, name) in dataset.columns().iter().enumerate() {
        sheet
            .write_string(0, column_number(col)?, name)
            .map_err(|e| e.to_string())?;
    }

    for (idx, row) in dataset.rows().iter().enumerate() {
        let row_number =
            u32::try_from(idx + 1).map_err(|_| "too many rows for xlsx".to_string())?;
        for (col, value) in row.iter().enumerate() {
            write_cell(sheet, row_number, column_number(col)?, value)?;
        }
    }

    workbook.save(staging).map_err(|e| e.to_string())
}

fn column_number(col: usize) -> std::result::Result<u16, String> {
    u16::try_from(col).map_err(|_| format!("column {col} exceeds xlsx limits"))
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
) -> std::result::Result<(), String> {
    let written = match value {
        Value::Null => return Ok(()),
        Value::Text(s) => sheet.write_string(row, col, s),
        Value::Number(n) => sheet.write_number(row, col, *n),
        Value::Bool(b) => sheet.write_boolean(row, col, *b),
    };
    written.map(|_| ()).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Staging
// ---------------------------------------------------------------------------

/// A fully written staging file waiting to replace its destination.
struct Staged {
    staging: PathBuf,
    target: PathBuf,
}

impl Staged {
    /// Run `write` against the staging sibling of `target`.
    fn write<F>(target: &Path, write: F) -> Result<Self>
    where
        F: FnOnce(&Path) -> std::result::Result<(), String>,
    {
        let staged = Self {
            staging: prepare_staging(target)?,
            target: target.to_path_buf(),
        };

        match write(&staged.staging) {
            Ok(()) => Ok(staged),
            Err(message) => {
                let target = staged.target.clone();
                staged.discard();
                Err(CourseGeoError::write(target, message))
            }
        }
    }

    /// Rename the staging file over the destination.
    fn commit(self) -> Result<()> {
        match std::fs::rename(&self.staging, &self.target) {
            Ok(()) => Ok(()),
            Err(e) => {
                let target = self.target.clone();
                self.discard();
                Err(CourseGeoError::write(target, e.to_string()))
            }
        }
    }

    /// Remove the staging file, leaving the destination untouched.
    fn discard(self) {
        if self.staging.exists() {
            if let Err(e) = std::fs::remove_file(&self.staging) {
                warn!(path = %self.staging.display(), error = %e, "failed to remove staging file");
            }
        }
    }
}

/// Staging file next to `path`: `dir/.name.tmp`.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    path.with_file_name(format!(".{name}.tmp"))
}

fn prepare_staging(path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            CourseGeoError::write(path, format!("create {}: {e}", parent.display()))
        })?;
    }
    Ok(staging_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_dataset;

    fn enriched() -> Dataset {
        let mut ds = Dataset::new(vec![
            "university_name_th".into(),
            "program_name_th".into(),
            "latitude".into(),
            "longitude".into(),
        ]);
        ds.push_row(vec![
            Value::text("จุฬาลงกรณ์มหาวิทยาลัย"),
            Value::text("วิศวกรรมคอมพิวเตอร์, ภาคปกติ"),
            Value::Number(13.7367),
            Value::Number(100.5231),
        ])
        .unwrap();
        ds.push_row(vec![
            Value::text("XYZ_NONEXISTENT_9999"),
            Value::text("\"quoted\" program"),
            Value::Null,
            Value::Null,
        ])
        .unwrap();
        ds
    }

    fn rendered(ds: &Dataset) -> Vec<Vec<String>> {
        ds.rows()
            .iter()
            .map(|r| r.iter().map(Value::to_string).collect())
            .collect()
    }

    #[test]
    fn csv_renders_null_as_empty_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&enriched(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "university_name_th,program_name_th,latitude,longitude");
        assert_eq!(
            lines[1],
            "จุฬาลงกรณ์มหาวิทยาลัย,\"วิศวกรรมคอมพิวเตอร์, ภาคปกติ\",13.7367,100.5231"
        );
        assert_eq!(lines[2], "XYZ_NONEXISTENT_9999,\"\"\"quoted\"\" program\",,");
    }

    #[test]
    fn outputs_have_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = OutputPaths {
            csv: dir.path().join("out.csv"),
            xlsx: dir.path().join("out.xlsx"),
        };
        let ds = enriched();
        write_outputs(&ds, &outputs).unwrap();

        let from_csv = load_dataset(&outputs.csv).unwrap();
        let from_xlsx = load_dataset(&outputs.xlsx).unwrap();

        assert_eq!(from_csv.columns(), from_xlsx.columns());
        assert_eq!(from_csv.columns(), ds.columns());
        assert_eq!(rendered(&from_csv), rendered(&from_xlsx));
        assert_eq!(rendered(&from_csv), rendered(&ds));
        assert_eq!(from_xlsx.get(0, 2), Some(&Value::Number(13.7367)));
        assert_eq!(from_xlsx.get(1, 3), Some(&Value::Null));
    }

    #[test]
    fn rewrite_overwrites_and_leaves_no_staging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale,content\n1,2\n3,4\n5,6\n").unwrap();

        write_csv(&enriched(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert_eq!(text.lines().count(), 3);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn repeated_writes_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = OutputPaths {
            csv: dir.path().join("out.csv"),
            xlsx: dir.path().join("out.xlsx"),
        };
        let ds = enriched();

        write_outputs(&ds, &outputs).unwrap();
        let csv_first = std::fs::read(&outputs.csv).unwrap();
        let xlsx_first = std::fs::read(&outputs.xlsx).unwrap();

        write_outputs(&ds, &outputs).unwrap();
        assert_eq!(csv_first, std::fs::read(&outputs.csv).unwrap());
        assert_eq!(xlsx_first, std::fs::read(&outputs.xlsx).unwrap());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("out.csv");
        write_csv(&enriched(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_destination_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file in the way").unwrap();
        let path = blocker.join("out.csv");

        let err = write_csv(&enriched(), &path).unwrap_err();
        match err {
            CourseGeoError::Write { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected Write, got {other:?}"),
        }
    }

    #[test]
    fn failed_xlsx_leaves_previous_csv_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file in the way").unwrap();
        let outputs = OutputPaths {
            csv: dir.path().join("out.csv"),
            xlsx: blocker.join("out.xlsx"),
        };
        std::fs::write(&outputs.csv, "old,run\n").unwrap();

        let err = write_outputs(&enriched(), &outputs).unwrap_err();

        match err {
            CourseGeoError::Write { path, .. } => assert_eq!(path, outputs.xlsx),
            other => panic!("expected Write, got {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(&outputs.csv).unwrap(), "old,run\n");
        assert!(!staging_path(&outputs.csv).exists());
    }

    #[test]
    fn failed_xlsx_does_not_create_csv() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let outputs = OutputPaths {
            csv: dir.path().join("fresh.csv"),
            xlsx: blocker.join("fresh.xlsx"),
        };

        assert!(write_outputs(&enriched(), &outputs).is_err());
        assert!(!outputs.csv.exists());
        assert!(!staging_path(&outputs.csv).exists());
    }

    #[test]
    fn staging_path_is_hidden_sibling() {
        assert_eq!(
            staging_path(Path::new("data/out.xlsx")),
            PathBuf::from("data/.out.xlsx.tmp")
        );
    }
}
